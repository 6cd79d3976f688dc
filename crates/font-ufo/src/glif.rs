//! Reading and writing `.glif` files (GLIF format 2).

use log::warn;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    glyph::{Anchor, Component, Contour, ContourPoint, Glyph, PointType},
    plist::{self, ElemList},
};

fn f64_is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn f64_is_one(v: &f64) -> bool {
    *v == 1.0
}

const fn f64_one() -> f64 {
    1.0
}

fn pointkind_is_default(v: &PointKind) -> bool {
    *v == PointKind::Offcurve
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
enum PointKind {
    Move,
    Line,
    #[default]
    Offcurve,
    Curve,
    Qcurve,
}

impl From<PointKind> for PointType {
    fn from(kind: PointKind) -> Self {
        match kind {
            PointKind::Move => PointType::Move,
            PointKind::Line => PointType::Line,
            PointKind::Offcurve => PointType::OffCurve,
            PointKind::Curve => PointType::Curve,
            PointKind::Qcurve => PointType::QCurve,
        }
    }
}

impl From<PointType> for PointKind {
    fn from(typ: PointType) -> Self {
        match typ {
            PointType::Move => PointKind::Move,
            PointType::Line => PointKind::Line,
            PointType::OffCurve => PointKind::Offcurve,
            PointType::Curve => PointKind::Curve,
            PointType::QCurve => PointKind::Qcurve,
        }
    }
}

fn smooth_serialize<S: Serializer>(v: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(true) => serializer.serialize_str("yes"),
        None | Some(false) => serializer.serialize_str("no"),
    }
}

fn smooth_deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    String::deserialize(deserializer).and_then(|s| match s.as_str() {
        "yes" => Ok(Some(true)),
        "no" => Ok(Some(false)),
        other => Err(Error::custom(format!("invalid smooth value '{other}'"))),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename = "point")]
struct PointElem {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@type", default, skip_serializing_if = "pointkind_is_default")]
    type_: PointKind,
    #[serde(
        rename = "@smooth",
        default,
        serialize_with = "smooth_serialize",
        deserialize_with = "smooth_deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    smooth: Option<bool>,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename = "contour")]
struct ContourElem {
    #[serde(rename = "@identifier", default, skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    #[serde(default)]
    point: Vec<PointElem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ComponentElem {
    #[serde(rename = "@base")]
    base: String,
    #[serde(rename = "@xOffset", default, skip_serializing_if = "f64_is_zero")]
    x_offset: f64,
    #[serde(rename = "@yOffset", default, skip_serializing_if = "f64_is_zero")]
    y_offset: f64,
    #[serde(rename = "@xScale", default = "f64_one", skip_serializing_if = "f64_is_one")]
    x_scale: f64,
    #[serde(rename = "@xyScale", default, skip_serializing_if = "f64_is_zero")]
    xy_scale: f64,
    #[serde(rename = "@yxScale", default, skip_serializing_if = "f64_is_zero")]
    yx_scale: f64,
    #[serde(rename = "@yScale", default = "f64_one", skip_serializing_if = "f64_is_one")]
    y_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum OutlineEntry {
    Contour(ContourElem),
    Component(ComponentElem),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Outline {
    #[serde(rename = "$value", default)]
    entries: Vec<OutlineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename = "unicode")]
struct UnicodeElem {
    #[serde(rename = "@hex")]
    hex: String,
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename = "advance")]
struct AdvanceElem {
    #[serde(rename = "@width", default, skip_serializing_if = "f64_is_zero")]
    width: f64,
    #[serde(rename = "@height", default, skip_serializing_if = "f64_is_zero")]
    height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename = "anchor")]
struct AnchorElem {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct LibElem {
    dict: ElemList,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename = "glyph")]
struct Glif {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@format")]
    format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    advance: Option<AdvanceElem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    unicode: Vec<UnicodeElem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outline: Option<Outline>,
    #[serde(rename = "anchor", default, skip_serializing_if = "Vec::is_empty")]
    anchors: Vec<AnchorElem>,
    #[serde(rename = "lib", default, skip_serializing_if = "Option::is_none")]
    lib: Option<LibElem>,
}

impl From<Glif> for Glyph {
    fn from(glif: Glif) -> Glyph {
        let mut glyph = Glyph::new(glif.name);

        for unicode in &glif.unicode {
            match u32::from_str_radix(&unicode.hex, 16) {
                Ok(value) => glyph.unicodes.push(value),
                Err(_) => warn!("glyph '{}': ignoring invalid unicode hex '{}'", glyph.name, unicode.hex),
            }
        }

        if let Some(advance) = glif.advance {
            glyph.width = advance.width;
            glyph.height = advance.height;
        }

        for entry in glif.outline.map(|o| o.entries).unwrap_or_default() {
            match entry {
                OutlineEntry::Contour(contour) => {
                    let points = contour
                        .point
                        .into_iter()
                        .map(|p| ContourPoint {
                            x: p.x,
                            y: p.y,
                            typ: p.type_.into(),
                            smooth: p.smooth.unwrap_or(false),
                        })
                        .collect();
                    glyph.contours.push(Contour { points });
                }
                OutlineEntry::Component(c) => {
                    glyph.components.push(Component {
                        base: c.base,
                        x_offset: c.x_offset,
                        y_offset: c.y_offset,
                        x_scale: c.x_scale,
                        xy_scale: c.xy_scale,
                        yx_scale: c.yx_scale,
                        y_scale: c.y_scale,
                    });
                }
            }
        }

        glyph.anchors = glif
            .anchors
            .into_iter()
            .map(|a| Anchor { name: a.name, x: a.x, y: a.y })
            .collect();

        if let Some(lib) = glif.lib {
            match plist::dict_from_elems(lib.dict) {
                Ok(dict) => glyph.lib = dict,
                Err(e) => warn!("glyph '{}': ignoring malformed lib: {e}", glyph.name),
            }
        }

        glyph
    }
}

impl From<&Glyph> for Glif {
    fn from(glyph: &Glyph) -> Glif {
        let mut entries = Vec::with_capacity(glyph.contours.len() + glyph.components.len());
        for component in &glyph.components {
            entries.push(OutlineEntry::Component(ComponentElem {
                base: component.base.clone(),
                x_offset: component.x_offset,
                y_offset: component.y_offset,
                x_scale: component.x_scale,
                xy_scale: component.xy_scale,
                yx_scale: component.yx_scale,
                y_scale: component.y_scale,
            }));
        }
        for contour in &glyph.contours {
            entries.push(OutlineEntry::Contour(ContourElem {
                identifier: None,
                point: contour
                    .points
                    .iter()
                    .map(|p| PointElem {
                        x: p.x,
                        y: p.y,
                        type_: p.typ.into(),
                        smooth: p.smooth.then_some(true),
                        name: None,
                    })
                    .collect(),
            }));
        }

        Glif {
            name: glyph.name.clone(),
            format: "2".to_string(),
            advance: (glyph.width != 0.0 || glyph.height != 0.0)
                .then_some(AdvanceElem { width: glyph.width, height: glyph.height }),
            unicode: glyph
                .unicodes
                .iter()
                .map(|u| UnicodeElem { hex: format!("{u:04X}") })
                .collect(),
            outline: (!entries.is_empty()).then_some(Outline { entries }),
            anchors: glyph
                .anchors
                .iter()
                .map(|a| AnchorElem { x: a.x, y: a.y, name: a.name.clone() })
                .collect(),
            lib: (!glyph.lib.is_empty())
                .then(|| LibElem { dict: plist::dict_to_elems(&glyph.lib) }),
        }
    }
}

/// Parse a glif document into a glyph.
pub fn parse(xml: &str) -> Result<Glyph, String> {
    let glif: Glif = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    Ok(glif.into())
}

/// Serialize a glyph as a glif document.
pub fn to_xml(glyph: &Glyph) -> Result<String, String> {
    let glif = Glif::from(glyph);
    let body = quick_xml::se::to_string(&glif).map_err(|e| e.to_string())?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCLAM_GLIF: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<glyph name="exclam" format="2">
  <advance width="290"/>
  <unicode hex="0021"/>
  <outline>
    <contour>
      <point x="80" y="777" type="line"/>
      <point x="90" y="240" type="line"/>
      <point x="200" y="240" type="line"/>
      <point x="210" y="777" type="line"/>
    </contour>
    <contour>
      <point x="80" y="0" type="line"/>
      <point x="210" y="0" type="line"/>
      <point x="210" y="145" type="line"/>
      <point x="80" y="145" type="line"/>
    </contour>
  </outline>
  <lib>
    <dict>
      <key>com.typemytype.robofont.mark</key>
      <array>
        <real>0.6</real>
        <real>0.609</real>
        <integer>1</integer>
        <integer>1</integer>
      </array>
    </dict>
  </lib>
</glyph>
"#;

    const AGRAVE_GLIF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<glyph name="Agrave" format="2">
  <advance width="544"/>
  <unicode hex="00C0"/>
  <outline>
    <component base="A"/>
    <component base="grave" xOffset="120" yOffset="60"/>
  </outline>
</glyph>
"#;

    #[test]
    fn parse_contours_and_lib() {
        let glyph = parse(EXCLAM_GLIF).unwrap();
        assert_eq!(glyph.name, "exclam");
        assert_eq!(glyph.width, 290.0);
        assert_eq!(glyph.unicodes, vec![0x21]);
        assert_eq!(glyph.contours.len(), 2);
        assert_eq!(glyph.contours[0].points.len(), 4);
        assert!(glyph.contours[0].points.iter().all(|p| p.typ == PointType::Line));
        assert_eq!(glyph.mark_color(), Some([0.6, 0.609, 1.0, 1.0]));
    }

    #[test]
    fn parse_components() {
        let glyph = parse(AGRAVE_GLIF).unwrap();
        assert_eq!(glyph.components.len(), 2);
        assert_eq!(glyph.components[0].base, "A");
        assert_eq!(glyph.components[0].x_offset, 0.0);
        assert_eq!(glyph.components[1].base, "grave");
        assert_eq!(glyph.components[1].x_offset, 120.0);
        assert_eq!(glyph.components[1].y_offset, 60.0);
    }

    #[test]
    fn roundtrip() {
        for fixture in [EXCLAM_GLIF, AGRAVE_GLIF] {
            let glyph = parse(fixture).unwrap();
            let xml = to_xml(&glyph).unwrap();
            assert_eq!(parse(&xml).unwrap(), glyph);
        }
    }

    #[test]
    fn curve_points_roundtrip() {
        let xml = r#"<glyph name="o" format="2">
  <advance width="500"/>
  <unicode hex="006F"/>
  <outline>
    <contour>
      <point x="250" y="0" type="curve" smooth="yes"/>
      <point x="100" y="0"/>
      <point x="100" y="300"/>
      <point x="250" y="300" type="curve" smooth="yes"/>
      <point x="400" y="300"/>
      <point x="400" y="0"/>
    </contour>
  </outline>
</glyph>"#;
        let glyph = parse(xml).unwrap();
        assert_eq!(glyph.contours[0].points.len(), 6);
        assert!(glyph.contours[0].points[0].smooth);
        assert_eq!(glyph.contours[0].points[1].typ, PointType::OffCurve);
        let roundtripped = parse(&to_xml(&glyph).unwrap()).unwrap();
        assert_eq!(roundtripped, glyph);
    }

    #[test]
    fn empty_outline_is_empty_glyph() {
        let glyph = parse(r#"<glyph name="space" format="2"><advance width="200"/><unicode hex="0020"/></glyph>"#)
            .unwrap();
        assert!(glyph.is_empty());
        assert_eq!(glyph.width, 200.0);
    }

    #[test]
    fn lowercase_hex_accepted() {
        let glyph = parse(r#"<glyph name="y" format="2"><unicode hex="00ff"/></glyph>"#).unwrap();
        assert_eq!(glyph.unicodes, vec![0xFF]);
    }
}
