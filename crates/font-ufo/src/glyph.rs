//! In-memory glyph model.

use crate::plist::{Dict, Value};

/// Lib key for RoboFont-style mark colors.
pub const MARK_COLOR_KEY: &str = "com.typemytype.robofont.mark";

/// The role of a point within a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointType {
    /// Start of an open contour.
    Move,
    /// Straight line from the previous on-curve point.
    Line,
    /// Off-curve control point.
    #[default]
    OffCurve,
    /// Cubic curve segment end.
    Curve,
    /// Quadratic curve segment end (TrueType-style, implied on-curves).
    QCurve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourPoint {
    pub x: f64,
    pub y: f64,
    pub typ: PointType,
    pub smooth: bool,
}

impl ContourPoint {
    pub fn new(x: f64, y: f64, typ: PointType) -> Self {
        Self { x, y, typ, smooth: false }
    }

    pub fn on_curve(&self) -> bool {
        self.typ != PointType::OffCurve
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<ContourPoint>,
}

impl Contour {
    /// An open contour starts with a move point.
    pub fn is_open(&self) -> bool {
        self.points.first().is_some_and(|p| p.typ == PointType::Move)
    }
}

/// A reference to another glyph, with an affine transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub x_scale: f64,
    pub xy_scale: f64,
    pub yx_scale: f64,
    pub y_scale: f64,
}

impl Component {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            x_offset: 0.0,
            y_offset: 0.0,
            x_scale: 1.0,
            xy_scale: 0.0,
            yx_scale: 0.0,
            y_scale: 1.0,
        }
    }

    pub fn at_offset(base: impl Into<String>, x: f64, y: f64) -> Self {
        let mut component = Self::new(base);
        component.x_offset = x;
        component.y_offset = y;
        component
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// A single glyph: outlines, components, anchors, and metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub unicodes: Vec<u32>,
    pub width: f64,
    pub height: f64,
    pub contours: Vec<Contour>,
    pub components: Vec<Component>,
    pub anchors: Vec<Anchor>,
    pub lib: Dict,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Whether the glyph has neither contours nor components.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty() && self.components.is_empty()
    }

    pub fn anchor(&self, name: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.name == name)
    }

    pub fn clear_anchors(&mut self) {
        self.anchors.clear();
    }

    /// Set the RoboFont mark color (components 0..=1).
    pub fn set_mark_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.lib.insert(
            MARK_COLOR_KEY.to_string(),
            Value::Array(vec![r.into(), g.into(), b.into(), a.into()]),
        );
    }

    pub fn mark_color(&self) -> Option<[f64; 4]> {
        let array = self.lib.get(MARK_COLOR_KEY)?.as_array()?;
        let mut color = [0.0; 4];
        for (slot, value) in color.iter_mut().zip(array) {
            *slot = value.as_f64()?;
        }
        Some(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_color_roundtrip() {
        let mut glyph = Glyph::new("Agrave");
        glyph.set_mark_color(0.0, 0.0, 0.0, 0.5);
        assert_eq!(glyph.mark_color(), Some([0.0, 0.0, 0.0, 0.5]));
    }

    #[test]
    fn anchor_lookup() {
        let mut glyph = Glyph::new("A");
        glyph.anchors.push(Anchor { name: "top".to_string(), x: 250.0, y: 700.0 });
        assert_eq!(glyph.anchor("top").map(|a| a.y), Some(700.0));
        assert!(glyph.anchor("bottom").is_none());
        glyph.clear_anchors();
        assert!(glyph.anchor("top").is_none());
    }
}
