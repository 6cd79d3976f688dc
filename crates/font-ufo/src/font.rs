//! The `Ufo` type: a font master loaded from a UFO directory.

use std::{
    fs::{create_dir_all, read_to_string, remove_dir_all, write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;

use crate::{
    Error, Result, glif,
    glyph::Glyph,
    plist::{self, Dict, Value},
};

/// Lib key holding the canonical glyph order.
pub const PUBLIC_GLYPH_ORDER: &str = "public.glyphOrder";

const METAINFO: &str = "metainfo.plist";
const FONTINFO: &str = "fontinfo.plist";
const LIB: &str = "lib.plist";
const LAYERCONTENTS: &str = "layercontents.plist";
const CONTENTS: &str = "contents.plist";
const DEFAULT_LAYER_DIR: &str = "glyphs";
const CREATOR: &str = "org.lectura.fontbuild";

/// Typed accessors over a fontinfo.plist dict. Unknown keys are preserved
/// verbatim so saving copies the full info through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    dict: Dict,
}

impl FontInfo {
    pub fn from_dict(dict: Dict) -> Self {
        Self { dict }
    }

    pub fn as_dict(&self) -> &Dict {
        &self.dict
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.dict.get(key).and_then(Value::as_str)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.dict.get(key).and_then(Value::as_f64)
    }

    pub fn family_name(&self) -> Option<&str> {
        self.string("familyName")
    }

    pub fn style_name(&self) -> Option<&str> {
        self.string("styleName")
    }

    pub fn set_style_name(&mut self, name: &str) {
        self.dict.insert("styleName".to_string(), name.into());
    }

    pub fn units_per_em(&self) -> f64 {
        self.number("unitsPerEm").unwrap_or(1000.0)
    }

    pub fn ascender(&self) -> f64 {
        self.number("ascender").unwrap_or_else(|| (self.units_per_em() * 0.8).round())
    }

    pub fn descender(&self) -> f64 {
        self.number("descender").unwrap_or_else(|| -(self.units_per_em() * 0.2).round())
    }

    pub fn cap_height(&self) -> Option<f64> {
        self.number("capHeight")
    }

    pub fn x_height(&self) -> Option<f64> {
        self.number("xHeight")
    }

    pub fn italic_angle(&self) -> f64 {
        self.number("italicAngle").unwrap_or(0.0)
    }

    pub fn version_major(&self) -> i64 {
        self.dict.get("versionMajor").and_then(Value::as_i64).unwrap_or(1)
    }

    pub fn version_minor(&self) -> i64 {
        self.dict.get("versionMinor").and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.string("copyright")
    }
}

/// A single UFO font master.
///
/// Glyphs keep their insertion order, which follows the layer's
/// contents.plist on load.
#[derive(Debug, Clone, Default)]
pub struct Ufo {
    path: PathBuf,
    pub info: FontInfo,
    pub lib: Dict,
    glyphs: IndexMap<String, Glyph>,
}

impl Ufo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// The path this UFO was loaded from or last saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The UFO directory name, e.g. `Lectura-Regular.ufo`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Glyph> {
        self.glyphs.get_mut(name)
    }

    /// Insert a glyph, replacing any existing glyph of the same name.
    pub fn insert(&mut self, glyph: Glyph) {
        self.glyphs.insert(glyph.name.clone(), glyph);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Glyph> {
        self.glyphs.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.glyphs.keys().map(String::as_str)
    }

    /// The `public.glyphOrder` lib entry, if present.
    pub fn glyph_order(&self) -> Option<Vec<String>> {
        let array = self.lib.get(PUBLIC_GLYPH_ORDER)?.as_array()?;
        Some(array.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
    }

    pub fn set_glyph_order(&mut self, order: &[String]) {
        self.lib.insert(
            PUBLIC_GLYPH_ORDER.to_string(),
            Value::Array(order.iter().map(|n| n.as_str().into()).collect()),
        );
    }

    /// Load a UFO (format 2 or 3) from a directory.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let metainfo_path = path.join(METAINFO);
        if !metainfo_path.is_file() {
            return Err(Error::NotUfo { path });
        }
        let metainfo = read_plist_dict(&metainfo_path)?;
        let format = metainfo
            .get("formatVersion")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::parse(&metainfo_path, "missing formatVersion"))?;
        if format != 2 && format != 3 {
            return Err(Error::UnsupportedVersion(format));
        }

        let info = match read_optional_plist_dict(&path.join(FONTINFO))? {
            Some(dict) => FontInfo::from_dict(dict),
            None => FontInfo::default(),
        };
        let lib = read_optional_plist_dict(&path.join(LIB))?.unwrap_or_default();

        let layer_dir = path.join(default_layer_dir(&path)?);
        let contents_path = layer_dir.join(CONTENTS);
        let contents = read_plist_dict(&contents_path)?;

        let mut glyphs = IndexMap::with_capacity(contents.len());
        for (name, file) in &contents {
            let file = file
                .as_str()
                .ok_or_else(|| Error::parse(&contents_path, format!("non-string entry for '{name}'")))?;
            let glif_path = layer_dir.join(file);
            let xml = read_to_string(&glif_path).map_err(|e| Error::io(&glif_path, e))?;
            let glyph = glif::parse(&xml).map_err(|e| Error::parse(&glif_path, e))?;
            glyphs.insert(glyph.name.clone(), glyph);
        }

        debug!("Loaded {} glyphs from {}", glyphs.len(), path.display());
        Ok(Self { path, info, lib, glyphs })
    }

    /// Save as a format 3 UFO, replacing any existing directory at `path`.
    pub fn save(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();

        if path.exists() {
            remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        }
        let layer_dir = path.join(DEFAULT_LAYER_DIR);
        create_dir_all(&layer_dir).map_err(|e| Error::io(&layer_dir, e))?;

        let mut metainfo = Dict::new();
        metainfo.insert("creator".to_string(), CREATOR.into());
        metainfo.insert("formatVersion".to_string(), 3i64.into());
        write_plist_dict(&path.join(METAINFO), &metainfo)?;

        if !self.info.is_empty() {
            write_plist_dict(&path.join(FONTINFO), self.info.as_dict())?;
        }
        if !self.lib.is_empty() {
            write_plist_dict(&path.join(LIB), &self.lib)?;
        }

        let layers = Value::Array(vec![Value::Array(vec![
            "public.default".into(),
            DEFAULT_LAYER_DIR.into(),
        ])]);
        write_plist(&path.join(LAYERCONTENTS), &layers)?;

        let mut contents = Dict::new();
        for glyph in self.glyphs.values() {
            let mut file = glif_filename(&glyph.name);
            let mut counter = 1u32;
            while contents.values().any(|v| v.as_str() == Some(file.as_str())) {
                file = format!("{}{counter}.glif", file.trim_end_matches(".glif"));
                counter += 1;
            }

            let glif_path = layer_dir.join(&file);
            let xml = glif::to_xml(glyph).map_err(|e| Error::write(&glif_path, e))?;
            write(&glif_path, xml).map_err(|e| Error::io(&glif_path, e))?;
            contents.insert(glyph.name.clone(), file.into());
        }
        write_plist_dict(&layer_dir.join(CONTENTS), &contents)?;

        self.path = path;
        Ok(())
    }
}

/// The directory of the default layer: first entry of layercontents.plist
/// (format 3), or `glyphs` (format 2).
fn default_layer_dir(ufo_path: &Path) -> Result<String> {
    let layercontents_path = ufo_path.join(LAYERCONTENTS);
    if !layercontents_path.is_file() {
        return Ok(DEFAULT_LAYER_DIR.to_string());
    }
    let value = read_plist(&layercontents_path)?;
    let first = value
        .as_array()
        .and_then(|layers| layers.first())
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse(&layercontents_path, "expected an array of layers"))?;
    let dir = first
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::parse(&layercontents_path, "layer entry has no directory"))?;
    Ok(dir.to_string())
}

fn read_plist(path: &Path) -> Result<Value> {
    let xml = read_to_string(path).map_err(|e| Error::io(path, e))?;
    plist::parse(&xml).map_err(|e| Error::parse(path, e))
}

fn read_plist_dict(path: &Path) -> Result<Dict> {
    read_plist(path)?
        .into_dict()
        .ok_or(Error::UnexpectedRoot { path: path.to_path_buf(), expected: "dict" })
}

fn read_optional_plist_dict(path: &Path) -> Result<Option<Dict>> {
    if !path.is_file() {
        return Ok(None);
    }
    read_plist_dict(path).map(Some)
}

fn write_plist(path: &Path, value: &Value) -> Result<()> {
    let xml = plist::to_xml(value).map_err(|e| Error::write(path, e))?;
    write(path, xml).map_err(|e| Error::io(path, e))
}

fn write_plist_dict(path: &Path, dict: &Dict) -> Result<()> {
    write_plist(path, &Value::Dict(dict.clone()))
}

/// Map a glyph name to a glif filename, following the UFO conventions:
/// uppercase ASCII letters get a trailing underscore, an initial period and
/// characters that are unsafe in filenames become underscores.
pub fn glif_filename(name: &str) -> String {
    const ILLEGAL: &[char] = &['"', '*', '+', '/', ':', '<', '>', '?', '[', '\\', ']', '|'];

    let mut out = String::with_capacity(name.len() + 5);
    for (i, c) in name.chars().enumerate() {
        if c.is_control() || ILLEGAL.contains(&c) || (i == 0 && c == '.') {
            out.push('_');
        } else if c.is_ascii_uppercase() {
            out.push(c);
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out.truncate(250);
    out.push_str(".glif");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Anchor, Component, Contour, ContourPoint, PointType};

    #[test]
    fn glif_filenames() {
        assert_eq!(glif_filename("a"), "a.glif");
        assert_eq!(glif_filename("A"), "A_.glif");
        assert_eq!(glif_filename("Agrave"), "A_grave.glif");
        assert_eq!(glif_filename("T_h"), "T__h.glif");
        assert_eq!(glif_filename(".notdef"), "_notdef.glif");
        assert_eq!(glif_filename("a:b"), "a_b.glif");
    }

    fn sample_font() -> Ufo {
        let mut font = Ufo::new("Test-Regular.ufo");

        let mut info = Dict::new();
        info.insert("familyName".to_string(), "Test".into());
        info.insert("styleName".to_string(), "Regular".into());
        info.insert("unitsPerEm".to_string(), 1000i64.into());
        info.insert("ascender".to_string(), 750i64.into());
        info.insert("descender".to_string(), (-250i64).into());
        font.info = FontInfo::from_dict(info);

        let mut a = Glyph::new("A");
        a.unicodes.push(0x41);
        a.width = 540.0;
        a.contours.push(Contour {
            points: vec![
                ContourPoint::new(20.0, 0.0, PointType::Line),
                ContourPoint::new(270.0, 700.0, PointType::Line),
                ContourPoint::new(520.0, 0.0, PointType::Line),
            ],
        });
        a.anchors.push(Anchor { name: "top".to_string(), x: 270.0, y: 700.0 });
        font.insert(a);

        let mut grave = Glyph::new("grave");
        grave.unicodes.push(0x60);
        grave.width = 200.0;
        grave.contours.push(Contour {
            points: vec![
                ContourPoint::new(40.0, 760.0, PointType::Line),
                ContourPoint::new(160.0, 760.0, PointType::Line),
                ContourPoint::new(100.0, 900.0, PointType::Line),
            ],
        });
        grave.anchors.push(Anchor { name: "_top".to_string(), x: 100.0, y: 760.0 });
        font.insert(grave);

        let mut agrave = Glyph::new("Agrave");
        agrave.unicodes.push(0xC0);
        agrave.width = 540.0;
        agrave.components.push(Component::new("A"));
        agrave.components.push(Component::at_offset("grave", 170.0, -60.0));
        agrave.set_mark_color(0.0, 0.0, 0.0, 0.5);
        font.insert(agrave);

        font.set_glyph_order(&["A".to_string(), "Agrave".to_string(), "grave".to_string()]);
        font
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test-Regular.ufo");

        let mut font = sample_font();
        font.save(&path).unwrap();

        assert!(path.join("metainfo.plist").is_file());
        assert!(path.join("layercontents.plist").is_file());
        assert!(path.join("glyphs/contents.plist").is_file());
        assert!(path.join("glyphs/A_.glif").is_file());

        let loaded = Ufo::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.info.family_name(), Some("Test"));
        assert_eq!(loaded.info.units_per_em(), 1000.0);
        assert_eq!(
            loaded.glyph_order(),
            Some(vec!["A".to_string(), "Agrave".to_string(), "grave".to_string()])
        );

        for glyph in font.iter() {
            assert_eq!(loaded.get(&glyph.name), Some(glyph), "glyph '{}'", glyph.name);
        }
    }

    #[test]
    fn save_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test-Regular.ufo");

        let mut font = sample_font();
        font.save(&path).unwrap();

        let mut smaller = Ufo::new("Test-Regular.ufo");
        smaller.insert(Glyph::new("space"));
        smaller.save(&path).unwrap();

        let loaded = Ufo::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("space"));
        assert!(!path.join("glyphs/A_.glif").exists());
    }

    #[test]
    fn load_missing_metainfo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NotAFont.ufo");
        create_dir_all(&path).unwrap();
        assert!(matches!(Ufo::load(&path), Err(Error::NotUfo { .. })));
    }

    #[test]
    fn insertion_order_is_iteration_order() {
        let font = sample_font();
        let names: Vec<&str> = font.names().collect();
        assert_eq!(names, ["A", "grave", "Agrave"]);
    }
}
