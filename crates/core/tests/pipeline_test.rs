//! Full pipeline test over a synthetic source tree: two drawn masters and
//! a glyph order file in, a variable font out.

use std::{fs, path::Path};

use lectura_core::build;
use lectura_font_ufo::{Anchor, Contour, ContourPoint, FontInfo, Glyph, PointType, Ufo, plist};
use read_fonts::{FontRef, TableProvider, types::GlyphId};

const BASES: &[&str] = &[
    "A", "C", "E", "I", "N", "O", "U", "Y", "a", "c", "e", "dotlessi", "n", "o", "u", "y",
];
const MARKS: &[&str] = &["grave", "acute", "circumflex", "tilde", "dieresis", "ring", "cedilla"];

fn line(x: f64, y: f64) -> ContourPoint {
    ContourPoint::new(x, y, PointType::Line)
}

fn box_contour(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
    Contour { points: vec![line(x0, y0), line(x1, y0), line(x1, y1), line(x0, y1)] }
}

fn codepoint(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c as u32),
        _ => match name {
            "dotlessi" => Some(0x131),
            "grave" => Some(0x60),
            "space" => Some(0x20),
            _ => None,
        },
    }
}

/// A drawn master: boxy base letters with top/bottom anchors, boxy marks
/// with matching mark anchors. `scale` widens the Caption master so the
/// interpolation has real deltas to encode.
fn draw_master(style: &str, opsz_scale: f64) -> Ufo {
    let mut font = Ufo::new(format!("Lectura-{style}.ufo"));

    let mut info = plist::Dict::new();
    info.insert("familyName".to_string(), "Lectura".into());
    info.insert("styleName".to_string(), style.into());
    info.insert("unitsPerEm".to_string(), 1000i64.into());
    info.insert("ascender".to_string(), 760i64.into());
    info.insert("descender".to_string(), (-240i64).into());
    font.info = FontInfo::from_dict(info);

    let mut space = Glyph::new("space");
    space.unicodes.push(0x20);
    space.width = 240.0 * opsz_scale;
    font.insert(space);

    for name in BASES {
        let width = 520.0 * opsz_scale;
        let mut glyph = Glyph::new(*name);
        if let Some(cp) = codepoint(name) {
            glyph.unicodes.push(cp);
        }
        glyph.width = width;
        glyph.contours.push(box_contour(40.0, 0.0, width - 40.0, 700.0));
        glyph.anchors.push(Anchor { name: "top".to_string(), x: width / 2.0, y: 700.0 });
        glyph.anchors.push(Anchor { name: "bottom".to_string(), x: width / 2.0, y: 0.0 });
        font.insert(glyph);
    }

    for name in MARKS {
        let mut glyph = Glyph::new(*name);
        if let Some(cp) = codepoint(name) {
            glyph.unicodes.push(cp);
        }
        glyph.width = 220.0 * opsz_scale;
        if *name == "cedilla" {
            glyph.contours.push(box_contour(60.0, -180.0, 160.0, 0.0));
            glyph.anchors.push(Anchor { name: "_bottom".to_string(), x: 110.0, y: 0.0 });
        } else {
            glyph.contours.push(box_contour(60.0, 760.0, 160.0, 880.0));
            glyph.anchors.push(Anchor { name: "_top".to_string(), x: 110.0, y: 760.0 });
        }
        font.insert(glyph);
    }

    font
}

fn write_sources(source_dir: &Path) {
    fs::create_dir_all(source_dir).unwrap();

    draw_master("Regular", 1.0).save(source_dir.join("Lectura-Regular.ufo")).unwrap();
    draw_master("Caption", 1.15).save(source_dir.join("Lectura-Caption.ufo")).unwrap();

    let mut order: Vec<&str> = vec![".notdef", "space"];
    order.extend(BASES);
    order.extend(MARKS);
    let composites: Vec<&str> =
        lectura_core::config::COMPOSITES.iter().map(|(name, _)| *name).collect();
    order.extend(&composites);
    fs::write(source_dir.join("Lectura-ascii.enc"), order.join("\n")).unwrap();
}

#[test]
fn build_produces_a_variable_font() {
    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("sources");
    let build_dir = dir.path().join("build");
    let dist_dir = dir.path().join("dist");

    write_sources(&source_dir);
    build(&source_dir, &build_dir, &dist_dir, true).unwrap();

    // The temporary designspace is cleaned up; the final one is kept.
    assert!(!build_dir.join("tmp.designspace").exists());
    assert!(build_dir.join("Lectura.designspace").is_file());

    // Instance generated and staged alongside the masters.
    assert!(build_dir.join("instances/Lectura-Subhead.ufo").is_dir());
    assert!(build_dir.join("master_ufo/Lectura-Subhead.ufo").is_dir());
    assert!(build_dir.join("master_ufo/Lectura-Regular.ufo").is_dir());
    assert!(build_dir.join("master_ufo/Lectura-Caption.ufo").is_dir());

    // Compiled masters for each designspace source.
    assert!(build_dir.join("master_ttf/Lectura-Regular.ttf").is_file());
    assert!(build_dir.join("master_ttf/Lectura-Caption.ttf").is_file());

    let vf_data = fs::read(dist_dir.join("Lectura-VF.ttf")).unwrap();
    let font = FontRef::new(&vf_data).unwrap();

    let fvar = font.fvar().unwrap();
    assert_eq!(fvar.axis_count(), 1);
    let axes = fvar.axes().unwrap();
    assert_eq!(axes[0].axis_tag(), read_fonts::types::Tag::new(b"opsz"));
    assert_eq!(axes[0].min_value().to_f64(), 8.0);
    assert_eq!(axes[0].default_value().to_f64(), 14.0);

    // One named instance (Subhead).
    assert_eq!(fvar.instance_count(), 1);

    // Every glyph in the order made it in: .notdef + space + bases +
    // marks + composites.
    let expected = 2 + BASES.len() + MARKS.len() + lectura_core::config::COMPOSITES.len();
    assert_eq!(font.maxp().unwrap().num_glyphs() as usize, expected);

    // The variation tables are present.
    assert!(font.gvar().is_ok());
    assert!(font.stat().is_ok());

    // Composites map their codepoints.
    let cmap = font.cmap().unwrap();
    let agrave = cmap.map_codepoint('\u{C0}').unwrap();
    assert!(agrave > GlyphId::new(0));
}

#[test]
fn staged_masters_are_processed() {
    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("sources");
    let build_dir = dir.path().join("build");
    let dist_dir = dir.path().join("dist");

    write_sources(&source_dir);
    build(&source_dir, &build_dir, &dist_dir, true).unwrap();

    let caption = Ufo::load(build_dir.join("master_ufo/Lectura-Caption.ufo")).unwrap();

    // Composites were constructed and marked grey.
    let agrave = caption.get("Agrave").expect("composite built");
    assert_eq!(agrave.components.len(), 2);
    assert_eq!(agrave.mark_color(), Some([0.0, 0.0, 0.0, 0.5]));
    assert_eq!(agrave.unicodes, vec![0xC0]);

    // Anchors were cleared everywhere.
    assert!(caption.iter().all(|glyph| glyph.anchors.is_empty()));

    // The canonical order was recorded.
    let order = caption.glyph_order().unwrap();
    assert_eq!(order.first().map(String::as_str), Some(".notdef"));
    assert!(order.iter().any(|n| n == "ydieresis"));
}

#[test]
fn composites_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("sources");
    let build_dir = dir.path().join("build");
    let dist_dir = dir.path().join("dist");

    write_sources(&source_dir);
    build(&source_dir, &build_dir, &dist_dir, false).unwrap();

    let caption = Ufo::load(build_dir.join("master_ufo/Lectura-Caption.ufo")).unwrap();
    assert!(caption.get("Agrave").is_none());

    // The variable font still builds, just without the accented glyphs.
    let vf_data = fs::read(dist_dir.join("Lectura-VF.ttf")).unwrap();
    let font = FontRef::new(&vf_data).unwrap();
    let expected = 2 + BASES.len() + MARKS.len();
    assert_eq!(font.maxp().unwrap().num_glyphs() as usize, expected);
}
