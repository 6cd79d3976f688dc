//! End-to-end compilation tests: build small UFO masters in memory,
//! compile them jointly, and inspect the output with read-fonts.

use lectura_font_compiler::{CompileOptions, compile_interpolatable};
use lectura_font_ufo::{
    Anchor, Component, Contour, ContourPoint, FontInfo, Glyph, PointType, Ufo, plist,
};
use read_fonts::{FontRef, TableProvider, types::GlyphId};

fn font_info(style: &str) -> FontInfo {
    let mut dict = plist::Dict::new();
    dict.insert("familyName".to_string(), "Lectura".into());
    dict.insert("styleName".to_string(), style.into());
    dict.insert("unitsPerEm".to_string(), 1000i64.into());
    dict.insert("ascender".to_string(), 750i64.into());
    dict.insert("descender".to_string(), (-250i64).into());
    FontInfo::from_dict(dict)
}

fn line(x: f64, y: f64) -> ContourPoint {
    ContourPoint::new(x, y, PointType::Line)
}

fn off(x: f64, y: f64) -> ContourPoint {
    ContourPoint::new(x, y, PointType::OffCurve)
}

fn curve(x: f64, y: f64) -> ContourPoint {
    ContourPoint::new(x, y, PointType::Curve)
}

/// A master with a straight-sided A, a curved o, a space, a grave mark,
/// and a composite agrave.
fn master(style: &str, scale: f64) -> Ufo {
    let mut font = Ufo::new(format!("Lectura-{style}.ufo"));
    font.info = font_info(style);

    let mut a = Glyph::new("A");
    a.unicodes.push(0x41);
    a.width = 520.0 * scale;
    a.contours.push(Contour {
        points: vec![
            line(20.0, 0.0),
            line(260.0 * scale, 700.0),
            line(500.0 * scale, 0.0),
        ],
    });
    a.anchors.push(Anchor { name: "top".to_string(), x: 260.0 * scale, y: 700.0 });
    font.insert(a);

    let mut o = Glyph::new("o");
    o.unicodes.push(0x6F);
    o.width = 500.0 * scale;
    o.contours.push(Contour {
        points: vec![
            curve(250.0, 0.0),
            off(450.0 * scale, 0.0),
            off(450.0 * scale, 500.0),
            curve(250.0, 500.0),
            off(50.0, 500.0),
            off(50.0, 0.0),
        ],
    });
    font.insert(o);

    let mut space = Glyph::new("space");
    space.unicodes.push(0x20);
    space.width = 250.0 * scale;
    font.insert(space);

    let mut grave = Glyph::new("grave");
    grave.unicodes.push(0x60);
    grave.width = 200.0;
    grave.contours.push(Contour {
        points: vec![line(40.0, 760.0), line(160.0, 760.0), line(100.0, 900.0)],
    });
    font.insert(grave);

    let mut agrave = Glyph::new("Agrave");
    agrave.unicodes.push(0xC0);
    agrave.width = 520.0 * scale;
    agrave.components.push(Component::new("A"));
    agrave.components.push(Component::at_offset("grave", 160.0 * scale, -60.0));
    font.insert(agrave);

    font.set_glyph_order(&[
        "space".to_string(),
        "A".to_string(),
        "Agrave".to_string(),
        "grave".to_string(),
        "o".to_string(),
    ]);
    font
}

fn compile_pair() -> Vec<Vec<u8>> {
    let regular = master("Regular", 1.0);
    let caption = master("Caption", 1.1);
    compile_interpolatable(&[&regular, &caption], &CompileOptions::default()).unwrap()
}

#[test]
fn compiles_all_masters() {
    let fonts = compile_pair();
    assert_eq!(fonts.len(), 2);
    for data in &fonts {
        FontRef::new(data).expect("output parses");
    }
}

#[test]
fn glyph_sets_and_point_counts_match() {
    let fonts = compile_pair();
    let a = FontRef::new(&fonts[0]).unwrap();
    let b = FontRef::new(&fonts[1]).unwrap();

    let num_glyphs = a.maxp().unwrap().num_glyphs();
    // 5 drawn glyphs + synthesized .notdef
    assert_eq!(num_glyphs, 6);
    assert_eq!(b.maxp().unwrap().num_glyphs(), num_glyphs);

    let glyf_a = a.glyf().unwrap();
    let loca_a = a.loca(None).unwrap();
    let glyf_b = b.glyf().unwrap();
    let loca_b = b.loca(None).unwrap();

    use read_fonts::tables::glyf::Glyph as ReadGlyph;
    for gid in 0..num_glyphs {
        let gid = GlyphId::new(gid as u32);
        let ga = loca_a.get_glyf(gid, &glyf_a).unwrap();
        let gb = loca_b.get_glyf(gid, &glyf_b).unwrap();
        match (ga, gb) {
            (Some(ReadGlyph::Simple(sa)), Some(ReadGlyph::Simple(sb))) => {
                assert_eq!(sa.num_points(), sb.num_points(), "gid {gid}");
            }
            (Some(ReadGlyph::Composite(ca)), Some(ReadGlyph::Composite(cb))) => {
                assert_eq!(ca.components().count(), cb.components().count());
            }
            (None, None) => {}
            _ => panic!("glyph type mismatch for {gid}"),
        }
    }
}

#[test]
fn glyph_order_and_cmap() {
    let fonts = compile_pair();
    let font = FontRef::new(&fonts[0]).unwrap();

    let cmap = font.cmap().unwrap();
    // .notdef=0, then the public.glyphOrder: space, A, Agrave, grave, o
    assert_eq!(cmap.map_codepoint(' '), Some(GlyphId::new(1)));
    assert_eq!(cmap.map_codepoint('A'), Some(GlyphId::new(2)));
    assert_eq!(cmap.map_codepoint('\u{C0}'), Some(GlyphId::new(3)));
    assert_eq!(cmap.map_codepoint('o'), Some(GlyphId::new(5)));
}

#[test]
fn metrics_follow_the_master() {
    let fonts = compile_pair();
    let regular = FontRef::new(&fonts[0]).unwrap();
    let caption = FontRef::new(&fonts[1]).unwrap();

    let hmtx_r = regular.hmtx().unwrap();
    let hmtx_c = caption.hmtx().unwrap();

    // A: gid 2; widths 520 and 572
    assert_eq!(hmtx_r.advance(GlyphId::new(2)), Some(520));
    assert_eq!(hmtx_c.advance(GlyphId::new(2)), Some(572));
    // space keeps its advance despite having no outline
    assert_eq!(hmtx_r.advance(GlyphId::new(1)), Some(250));
}

#[test]
fn composite_references_survive() {
    let fonts = compile_pair();
    let font = FontRef::new(&fonts[0]).unwrap();
    let glyf = font.glyf().unwrap();
    let loca = font.loca(None).unwrap();

    use read_fonts::tables::glyf::Glyph as ReadGlyph;
    let Some(ReadGlyph::Composite(composite)) =
        loca.get_glyf(GlyphId::new(3), &glyf).unwrap()
    else {
        panic!("Agrave is not a composite");
    };

    let gids: Vec<u16> = composite.components().map(|c| c.glyph.to_u16()).collect();
    // A=2, grave=4
    assert_eq!(gids, vec![2, 4]);
}

#[test]
fn missing_glyph_is_an_error() {
    let regular = master("Regular", 1.0);
    let mut caption = master("Caption", 1.1);

    // Drop a glyph from the second master.
    let mut broken = Ufo::new("Lectura-Caption.ufo");
    broken.info = caption.info.clone();
    for glyph in caption.iter().filter(|g| g.name != "o") {
        broken.insert(glyph.clone());
    }
    broken.set_glyph_order(&regular.glyph_order().unwrap());
    caption = broken;

    let err = compile_interpolatable(&[&regular, &caption], &CompileOptions::default());
    assert!(err.is_err());
}
