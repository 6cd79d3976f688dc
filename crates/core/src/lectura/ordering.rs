//! Canonical glyph ordering and anchor clearing.

use std::{fs::read_to_string, path::Path};

use anyhow::{Context, Result};
use lectura_font_ufo::Ufo;

/// Load the glyph order file: one glyph name per line, blank lines skipped.
pub fn load_glyph_order(path: &Path) -> Result<Vec<String>> {
    let text = read_to_string(path)
        .with_context(|| format!("Failed to read glyph order file {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write the canonical order to every font's `public.glyphOrder` lib key.
/// The full order is recorded as-is; the compiler skips names a font does
/// not contain and appends unlisted glyphs in font order.
pub fn set_glyph_order(order: &[String], fonts: &mut [&mut Ufo]) {
    for font in fonts.iter_mut() {
        font.set_glyph_order(order);
    }
}

/// Strip anchors from every glyph. Anchors drive composite construction
/// and must not leak into the compiled masters.
pub fn clear_anchors(fonts: &mut [&mut Ufo]) {
    for font in fonts.iter_mut() {
        for glyph in font.iter_mut() {
            glyph.clear_anchors();
        }
    }
}

#[cfg(test)]
mod tests {
    use lectura_font_ufo::{Anchor, Glyph};

    use super::*;

    #[test]
    fn order_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.enc");
        std::fs::write(&path, ".notdef\nspace\nA\n\nAgrave\n").unwrap();

        let order = load_glyph_order(&path).unwrap();
        assert_eq!(order, [".notdef", "space", "A", "Agrave"]);
    }

    #[test]
    fn order_and_anchor_clearing() {
        let mut font = Ufo::new("Lectura-Regular.ufo");
        let mut a = Glyph::new("A");
        a.anchors.push(Anchor { name: "top".to_string(), x: 0.0, y: 0.0 });
        font.insert(a);

        let order = vec!["space".to_string(), "A".to_string()];
        set_glyph_order(&order, &mut [&mut font]);
        assert_eq!(font.glyph_order(), Some(order));

        clear_anchors(&mut [&mut font]);
        assert!(font.get("A").unwrap().anchors.is_empty());
    }
}
