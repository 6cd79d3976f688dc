//! Glyph-set completion: fill masters with default-master glyphs.

use lectura_font_ufo::Ufo;
use log::debug;

use crate::config::is_composite;

/// Mark color for glyphs copied in from the default master (dark grey).
const FILLED_MARK: [f64; 4] = [0.0, 0.0, 0.0, 0.25];

/// Copy every glyph of the default master into each font that lacks it,
/// except names scheduled for composite construction. Copied glyphs are
/// marked dark grey. Returns the number of glyphs copied.
pub fn fill_missing_glyphs(default: &Ufo, fonts: &mut [Ufo]) -> usize {
    let mut copied = 0;

    for font in fonts.iter_mut() {
        for glyph in default.iter() {
            if font.contains(&glyph.name) || is_composite(&glyph.name) {
                continue;
            }
            let mut filled = glyph.clone();
            filled.set_mark_color(FILLED_MARK[0], FILLED_MARK[1], FILLED_MARK[2], FILLED_MARK[3]);
            debug!("filling '{}' into {}", filled.name, font.file_name());
            font.insert(filled);
            copied += 1;
        }
    }

    copied
}

#[cfg(test)]
mod tests {
    use lectura_font_ufo::Glyph;

    use super::*;

    #[test]
    fn fills_only_missing_non_composites() {
        let mut default = Ufo::new("Lectura-Regular.ufo");
        let mut a = Glyph::new("A");
        a.width = 500.0;
        default.insert(a);
        default.insert(Glyph::new("B"));
        default.insert(Glyph::new("Agrave"));

        let mut caption = Ufo::new("Lectura-Caption.ufo");
        caption.insert(Glyph::new("A"));

        let copied = fill_missing_glyphs(&default, std::slice::from_mut(&mut caption));
        assert_eq!(copied, 1);
        assert!(caption.contains("B"));
        // Composite names are left for the composite builder.
        assert!(!caption.contains("Agrave"));
        // The existing glyph is untouched.
        assert!(caption.get("A").unwrap().mark_color().is_none());
        // The filled glyph is marked dark grey.
        assert_eq!(caption.get("B").unwrap().mark_color(), Some([0.0, 0.0, 0.0, 0.25]));
    }
}
