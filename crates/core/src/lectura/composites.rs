//! Accented composite construction from `base+mark@anchor` recipes.

use anyhow::{Context, Result, bail};
use lectura_font_ufo::{Component, Glyph, Ufo};
use log::warn;

use crate::config::{COMPOSITES, composite_unicode};

/// Mark color for constructed composites (grey).
const COMPOSITE_MARK: [f64; 4] = [0.0, 0.0, 0.0, 0.5];

/// A parsed composite recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe<'a> {
    pub base: &'a str,
    /// (mark glyph, anchor name on the base)
    pub marks: Vec<(&'a str, &'a str)>,
}

/// Parse `base+mark@anchor[+mark@anchor...]`.
pub fn parse_recipe(recipe: &str) -> Result<Recipe<'_>> {
    let mut items = recipe.split('+');
    let base = items.next().filter(|b| !b.is_empty()).context("recipe has no base glyph")?;

    let marks = items
        .map(|item| {
            item.split_once('@')
                .filter(|(mark, anchor)| !mark.is_empty() && !anchor.is_empty())
                .with_context(|| format!("malformed recipe item '{item}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Recipe { base, marks })
}

/// Build every configured composite in each font.
///
/// The composite replaces any existing glyph of the same name: it takes
/// the base glyph's advance width, a component for the base at the origin,
/// and one component per mark. Marks are positioned by pairing anchor
/// `name` on the base with anchor `_name` on the mark; an unpairable mark
/// lands at the origin.
pub fn build_composites(fonts: &mut [&mut Ufo]) -> Result<()> {
    for font in fonts.iter_mut() {
        let font: &mut Ufo = font;
        for (name, recipe) in COMPOSITES {
            let recipe = parse_recipe(recipe)?;
            let glyph = build_one(font, name, &recipe)
                .with_context(|| format!("building '{name}' in {}", font.file_name()))?;
            font.insert(glyph);
        }
    }
    Ok(())
}

fn build_one(font: &Ufo, name: &str, recipe: &Recipe) -> Result<Glyph> {
    let base = font
        .get(recipe.base)
        .with_context(|| format!("base glyph '{}' not in font", recipe.base))?;

    let mut composite = Glyph::new(name);
    if let Some(cp) = composite_unicode(name) {
        composite.unicodes.push(cp);
    }
    composite.width = base.width;
    composite.components.push(Component::new(recipe.base));

    for (mark_name, anchor_name) in &recipe.marks {
        let mark = font
            .get(mark_name)
            .with_context(|| format!("mark glyph '{mark_name}' not in font"))?;

        // Anchor lookup stays on the base glyph for every mark.
        let anchor = base.anchor(anchor_name);
        let mark_anchor = mark.anchor(&format!("_{anchor_name}"));

        let component = match (anchor, mark_anchor) {
            (Some(anchor), Some(mark_anchor)) => Component::at_offset(
                *mark_name,
                anchor.x - mark_anchor.x,
                anchor.y - mark_anchor.y,
            ),
            _ => {
                warn!("'{name}': no anchor pair '{anchor_name}' between '{}' and '{mark_name}'", recipe.base);
                Component::new(*mark_name)
            }
        };
        composite.components.push(component);
    }

    composite.set_mark_color(COMPOSITE_MARK[0], COMPOSITE_MARK[1], COMPOSITE_MARK[2], COMPOSITE_MARK[3]);
    Ok(composite)
}

/// A recipe must be buildable in every accent-carrying master: its base
/// and marks must exist after glyph-set completion.
pub fn check_recipes(font: &Ufo) -> Result<()> {
    for (name, recipe) in COMPOSITES {
        let recipe = parse_recipe(recipe)?;
        if !font.contains(recipe.base) {
            bail!("composite '{name}': base glyph '{}' missing from {}", recipe.base, font.file_name());
        }
        for (mark, _) in &recipe.marks {
            if !font.contains(mark) {
                bail!("composite '{name}': mark glyph '{mark}' missing from {}", font.file_name());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lectura_font_ufo::Anchor;

    use super::*;

    #[test]
    fn parse_recipes() {
        let recipe = parse_recipe("A+grave@top").unwrap();
        assert_eq!(recipe.base, "A");
        assert_eq!(recipe.marks, vec![("grave", "top")]);

        let recipe = parse_recipe("a+dieresis@top+cedilla@bottom").unwrap();
        assert_eq!(recipe.marks.len(), 2);

        assert_eq!(parse_recipe("dotlessi").unwrap().marks.len(), 0);
        assert!(parse_recipe("A+grave").is_err());
        assert!(parse_recipe("+grave@top").is_err());
    }

    fn accent_font() -> Ufo {
        let mut font = Ufo::new("Lectura-Caption.ufo");

        let mut a = Glyph::new("A");
        a.width = 540.0;
        a.anchors.push(Anchor { name: "top".to_string(), x: 270.0, y: 700.0 });
        font.insert(a);

        let mut grave = Glyph::new("grave");
        grave.width = 200.0;
        grave.anchors.push(Anchor { name: "_top".to_string(), x: 100.0, y: 760.0 });
        font.insert(grave);

        font
    }

    #[test]
    fn composite_is_positioned_by_anchors() {
        let font = accent_font();
        let recipe = parse_recipe("A+grave@top").unwrap();
        let glyph = build_one(&font, "Agrave", &recipe).unwrap();

        assert_eq!(glyph.width, 540.0);
        assert_eq!(glyph.unicodes, vec![0xC0]);
        assert_eq!(glyph.components.len(), 2);
        assert_eq!(glyph.components[0].base, "A");
        assert_eq!(glyph.components[0].x_offset, 0.0);
        assert_eq!(glyph.components[1].base, "grave");
        // anchor (270, 700) minus mark anchor (100, 760)
        assert_eq!(glyph.components[1].x_offset, 170.0);
        assert_eq!(glyph.components[1].y_offset, -60.0);
        assert_eq!(glyph.mark_color(), Some([0.0, 0.0, 0.0, 0.5]));
    }

    #[test]
    fn unpairable_mark_lands_at_origin() {
        let mut font = accent_font();
        font.get_mut("grave").unwrap().clear_anchors();

        let recipe = parse_recipe("A+grave@top").unwrap();
        let glyph = build_one(&font, "Agrave", &recipe).unwrap();
        assert_eq!(glyph.components[1].x_offset, 0.0);
        assert_eq!(glyph.components[1].y_offset, 0.0);
    }

    #[test]
    fn missing_base_is_an_error() {
        let mut font = Ufo::new("Lectura-Caption.ufo");
        font.insert(Glyph::new("grave"));
        let recipe = parse_recipe("A+grave@top").unwrap();
        assert!(build_one(&font, "Agrave", &recipe).is_err());
        assert!(check_recipes(&font).is_err());
    }
}
