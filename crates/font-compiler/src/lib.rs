//! # UFO compiler
//!
//! Compiles a set of staged UFO masters into interpolatable TrueType
//! binaries. The masters are compiled *jointly*: cubic segments are
//! converted to quadratic splines with a shared segment count per curve,
//! so every output font has identical glyph and point counts. That is the
//! contract the variable font builder depends on.
//!
//! Overlaps are kept, contour direction is kept, and glyph names are kept
//! (no production renaming).

mod error;
mod outline;
mod quadratic;
mod tables;

use std::collections::HashMap;

use font_types::{F2Dot14, GlyphId, GlyphId16};
use kurbo::Rect;
use lectura_font_ufo::{ContourPoint, Glyph as UfoGlyph, PointType, Ufo};
use log::{debug, info};
use rayon::prelude::*;
use write_fonts::{
    FontBuilder,
    tables::{
        cmap::Cmap,
        glyf::{
            Anchor, Bbox, Component, ComponentFlags, CompositeGlyph, Contour as GlyfContour,
            GlyfLocaBuilder, Glyph as WriteGlyph, SimpleGlyph, Transform,
        },
        loca::LocaFormat,
    },
};

pub use error::{Error, Result};
pub use quadratic::{cubic_to_quads, cubics_to_quads_jointly};

use tables::{FontBounds, GlyphStats};

/// Compilation options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Cubic-to-quadratic tolerance as a fraction of units-per-em.
    pub max_err_per_em: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_err_per_em: 1.0 / 1000.0 }
    }
}

const NOTDEF: &str = ".notdef";

/// All masters' write-glyphs for one glyph name, plus advance widths.
struct BuiltGlyph {
    glyphs: Vec<WriteGlyph>,
    widths: Vec<f64>,
}

/// Compile UFO masters into interpolatable TrueType fonts, one binary per
/// master, in input order.
///
/// All masters must share a single glyph set. The glyph order comes from
/// the first master's `public.glyphOrder`; glyphs missing from the order
/// are appended in font order, and `.notdef` is forced (or synthesized)
/// at glyph ID 0.
pub fn compile_interpolatable(masters: &[&Ufo], options: &CompileOptions) -> Result<Vec<Vec<u8>>> {
    if masters.is_empty() {
        return Err(Error::NoMasters);
    }

    let master_names: Vec<String> = masters.iter().map(|m| m.file_name()).collect();
    let order = glyph_order(masters[0]);

    for (master, name) in masters.iter().zip(&master_names) {
        for glyph_name in &order {
            if glyph_name != NOTDEF && !master.contains(glyph_name) {
                return Err(Error::MissingGlyph {
                    master: name.clone(),
                    glyph: glyph_name.clone(),
                });
            }
        }
    }

    let gid_map: HashMap<&str, u16> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i as u16))
        .collect();

    let upm = masters[0].info.units_per_em();
    let max_err = options.max_err_per_em * upm;

    info!(
        "Compiling {} masters, {} glyphs (tolerance {max_err:.2} units)",
        masters.len(),
        order.len()
    );

    let built: Vec<BuiltGlyph> = order
        .par_iter()
        .map(|name| build_glyph(name, masters, &master_names, &gid_map, max_err, upm))
        .collect::<Result<Vec<_>>>()?;

    let mut fonts = Vec::with_capacity(masters.len());
    for (master_idx, master) in masters.iter().enumerate() {
        fonts.push(assemble_master(master, master_idx, &order, &built)?);
    }

    Ok(fonts)
}

/// The first master's `public.glyphOrder` filtered to present glyphs, with
/// unlisted glyphs appended in font order and `.notdef` forced first.
fn glyph_order(master: &Ufo) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(master.len() + 1);

    for name in master.glyph_order().unwrap_or_default() {
        if master.contains(&name) && !order.contains(&name) {
            order.push(name);
        }
    }
    for name in master.names() {
        if !order.iter().any(|n| n == name) {
            order.push(name.to_string());
        }
    }

    if let Some(pos) = order.iter().position(|n| n == NOTDEF) {
        order.remove(pos);
    } else {
        debug!("no .notdef in sources, synthesizing one");
    }
    order.insert(0, NOTDEF.to_string());
    order
}

fn build_glyph(
    name: &str,
    masters: &[&Ufo],
    master_names: &[String],
    gid_map: &HashMap<&str, u16>,
    max_err: f64,
    upm: f64,
) -> Result<BuiltGlyph> {
    let glyphs: Vec<Option<&UfoGlyph>> = masters.iter().map(|m| m.get(name)).collect();

    // Synthesized .notdef: same box in every master, zero deltas.
    if glyphs[0].is_none() {
        let notdef = synthesized_notdef(upm);
        let converted =
            outline::convert_contours(name, master_names, &vec![&notdef; masters.len()], max_err)?;
        let write_glyphs = converted.into_iter().map(simple_glyph).collect();
        return Ok(BuiltGlyph {
            glyphs: write_glyphs,
            widths: vec![notdef.width; masters.len()],
        });
    }

    let glyphs: Vec<&UfoGlyph> = glyphs.into_iter().map(|g| g.expect("checked above")).collect();
    let widths: Vec<f64> = glyphs.iter().map(|g| g.width).collect();

    for (master_idx, glyph) in glyphs.iter().enumerate() {
        if !glyph.contours.is_empty() && !glyph.components.is_empty() {
            return Err(Error::MixedOutlines {
                glyph: name.to_string(),
                master: master_names[master_idx].clone(),
            });
        }
    }

    let reference = glyphs[0];
    let write_glyphs: Vec<WriteGlyph> = if !reference.components.is_empty() {
        glyphs
            .iter()
            .enumerate()
            .map(|(master_idx, glyph)| {
                composite_glyph(name, &master_names[master_idx], reference, glyph, gid_map)
            })
            .collect::<Result<_>>()?
    } else if !reference.contours.is_empty() {
        outline::convert_contours(name, master_names, &glyphs, max_err)?
            .into_iter()
            .map(simple_glyph)
            .collect()
    } else {
        // Empty in the default master; require empty everywhere.
        for (master_idx, glyph) in glyphs.iter().enumerate() {
            if !glyph.is_empty() {
                return Err(Error::ContourCountMismatch {
                    glyph: name.to_string(),
                    master: master_names[master_idx].clone(),
                    expected: 0,
                    actual: glyph.contours.len().max(glyph.components.len()),
                });
            }
        }
        vec![WriteGlyph::Empty; glyphs.len()]
    };

    Ok(BuiltGlyph { glyphs: write_glyphs, widths })
}

fn simple_glyph(contours: Vec<Vec<write_fonts::read::tables::glyf::CurvePoint>>) -> WriteGlyph {
    let mut glyph = SimpleGlyph {
        bbox: Bbox::default(),
        contours: contours.into_iter().map(GlyfContour::from).collect(),
        instructions: vec![],
    };
    glyph.recompute_bounding_box();
    WriteGlyph::Simple(glyph)
}

fn composite_glyph(
    name: &str,
    master_name: &str,
    reference: &UfoGlyph,
    glyph: &UfoGlyph,
    gid_map: &HashMap<&str, u16>,
) -> Result<WriteGlyph> {
    if !glyph.contours.is_empty() || glyph.components.len() != reference.components.len() {
        return Err(Error::ComponentMismatch {
            glyph: name.to_string(),
            master: master_name.to_string(),
            message: format!(
                "expected {} components, found {}",
                reference.components.len(),
                glyph.components.len()
            ),
        });
    }

    let mut components = glyph.components.iter().zip(&reference.components).map(
        |(component, reference_component)| {
            if component.base != reference_component.base {
                return Err(Error::ComponentMismatch {
                    glyph: name.to_string(),
                    master: master_name.to_string(),
                    message: format!(
                        "component base '{}' does not match '{}'",
                        component.base, reference_component.base
                    ),
                });
            }
            let gid = gid_map.get(component.base.as_str()).ok_or_else(|| Error::MissingBase {
                glyph: name.to_string(),
                base: component.base.clone(),
            })?;

            Ok(Component::new(
                GlyphId16::new(*gid),
                Anchor::Offset {
                    x: component.x_offset.round() as i16,
                    y: component.y_offset.round() as i16,
                },
                Transform {
                    xx: F2Dot14::from_f32(component.x_scale as f32),
                    yx: F2Dot14::from_f32(component.yx_scale as f32),
                    xy: F2Dot14::from_f32(component.xy_scale as f32),
                    yy: F2Dot14::from_f32(component.y_scale as f32),
                },
                ComponentFlags::default(),
            ))
        },
    );

    let first = components.next().expect("non-empty checked above")?;
    // Bounding boxes are resolved once all component targets are built.
    let mut composite = CompositeGlyph::new(first, Rect::ZERO);
    for component in components {
        composite.add_component(component?, Rect::ZERO);
    }
    Ok(WriteGlyph::Composite(composite))
}

/// A fallback `.notdef`: a hollow box at half the em width.
fn synthesized_notdef(upm: f64) -> UfoGlyph {
    let width = (upm * 0.5).round();
    let height = (upm * 0.7).round();
    let margin = (upm * 0.05).round();
    let stroke = (upm * 0.05).round();

    let rect = |x0: f64, y0: f64, x1: f64, y1: f64, clockwise: bool| {
        let mut points = vec![
            ContourPoint::new(x0, y0, PointType::Line),
            ContourPoint::new(x1, y0, PointType::Line),
            ContourPoint::new(x1, y1, PointType::Line),
            ContourPoint::new(x0, y1, PointType::Line),
        ];
        if !clockwise {
            points.reverse();
        }
        lectura_font_ufo::Contour { points }
    };

    let mut glyph = UfoGlyph::new(NOTDEF);
    glyph.width = width;
    glyph.contours.push(rect(margin, 0.0, width - margin, height, true));
    glyph.contours.push(rect(
        margin + stroke,
        stroke,
        width - margin - stroke,
        height - stroke,
        false,
    ));
    glyph
}

fn glyph_bbox(glyph: &WriteGlyph) -> Option<Bbox> {
    match glyph {
        WriteGlyph::Empty => None,
        WriteGlyph::Simple(simple) => Some(simple.bbox),
        WriteGlyph::Composite(composite) => Some(composite.bbox),
    }
}

fn assemble_master(
    master: &Ufo,
    master_idx: usize,
    order: &[String],
    built: &[BuiltGlyph],
) -> Result<Vec<u8>> {
    let mut glyphs: Vec<WriteGlyph> =
        built.iter().map(|b| b.glyphs[master_idx].clone()).collect();
    resolve_composite_bboxes(&mut glyphs);

    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut bounds = FontBounds::new();
    let mut stats = GlyphStats::default();
    let mut advances: Vec<u16> = Vec::with_capacity(glyphs.len());
    let mut lsbs: Vec<i16> = Vec::with_capacity(glyphs.len());

    for (glyph, built_glyph) in glyphs.iter().zip(built) {
        let advance = built_glyph.widths[master_idx].round().max(0.0) as u16;
        let bbox = glyph_bbox(glyph);
        let lsb = bbox.map(|b| b.x_min).unwrap_or(0);

        advances.push(advance);
        lsbs.push(lsb);
        bounds.update(bbox, advance, lsb);
        update_stats(&mut stats, glyph, &glyphs);

        glyf_builder.add_glyph(glyph)?;
    }
    bounds.finalize();

    let (glyf, loca, loca_format) = glyf_builder.build();

    let mappings: Vec<(char, GlyphId)> = order
        .iter()
        .enumerate()
        .flat_map(|(gid, name)| {
            master
                .get(name)
                .map(|glyph| glyph.unicodes.clone())
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |cp| char::from_u32(cp).map(|c| (c, GlyphId::new(gid as u32))))
        })
        .collect();
    let codepoints: Vec<u32> = mappings.iter().map(|(c, _)| *c as u32).collect();
    let cmap = Cmap::from_mappings(mappings).map_err(|e| Error::Cmap(format!("{e:?}")))?;

    let info = &master.info;
    let head = tables::build_head(
        info,
        &bounds,
        match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
    );
    let hhea = tables::build_hhea(info, &bounds, glyphs.len() as u16);
    let hmtx = tables::build_hmtx(&advances, &lsbs);
    let maxp = tables::build_maxp(glyphs.len() as u16, &stats);
    let post = tables::build_post(info, order);
    let os2 = tables::build_os2(info, &bounds, &advances, &codepoints);
    let name = tables::build_name(
        info.family_name().unwrap_or("Untitled"),
        info.style_name().unwrap_or("Regular"),
        info.version_major(),
        info.version_minor(),
    );

    let mut builder = FontBuilder::new();
    builder.add_table(&head)?;
    builder.add_table(&hhea)?;
    builder.add_table(&maxp)?;
    builder.add_table(&os2)?;
    builder.add_table(&hmtx)?;
    builder.add_table(&cmap)?;
    builder.add_table(&glyf)?;
    builder.add_table(&loca)?;
    builder.add_table(&name)?;
    builder.add_table(&post)?;

    Ok(builder.build())
}

fn update_stats(stats: &mut GlyphStats, glyph: &WriteGlyph, all: &[WriteGlyph]) {
    match glyph {
        WriteGlyph::Empty => {}
        WriteGlyph::Simple(simple) => {
            let points: usize = simple.contours.iter().map(|c| c.len()).sum();
            stats.max_points = stats.max_points.max(points as u16);
            stats.max_contours = stats.max_contours.max(simple.contours.len() as u16);
        }
        WriteGlyph::Composite(composite) => {
            let elements = composite.components().len();
            stats.max_component_elements = stats.max_component_elements.max(elements as u16);

            let (points, contours, depth) = composite_totals(composite, all, 0);
            stats.max_composite_points = stats.max_composite_points.max(points);
            stats.max_composite_contours = stats.max_composite_contours.max(contours);
            stats.max_component_depth = stats.max_component_depth.max(depth);
        }
    }
}

/// Resolved point count, contour count, and nesting depth of a composite.
fn composite_totals(
    composite: &CompositeGlyph,
    all: &[WriteGlyph],
    level: u16,
) -> (u16, u16, u16) {
    // Depth guard against malformed cycles
    if level >= 8 {
        return (0, 0, level);
    }

    let mut points = 0u16;
    let mut contours = 0u16;
    let mut depth = level + 1;

    for component in composite.components() {
        match all.get(component.glyph.to_u16() as usize) {
            Some(WriteGlyph::Simple(simple)) => {
                points = points.saturating_add(simple.contours.iter().map(|c| c.len()).sum::<usize>() as u16);
                contours = contours.saturating_add(simple.contours.len() as u16);
            }
            Some(WriteGlyph::Composite(nested)) => {
                let (p, c, d) = composite_totals(nested, all, level + 1);
                points = points.saturating_add(p);
                contours = contours.saturating_add(c);
                depth = depth.max(d);
            }
            _ => {}
        }
    }

    (points, contours, depth)
}

/// Resolve composite bounding boxes from their components, iterating so
/// nested composites settle.
fn resolve_composite_bboxes(glyphs: &mut [WriteGlyph]) {
    let mut bboxes: Vec<Option<Bbox>> = glyphs.iter().map(glyph_bbox).collect();
    for (bbox, glyph) in bboxes.iter_mut().zip(glyphs.iter()) {
        if matches!(glyph, WriteGlyph::Composite(_)) {
            *bbox = None;
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for glyph_idx in 0..glyphs.len() {
            if bboxes[glyph_idx].is_some() {
                continue;
            }
            let bbox = match &glyphs[glyph_idx] {
                WriteGlyph::Composite(composite) => {
                    component_union_bbox(composite, glyphs, &bboxes)
                }
                _ => continue,
            };
            if let Some(bbox) = bbox {
                bboxes[glyph_idx] = Some(bbox);
                if let WriteGlyph::Composite(c) = &mut glyphs[glyph_idx] {
                    c.bbox = bbox;
                }
                changed = true;
            }
        }
    }
}

/// A composite's bbox as the union of its transformed component bboxes.
/// Returns None while any nested composite is still unresolved.
fn component_union_bbox(
    composite: &CompositeGlyph,
    glyphs: &[WriteGlyph],
    bboxes: &[Option<Bbox>],
) -> Option<Bbox> {
    let mut x_min = i16::MAX;
    let mut y_min = i16::MAX;
    let mut x_max = i16::MIN;
    let mut y_max = i16::MIN;
    let mut has_content = false;

    for component in composite.components() {
        let gid = component.glyph.to_u16() as usize;
        let component_bbox = match (glyphs.get(gid), bboxes.get(gid).copied().flatten()) {
            (_, Some(bbox)) => bbox,
            // Empty component (e.g. space): contributes nothing.
            (Some(WriteGlyph::Empty), None) => continue,
            // Nested composite not yet resolved: retry on the next pass.
            (Some(WriteGlyph::Composite(_)), None) => return None,
            _ => continue,
        };

        let (offset_x, offset_y) = match component.anchor {
            Anchor::Offset { x, y } => (x as f64, y as f64),
            Anchor::Point { .. } => (0.0, 0.0),
        };

        let t = &component.transform;
        let (xx, xy, yx, yy) = (
            f64::from(t.xx.to_f32()),
            f64::from(t.xy.to_f32()),
            f64::from(t.yx.to_f32()),
            f64::from(t.yy.to_f32()),
        );

        let corners = [
            (component_bbox.x_min as f64, component_bbox.y_min as f64),
            (component_bbox.x_min as f64, component_bbox.y_max as f64),
            (component_bbox.x_max as f64, component_bbox.y_min as f64),
            (component_bbox.x_max as f64, component_bbox.y_max as f64),
        ];

        for (cx, cy) in corners {
            let tx = (xx * cx + xy * cy + offset_x).round() as i16;
            let ty = (yx * cx + yy * cy + offset_y).round() as i16;
            x_min = x_min.min(tx);
            y_min = y_min.min(ty);
            x_max = x_max.max(tx);
            y_max = y_max.max(ty);
            has_content = true;
        }
    }

    Some(if has_content {
        Bbox { x_min, y_min, x_max, y_max }
    } else {
        Bbox { x_min: 0, y_min: 0, x_max: 0, y_max: 0 }
    })
}
