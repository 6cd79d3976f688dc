//! Variable font builder implementation.

use std::{collections::HashSet, fs::read, path::{Path, PathBuf}, result, time::Instant};

use font_types::Fixed;
use kurbo::{Point, Vec2};
use log::{info, warn};
use read_fonts::{
    FontData, FontRef, TableProvider,
    tables::glyf::{CompositeGlyph, SimpleGlyph},
    types::{F2Dot14, GlyphId, NameId, Tag},
};
use write_fonts::{
    FontBuilder,
    from_obj::FromObjRef,
    tables::{
        fvar::{AxisInstanceArrays, Fvar, InstanceRecord, VariationAxisRecord},
        glyf::{
            CompositeGlyph as WriteCompositeGlyph, GlyfLocaBuilder, Glyph as WriteGlyph,
            SimpleGlyph as WriteSimpleGlyph,
        },
        gvar::{GlyphDelta, GlyphDeltas, GlyphVariations, Gvar, Tent, iup::iup_delta_optimize},
        head::Head,
        loca::LocaFormat,
        name::{Name, NameRecord},
        stat::{AxisRecord as StatAxisRecord, AxisValue, AxisValueTableFlags, Stat},
    },
};

use crate::{
    designspace::DesignSpace,
    error::{Error, Result},
    variation_model::VariationModel,
};

/// Tables that are rebuilt rather than copied from the default master.
const SKIP_TABLES: &[Tag] = &[
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"head"),
    Tag::new(b"fvar"),
    Tag::new(b"gvar"),
    Tag::new(b"STAT"),
    Tag::new(b"DSIG"),
    Tag::new(b"name"),
];

/// First user-defined name ID; axis names go here, instance names follow.
const AXIS_NAME_ID_START: u16 = 256;

/// Build a variable font from a designspace.
///
/// `resolve` maps each source's path (a UFO directory in the document) to
/// the compiled master binary to read.
///
/// This function:
/// 1. Loads all compiled masters
/// 2. Verifies glyph compatibility across masters
/// 3. Computes glyph deltas using the variation model
/// 4. Builds gvar, fvar, name, STAT, and head
/// 5. Copies every other table from the default master
pub fn build_variable_font(
    designspace: &DesignSpace,
    resolve: impl Fn(&Path) -> PathBuf,
) -> Result<Vec<u8>> {
    designspace.validate().map_err(Error::InvalidDesignspace)?;

    info!("Building variable font from {} masters", designspace.sources.len());

    let master_paths: Vec<PathBuf> =
        designspace.sources.iter().map(|source| resolve(&source.path)).collect();

    let master_data: Vec<Vec<u8>> = master_paths
        .iter()
        .map(|path| read(path).map_err(|e| Error::ReadFont { path: path.clone(), source: e }))
        .collect::<Result<Vec<_>>>()?;

    let masters: Vec<FontRef> = master_data
        .iter()
        .zip(&master_paths)
        .map(|(data, path)| {
            FontRef::new(data)
                .map_err(|e| Error::ParseFont { path: path.clone(), message: e.to_string() })
        })
        .collect::<Result<Vec<_>>>()?;

    let default_idx = designspace.default_source_index().ok_or(Error::NoDefaultSource)?;
    let default_font = &masters[default_idx];

    verify_glyph_compatibility(&master_paths, &masters, default_idx)?;

    let model = VariationModel::new(designspace).ok_or(Error::NoDefaultSource)?;
    info!("Variation model: {} regions", model.regions.len());

    let _ = default_font.glyf().map_err(|_| Error::MissingTable {
        path: master_paths[default_idx].clone(),
        table: "glyf".to_string(),
    })?;

    let num_glyphs = default_font.maxp()?.num_glyphs();
    info!("Processing {num_glyphs} glyphs");

    let gvar_start = Instant::now();
    let gvar = build_gvar(designspace, &master_paths, &masters, &model, num_glyphs)?;
    info!("Built gvar table in {:.2}s", gvar_start.elapsed().as_secs_f64());

    let (new_glyf, new_loca, loca_format) = build_glyf_loca(default_font)?;

    let fvar = build_fvar(designspace);
    info!("Built fvar table with {} axes", designspace.axes.len());

    let head = build_head(default_font, loca_format)?;
    let name = build_name(default_font, designspace, &master_paths[default_idx])?;
    let stat = build_stat(designspace);

    let mut builder = FontBuilder::new();

    builder.add_table(&fvar)?;
    builder.add_table(&gvar)?;
    builder.add_table(&new_glyf)?;
    builder.add_table(&new_loca)?;
    builder.add_table(&head)?;
    builder.add_table(&name)?;
    builder.add_table(&stat)?;

    let skip_set: HashSet<Tag> = SKIP_TABLES.iter().copied().collect();
    for record in default_font.table_directory.table_records() {
        let tag = record.tag();
        if !skip_set.contains(&tag)
            && let Some(data) = default_font.table_data(tag)
        {
            builder.add_raw(tag, data);
        }
    }

    Ok(builder.build())
}

fn verify_glyph_compatibility(
    paths: &[PathBuf],
    masters: &[FontRef],
    default_idx: usize,
) -> Result<()> {
    let expected_glyphs = masters[default_idx].maxp()?.num_glyphs();

    for (idx, master) in masters.iter().enumerate() {
        if idx == default_idx {
            continue;
        }

        let actual_glyphs = master.maxp()?.num_glyphs();
        if actual_glyphs != expected_glyphs {
            return Err(Error::GlyphCountMismatch {
                path: paths[idx].clone(),
                expected: expected_glyphs,
                actual: actual_glyphs,
            });
        }
    }

    Ok(())
}

fn axis_tag(tag: &str) -> Tag {
    let mut bytes = [b' '; 4];
    for (i, b) in tag.bytes().take(4).enumerate() {
        bytes[i] = b;
    }
    Tag::new(&bytes)
}

fn instance_name_id_start(designspace: &DesignSpace) -> u16 {
    AXIS_NAME_ID_START + designspace.axes.len() as u16
}

fn build_fvar(designspace: &DesignSpace) -> Fvar {
    let axes: Vec<VariationAxisRecord> = designspace
        .axes
        .iter()
        .enumerate()
        .map(|(idx, axis)| VariationAxisRecord {
            axis_tag: axis_tag(&axis.tag),
            min_value: Fixed::from_f64(f64::from(axis.minimum)),
            default_value: Fixed::from_f64(f64::from(axis.default)),
            max_value: Fixed::from_f64(f64::from(axis.maximum)),
            flags: 0u16,
            axis_name_id: NameId::new(AXIS_NAME_ID_START + idx as u16),
        })
        .collect();

    let name_id_start = instance_name_id_start(designspace);
    let instances: Vec<InstanceRecord> = designspace
        .instances
        .iter()
        .enumerate()
        .map(|(idx, instance)| {
            let coordinates: Vec<Fixed> = designspace
                .axes
                .iter()
                .map(|axis| Fixed::from_f64(f64::from(instance.axis_value(axis))))
                .collect();

            InstanceRecord {
                subfamily_name_id: NameId::new(name_id_start + idx as u16),
                flags: 0,
                coordinates,
                post_script_name_id: None,
            }
        })
        .collect();

    Fvar {
        axis_instance_arrays: AxisInstanceArrays { axes, instances }.into(),
    }
}

/// Display name for an axis: the "en" label if present, else the axis name.
fn axis_display_name(axis: &crate::designspace::Axis) -> String {
    axis.label_names
        .iter()
        .find(|(lang, _)| lang == "en")
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| axis.name.clone())
}

/// Build the name table: the default master's records plus axis and
/// instance names in the user-defined ID range.
fn build_name(
    default_font: &FontRef,
    designspace: &DesignSpace,
    default_path: &Path,
) -> Result<Name> {
    let name_table = default_font.name().map_err(|_| Error::MissingTable {
        path: default_path.to_path_buf(),
        table: "name".to_string(),
    })?;

    let mut new_records: Vec<NameRecord> = Vec::new();

    // Everything in the user-defined range is rebuilt below.
    for record in name_table.name_record() {
        let name_id = record.name_id().to_u16();
        if name_id >= AXIS_NAME_ID_START {
            continue;
        }

        let string = match record.string(name_table.string_data()) {
            Ok(s) => s.chars().collect::<String>(),
            Err(_) => continue,
        };

        new_records.push(NameRecord::new(
            record.platform_id(),
            record.encoding_id(),
            record.language_id(),
            NameId::new(name_id),
            string.into(),
        ));
    }

    let mut add_user_name = |name_id: u16, value: &str| {
        // Windows (platformID=3) and Mac (platformID=1) entries
        new_records.push(NameRecord::new(3, 1, 0x409, NameId::new(name_id), value.to_string().into()));
        new_records.push(NameRecord::new(1, 0, 0, NameId::new(name_id), value.to_string().into()));
    };

    for (idx, axis) in designspace.axes.iter().enumerate() {
        add_user_name(AXIS_NAME_ID_START + idx as u16, &axis_display_name(axis));
    }

    let name_id_start = instance_name_id_start(designspace);
    for (idx, instance) in designspace.instances.iter().enumerate() {
        add_user_name(name_id_start + idx as u16, &instance.name);
    }

    new_records.sort_by(|a, b| {
        (a.platform_id, a.encoding_id, a.language_id, a.name_id).cmp(&(
            b.platform_id,
            b.encoding_id,
            b.language_id,
            b.name_id,
        ))
    });

    Ok(Name::new(new_records))
}

/// Build the STAT table.
///
/// One axis record per designspace axis, and one format-1 axis value per
/// (instance, axis) pair where the instance sits off the axis default or
/// names the default position. The elided fallback is the subfamily name.
fn build_stat(designspace: &DesignSpace) -> Stat {
    let axis_records: Vec<StatAxisRecord> = designspace
        .axes
        .iter()
        .enumerate()
        .map(|(idx, axis)| {
            StatAxisRecord::new(
                axis_tag(&axis.tag),
                NameId::new(AXIS_NAME_ID_START + idx as u16),
                idx as u16,
            )
        })
        .collect();

    let name_id_start = instance_name_id_start(designspace);
    let mut axis_values: Vec<AxisValue> = Vec::new();

    for (instance_idx, instance) in designspace.instances.iter().enumerate() {
        for (axis_idx, axis) in designspace.axes.iter().enumerate() {
            let value = instance.axis_value(axis);
            let mut flags = AxisValueTableFlags::empty();
            if (value - axis.default).abs() < 0.001 {
                flags |= AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME;
            }
            axis_values.push(AxisValue::format_1(
                axis_idx as u16,
                flags,
                NameId::new(name_id_start + instance_idx as u16),
                Fixed::from_f64(f64::from(value)),
            ));
        }
    }

    Stat::new(axis_records, axis_values, NameId::new(2))
}

fn build_glyf_loca(
    default_font: &FontRef,
) -> Result<(write_fonts::tables::glyf::Glyf, write_fonts::tables::loca::Loca, LocaFormat)> {
    use read_fonts::tables::glyf::Glyph;

    let glyf = default_font.glyf()?;
    let loca = default_font.loca(None)?;
    let num_glyphs = default_font.maxp()?.num_glyphs();

    let mut builder = GlyfLocaBuilder::new();

    for glyph_idx in 0..num_glyphs {
        let gid = GlyphId::new(glyph_idx as u32);
        let glyph = loca.get_glyf(gid, &glyf).ok().flatten();

        let write_glyph: WriteGlyph = match glyph {
            None => WriteGlyph::Empty,
            Some(Glyph::Simple(simple)) => {
                WriteGlyph::Simple(WriteSimpleGlyph::from_obj_ref(&simple, FontData::new(&[])))
            }
            Some(Glyph::Composite(composite)) => {
                WriteGlyph::Composite(WriteCompositeGlyph::from_obj_ref(&composite, FontData::new(&[])))
            }
        };

        builder.add_glyph(&write_glyph)?;
    }

    Ok(builder.build())
}

fn build_head(default_font: &FontRef, loca_format: LocaFormat) -> Result<Head> {
    let head = default_font.head()?;

    Ok(Head::new(
        head.font_revision(),
        head.checksum_adjustment(),
        head.flags(),
        head.units_per_em(),
        head.created(),
        head.modified(),
        head.x_min(),
        head.y_min(),
        head.x_max(),
        head.y_max(),
        head.mac_style(),
        head.lowest_rec_ppem(),
        match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
    ))
}

fn region_tents(region: &crate::variation_model::Region) -> Vec<Tent> {
    region
        .axes
        .iter()
        .map(|&(min, peak, max)| {
            let peak_f2d14 = F2Dot14::from_f32(peak);
            let intermediate = Some((F2Dot14::from_f32(min), F2Dot14::from_f32(max)));
            Tent::new(peak_f2d14, intermediate)
        })
        .collect()
}

/// The four gvar phantom points for one master: left origin, advance
/// width, top origin, advance height. Only the advance width varies here.
type PhantomPoints = [(i16, i16); 4];

fn build_gvar(
    designspace: &DesignSpace,
    master_paths: &[PathBuf],
    masters: &[FontRef],
    model: &VariationModel,
    num_glyphs: u16,
) -> Result<Gvar> {
    let master_glyfs: Vec<_> = masters
        .iter()
        .map(|m| m.glyf())
        .collect::<result::Result<Vec<_>, _>>()?;
    let master_locas: Vec<_> = masters
        .iter()
        .map(|m| m.loca(None))
        .collect::<result::Result<Vec<_>, _>>()?;
    let master_hmtxs: Vec<_> = masters
        .iter()
        .map(|m| m.hmtx())
        .collect::<result::Result<Vec<_>, _>>()?;

    let axis_count = designspace.axes.len() as u16;

    let variations_start = Instant::now();
    let all_variations: Vec<GlyphVariations> = (0..num_glyphs)
        .map(|glyph_idx| {
            let gid = GlyphId::new(glyph_idx as u32);
            let phantoms: Vec<PhantomPoints> = master_hmtxs
                .iter()
                .map(|hmtx| {
                    let advance = hmtx.advance(gid).unwrap_or(0) as i16;
                    [(0, 0), (advance, 0), (0, 0), (0, 0)]
                })
                .collect();
            build_glyph_variations(gid, master_paths, &master_glyfs, &master_locas, &phantoms, model)
        })
        .collect::<Result<Vec<_>>>()?;
    let variations_elapsed = variations_start.elapsed().as_secs_f64();
    info!(
        "Glyph variations computed in {variations_elapsed:.2}s ({num_glyphs} glyphs)"
    );

    Gvar::new(all_variations, axis_count).map_err(Error::GvarBuild)
}

fn build_glyph_variations(
    gid: GlyphId,
    master_paths: &[PathBuf],
    master_glyfs: &[read_fonts::tables::glyf::Glyf],
    master_locas: &[read_fonts::tables::loca::Loca],
    phantoms: &[PhantomPoints],
    model: &VariationModel,
) -> Result<GlyphVariations> {
    use read_fonts::tables::glyf::Glyph;

    let default_idx = model.default_idx;

    let default_glyph = master_locas[default_idx]
        .get_glyf(gid, &master_glyfs[default_idx])
        .ok()
        .flatten();

    let Some(default_glyph) = default_glyph else {
        // No outline, but the advance width may still vary.
        return Ok(empty_glyph_variations(gid, phantoms, model));
    };

    match default_glyph {
        Glyph::Simple(simple) => build_simple_glyph_variations(
            gid,
            &simple,
            master_paths,
            master_glyfs,
            master_locas,
            phantoms,
            model,
        ),
        Glyph::Composite(composite) => {
            build_composite_glyph_variations(gid, &composite, master_glyfs, master_locas, phantoms, model)
        }
    }
}

/// Variations for a glyph with no outline: phantom point deltas only, and
/// none at all when the metrics agree across masters.
fn empty_glyph_variations(
    gid: GlyphId,
    phantoms: &[PhantomPoints],
    model: &VariationModel,
) -> GlyphVariations {
    let default_advance = phantoms[model.default_idx][1];
    if phantoms.iter().all(|p| p[1] == default_advance) {
        return GlyphVariations::new(gid, vec![]);
    }

    let mut glyph_deltas = Vec::with_capacity(model.regions.len());
    for (region_idx, region) in model.regions.iter().enumerate() {
        let deltas = (0..4)
            .map(|phantom_idx| {
                let values: Vec<(i16, i16)> =
                    phantoms.iter().map(|p| p[phantom_idx]).collect();
                let (_, point_deltas) = model.compute_deltas_2d(&values);
                let delta = point_deltas[region_idx];
                GlyphDelta::required(delta.0, delta.1)
            })
            .collect();
        glyph_deltas.push(GlyphDeltas::new(region_tents(region), deltas));
    }

    GlyphVariations::new(gid, glyph_deltas)
}

fn build_simple_glyph_variations(
    gid: GlyphId,
    default_simple: &SimpleGlyph,
    master_paths: &[PathBuf],
    master_glyfs: &[read_fonts::tables::glyf::Glyf],
    master_locas: &[read_fonts::tables::loca::Loca],
    phantoms: &[PhantomPoints],
    model: &VariationModel,
) -> Result<GlyphVariations> {
    use read_fonts::tables::glyf::Glyph;

    let num_points = default_simple.num_points();

    // Collect points from all masters, with the phantom points appended
    // so their deltas run through the same per-point computation.
    let mut master_points: Vec<Vec<(i16, i16)>> = Vec::with_capacity(master_glyfs.len());

    for (master_idx, (glyf, loca)) in master_glyfs.iter().zip(master_locas.iter()).enumerate() {
        let glyph = loca.get_glyf(gid, glyf).ok().flatten();

        let mut points: Vec<(i16, i16)> = match glyph {
            Some(Glyph::Simple(simple)) => {
                if simple.num_points() != num_points {
                    return Err(Error::PointCountMismatch {
                        path: master_paths[master_idx].clone(),
                        glyph_id: gid.to_u32(),
                        expected: num_points,
                        actual: simple.num_points(),
                    });
                }
                simple.points().map(|p| (p.x, p.y)).collect()
            }
            _ => {
                // Missing or type-mismatched glyph: fall back to the
                // default master's geometry (zero deltas).
                default_simple.points().map(|p| (p.x, p.y)).collect()
            }
        };
        points.extend_from_slice(&phantoms[master_idx]);

        master_points.push(points);
    }

    let default_coords: Vec<Point> = default_simple
        .points()
        .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
        .collect();

    let contour_ends: Vec<usize> = default_simple
        .end_pts_of_contours()
        .iter()
        .map(|v| v.get() as usize)
        .collect();

    let num_regions = model.regions.len();
    let num_masters = master_points.len();
    let mut point_values: Vec<(i16, i16)> = vec![(0, 0); num_masters];

    // all_raw_deltas[region_idx] = deltas for that region, one per point
    let mut all_raw_deltas: Vec<Vec<Vec2>> =
        (0..num_regions).map(|_| Vec::with_capacity(num_points + 4)).collect();

    for point_idx in 0..num_points + 4 {
        for (master_idx, points) in master_points.iter().enumerate() {
            point_values[master_idx] = points[point_idx];
        }

        let mut prev_deltas: Vec<(i16, i16)> = Vec::with_capacity(num_regions);
        for (region_idx, raw_deltas) in all_raw_deltas.iter_mut().enumerate() {
            let delta = model.compute_delta_2d_for_region(&point_values, region_idx, &prev_deltas);
            prev_deltas.push(delta);
            raw_deltas.push(Vec2::new(f64::from(delta.0), f64::from(delta.1)));
        }
    }

    let mut glyph_deltas: Vec<GlyphDeltas> = Vec::with_capacity(num_regions);

    for (region_idx, raw_deltas) in all_raw_deltas.iter_mut().enumerate() {
        let tents = region_tents(&model.regions[region_idx]);

        let mut coords_with_phantom = default_coords.clone();
        for _ in 0..4 {
            coords_with_phantom.push(Point::ZERO);
        }

        // IUP optimization with half-unit tolerance; gvar still carries
        // the phantom deltas.
        let deltas = match iup_delta_optimize(raw_deltas.clone(), coords_with_phantom, 0.5, &contour_ends)
        {
            Ok(optimized) => optimized
                .into_iter()
                .map(|d| GlyphDelta::required(d.x, d.y))
                .collect(),
            Err(e) => {
                warn!("IUP optimization failed for glyph {}: {e:?}", gid.to_u32());
                raw_deltas
                    .iter()
                    .map(|d| GlyphDelta::required(d.x as i16, d.y as i16))
                    .collect()
            }
        };

        glyph_deltas.push(GlyphDeltas::new(tents, deltas));
    }

    Ok(GlyphVariations::new(gid, glyph_deltas))
}

fn build_composite_glyph_variations(
    gid: GlyphId,
    default_composite: &CompositeGlyph,
    master_glyfs: &[read_fonts::tables::glyf::Glyf],
    master_locas: &[read_fonts::tables::loca::Loca],
    phantoms: &[PhantomPoints],
    model: &VariationModel,
) -> Result<GlyphVariations> {
    use read_fonts::tables::glyf::{Anchor, Glyph};

    let num_components = default_composite.components().count();

    fn component_offsets(composite: &CompositeGlyph) -> Vec<(i16, i16)> {
        composite
            .components()
            .map(|c| match c.anchor {
                Anchor::Offset { x, y } => (x, y),
                _ => (0, 0),
            })
            .collect()
    }

    let mut master_offsets: Vec<Vec<(i16, i16)>> = Vec::with_capacity(master_glyfs.len());

    for (glyf, loca) in master_glyfs.iter().zip(master_locas.iter()) {
        let glyph = loca.get_glyf(gid, glyf).ok().flatten();

        let offsets = match glyph {
            Some(Glyph::Composite(composite)) => component_offsets(&composite),
            _ => component_offsets(default_composite),
        };

        master_offsets.push(offsets);
    }

    let mut glyph_deltas: Vec<GlyphDeltas> = Vec::with_capacity(model.regions.len());

    for region_idx in 0..model.regions.len() {
        let tents = region_tents(&model.regions[region_idx]);

        let mut deltas: Vec<GlyphDelta> = Vec::with_capacity(num_components + 4);

        for comp_idx in 0..num_components {
            let offset_values: Vec<(i16, i16)> = master_offsets
                .iter()
                .map(|offsets| offsets.get(comp_idx).copied().unwrap_or((0, 0)))
                .collect();

            let (_, offset_deltas) = model.compute_deltas_2d(&offset_values);
            let delta = offset_deltas[region_idx];

            deltas.push(GlyphDelta::required(delta.0, delta.1));
        }

        // Phantom point deltas carry the advance width variation.
        for phantom_idx in 0..4 {
            let values: Vec<(i16, i16)> = phantoms.iter().map(|p| p[phantom_idx]).collect();
            let (_, phantom_deltas) = model.compute_deltas_2d(&values);
            let delta = phantom_deltas[region_idx];
            deltas.push(GlyphDelta::required(delta.0, delta.1));
        }

        glyph_deltas.push(GlyphDeltas::new(tents, deltas));
    }

    Ok(GlyphVariations::new(gid, glyph_deltas))
}
