//! Static table construction for compiled masters.

use chrono::Utc;
use font_types::{FWord, Fixed, LongDateTime, Tag, UfWord};
use lectura_font_ufo::FontInfo;
use write_fonts::tables::{
    glyf::Bbox,
    head::{Head, MacStyle},
    hhea::Hhea,
    hmtx::{Hmtx, LongMetric},
    maxp::Maxp,
    name::{Name, NameRecord},
    os2::{Os2, SelectionFlags},
    post::Post,
};

/// Seconds between the TrueType epoch (1904-01-01) and the Unix epoch.
const FONT_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Font-wide bounds and metrics accumulated while building glyphs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FontBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub advance_width_max: u16,
    pub min_lsb: i16,
    pub min_rsb: i16,
    pub x_max_extent: i16,
    has_content: bool,
}

impl FontBounds {
    pub fn new() -> Self {
        Self {
            x_min: i16::MAX,
            y_min: i16::MAX,
            x_max: i16::MIN,
            y_max: i16::MIN,
            advance_width_max: 0,
            min_lsb: i16::MAX,
            min_rsb: i16::MAX,
            x_max_extent: i16::MIN,
            has_content: false,
        }
    }

    pub fn update(&mut self, bbox: Option<Bbox>, advance: u16, lsb: i16) {
        self.advance_width_max = self.advance_width_max.max(advance);
        let Some(bbox) = bbox else {
            return;
        };
        self.has_content = true;
        self.x_min = self.x_min.min(bbox.x_min);
        self.y_min = self.y_min.min(bbox.y_min);
        self.x_max = self.x_max.max(bbox.x_max);
        self.y_max = self.y_max.max(bbox.y_max);
        self.min_lsb = self.min_lsb.min(lsb);
        let rsb = advance as i32 - lsb as i32 - (bbox.x_max as i32 - bbox.x_min as i32);
        self.min_rsb = self.min_rsb.min(rsb.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
        self.x_max_extent = self
            .x_max_extent
            .max((lsb as i32 + (bbox.x_max as i32 - bbox.x_min as i32)).clamp(i16::MIN as i32, i16::MAX as i32)
                as i16);
    }

    pub fn finalize(&mut self) {
        if !self.has_content {
            self.x_min = 0;
            self.y_min = 0;
            self.x_max = 0;
            self.y_max = 0;
            self.min_lsb = 0;
            self.min_rsb = 0;
            self.x_max_extent = 0;
        }
    }
}

fn clamp_i16(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

pub(crate) fn build_head(info: &FontInfo, bounds: &FontBounds, index_to_loc_format: i16) -> Head {
    let now = LongDateTime::new(Utc::now().timestamp() + FONT_EPOCH_OFFSET);
    let revision = info.version_major() as f64 + info.version_minor() as f64 / 1000.0;

    Head {
        font_revision: Fixed::from_f64(revision),
        checksum_adjustment: 0,
        magic_number: 0x5F0F3CF5,
        flags: write_fonts::tables::head::Flags::empty(),
        units_per_em: info.units_per_em().round() as u16,
        created: now,
        modified: now,
        x_min: bounds.x_min,
        y_min: bounds.y_min,
        x_max: bounds.x_max,
        y_max: bounds.y_max,
        mac_style: MacStyle::empty(),
        lowest_rec_ppem: 8,
        font_direction_hint: 2,
        index_to_loc_format,
    }
}

pub(crate) fn build_hhea(info: &FontInfo, bounds: &FontBounds, num_glyphs: u16) -> Hhea {
    Hhea {
        ascender: FWord::new(clamp_i16(info.ascender())),
        descender: FWord::new(clamp_i16(info.descender())),
        line_gap: FWord::new(0),
        advance_width_max: UfWord::new(bounds.advance_width_max),
        min_left_side_bearing: FWord::new(bounds.min_lsb),
        min_right_side_bearing: FWord::new(bounds.min_rsb),
        x_max_extent: FWord::new(bounds.x_max_extent),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: num_glyphs,
    }
}

pub(crate) fn build_hmtx(advances: &[u16], lsbs: &[i16]) -> Hmtx {
    Hmtx {
        h_metrics: advances
            .iter()
            .zip(lsbs)
            .map(|(advance, lsb)| LongMetric { advance: *advance, side_bearing: *lsb })
            .collect(),
        left_side_bearings: vec![],
    }
}

/// Per-glyph shape statistics feeding maxp.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GlyphStats {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

pub(crate) fn build_maxp(num_glyphs: u16, stats: &GlyphStats) -> Maxp {
    Maxp {
        num_glyphs,
        max_points: Some(stats.max_points),
        max_contours: Some(stats.max_contours),
        max_composite_points: Some(stats.max_composite_points),
        max_composite_contours: Some(stats.max_composite_contours),
        max_zones: Some(1),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(stats.max_component_elements),
        max_component_depth: Some(stats.max_component_depth),
    }
}

pub(crate) fn build_post(info: &FontInfo, glyph_names: &[String]) -> Post {
    let mut post = Post::new_v2(glyph_names.iter().map(String::as_str));
    post.italic_angle = Fixed::from_f64(info.italic_angle());
    post.underline_position = FWord::new(-100);
    post.underline_thickness = FWord::new(50);
    post
}

pub(crate) fn build_os2(
    info: &FontInfo,
    bounds: &FontBounds,
    advances: &[u16],
    codepoints: &[u32],
) -> Os2 {
    let nonzero: Vec<u16> = advances.iter().copied().filter(|&a| a > 0).collect();
    let x_avg_char_width = if nonzero.is_empty() {
        0
    } else {
        (nonzero.iter().map(|&a| a as u32).sum::<u32>() / nonzero.len() as u32) as i16
    };

    let first_char = codepoints.iter().min().copied().unwrap_or(0x20);
    let last_char = codepoints.iter().max().copied().unwrap_or(0x20);

    let ascender = clamp_i16(info.ascender());
    let descender = clamp_i16(info.descender());

    Os2 {
        x_avg_char_width,
        us_weight_class: 400,
        us_width_class: 5,
        fs_type: 0,
        y_subscript_x_size: 650,
        y_subscript_y_size: 600,
        y_subscript_x_offset: 0,
        y_subscript_y_offset: 75,
        y_superscript_x_size: 650,
        y_superscript_y_size: 600,
        y_superscript_x_offset: 0,
        y_superscript_y_offset: 350,
        y_strikeout_size: 50,
        y_strikeout_position: 300,
        s_family_class: 0,
        panose_10: [0; 10],
        ul_unicode_range_1: 0,
        ul_unicode_range_2: 0,
        ul_unicode_range_3: 0,
        ul_unicode_range_4: 0,
        ach_vend_id: Tag::new(b"NONE"),
        fs_selection: SelectionFlags::REGULAR,
        us_first_char_index: first_char.min(0xFFFF) as u16,
        us_last_char_index: last_char.min(0xFFFF) as u16,
        s_typo_ascender: ascender,
        s_typo_descender: descender,
        s_typo_line_gap: 0,
        us_win_ascent: bounds.y_max.max(ascender).max(0) as u16,
        us_win_descent: (-(bounds.y_min.min(descender))).max(0) as u16,
        ul_code_page_range_1: Some(1),
        ul_code_page_range_2: Some(0),
        sx_height: Some(info.x_height().map(clamp_i16).unwrap_or(0)),
        s_cap_height: Some(info.cap_height().map(clamp_i16).unwrap_or(ascender)),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        us_lower_optical_point_size: None,
        us_upper_optical_point_size: None,
    }
}

pub(crate) fn build_name(family: &str, style: &str, version_major: i64, version_minor: i64) -> Name {
    let full_name = if style == "Regular" {
        family.to_string()
    } else {
        format!("{family} {style}")
    };
    let postscript_name = format!("{}-{}", family.replace(' ', ""), style.replace(' ', ""));
    let version = format!("Version {version_major}.{version_minor:03}");
    let unique_id = format!("{version};{postscript_name}");

    let entries: [(u16, &str); 6] = [
        (1, family),
        (2, style),
        (3, &unique_id),
        (4, &full_name),
        (5, &version),
        (6, &postscript_name),
    ];

    let mut records: Vec<NameRecord> = Vec::with_capacity(entries.len() * 2);
    for (name_id, value) in entries {
        // Windows (platformID=3) and Mac (platformID=1) entries
        records.push(NameRecord::new(
            3,
            1,
            0x409,
            font_types::NameId::new(name_id),
            value.to_string().into(),
        ));
        records.push(NameRecord::new(
            1,
            0,
            0,
            font_types::NameId::new(name_id),
            value.to_string().into(),
        ));
    }

    records.sort_by(|a, b| {
        (a.platform_id, a.encoding_id, a.language_id, a.name_id).cmp(&(
            b.platform_id,
            b.encoding_id,
            b.language_id,
            b.name_id,
        ))
    });

    Name::new(records)
}
