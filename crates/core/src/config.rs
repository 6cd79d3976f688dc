//! Configuration for the Lectura build: family naming, directory layout,
//! the design space, and the composite recipe tables.

/// Font family name.
pub const FAMILY_NAME: &str = "Lectura";

/// Variable font output filename.
pub const VF_FILENAME: &str = "Lectura-VF.ttf";

/// Final designspace document filename (written into the build directory).
pub const DESIGNSPACE_FILENAME: &str = "Lectura.designspace";

/// Temporary designspace used for instance generation.
pub const TMP_DESIGNSPACE_FILENAME: &str = "tmp.designspace";

/// Glyph order file in the source directory, one glyph name per line.
pub const GLYPH_ORDER_FILENAME: &str = "Lectura-ascii.enc";

/// Staging directory for processed master UFOs.
pub const MASTER_UFO_DIR: &str = "master_ufo";

/// Directory for compiled interpolatable TrueType masters.
pub const MASTER_TTF_DIR: &str = "master_ttf";

/// Directory for generated instance UFOs.
pub const INSTANCE_DIR: &str = "instances";

/// Optical size axis range.
pub const OPSZ_MIN: f32 = 8.0;
pub const OPSZ_DEFAULT: f32 = 14.0;
pub const OPSZ_MAX: f32 = 14.0;

/// The default (neutral) master filename.
pub const DEFAULT_MASTER: &str = "Lectura-Regular.ufo";

/// A drawn master and its place in the design space.
#[derive(Debug, Clone, Copy)]
pub struct MasterDef {
    pub filename: &'static str,
    pub style_name: &'static str,
    pub opsz: f32,
    /// Font-wide info is copied from this master into the variable font.
    pub copy_info: bool,
    /// Whether accented composites are constructed in this master.
    pub build_accents: bool,
}

pub const MASTERS: &[MasterDef] = &[
    MasterDef {
        filename: "Lectura-Regular.ufo",
        style_name: "Regular",
        opsz: 14.0,
        copy_info: true,
        build_accents: true,
    },
    MasterDef {
        filename: "Lectura-Caption.ufo",
        style_name: "Caption",
        opsz: 8.0,
        copy_info: false,
        build_accents: true,
    },
];

/// A named instance, generated by interpolation during the build.
#[derive(Debug, Clone, Copy)]
pub struct InstanceDef {
    pub filename: &'static str,
    pub style_name: &'static str,
    pub opsz: f32,
}

pub const INSTANCES: &[InstanceDef] = &[InstanceDef {
    filename: "Lectura-Subhead.ufo",
    style_name: "Subhead",
    opsz: 11.0,
}];

/// Composite construction recipes: `base+mark@anchor[+mark@anchor...]`.
/// Every `@anchor` resolves against the base glyph's anchors; the mark
/// glyph supplies the matching `_anchor`.
pub const COMPOSITES: &[(&str, &str)] = &[
    ("Agrave", "A+grave@top"),
    ("Aacute", "A+acute@top"),
    ("Acircumflex", "A+circumflex@top"),
    ("Atilde", "A+tilde@top"),
    ("Adieresis", "A+dieresis@top"),
    ("Aring", "A+ring@top"),
    ("Ccedilla", "C+cedilla@bottom"),
    ("Egrave", "E+grave@top"),
    ("Eacute", "E+acute@top"),
    ("Ecircumflex", "E+circumflex@top"),
    ("Edieresis", "E+dieresis@top"),
    ("Igrave", "I+grave@top"),
    ("Iacute", "I+acute@top"),
    ("Icircumflex", "I+circumflex@top"),
    ("Idieresis", "I+dieresis@top"),
    ("Ntilde", "N+tilde@top"),
    ("Ograve", "O+grave@top"),
    ("Oacute", "O+acute@top"),
    ("Ocircumflex", "O+circumflex@top"),
    ("Otilde", "O+tilde@top"),
    ("Odieresis", "O+dieresis@top"),
    ("Ugrave", "U+grave@top"),
    ("Uacute", "U+acute@top"),
    ("Ucircumflex", "U+circumflex@top"),
    ("Udieresis", "U+dieresis@top"),
    ("Yacute", "Y+acute@top"),
    ("agrave", "a+grave@top"),
    ("aacute", "a+acute@top"),
    ("acircumflex", "a+circumflex@top"),
    ("atilde", "a+tilde@top"),
    ("adieresis", "a+dieresis@top"),
    ("aring", "a+ring@top"),
    ("ccedilla", "c+cedilla@bottom"),
    ("egrave", "e+grave@top"),
    ("eacute", "e+acute@top"),
    ("ecircumflex", "e+circumflex@top"),
    ("edieresis", "e+dieresis@top"),
    ("igrave", "dotlessi+grave@top"),
    ("iacute", "dotlessi+acute@top"),
    ("icircumflex", "dotlessi+circumflex@top"),
    ("idieresis", "dotlessi+dieresis@top"),
    ("ntilde", "n+tilde@top"),
    ("ograve", "o+grave@top"),
    ("oacute", "o+acute@top"),
    ("ocircumflex", "o+circumflex@top"),
    ("otilde", "o+tilde@top"),
    ("odieresis", "o+dieresis@top"),
    ("ugrave", "u+grave@top"),
    ("uacute", "u+acute@top"),
    ("ucircumflex", "u+circumflex@top"),
    ("udieresis", "u+dieresis@top"),
    ("yacute", "y+acute@top"),
    ("ydieresis", "y+dieresis@top"),
];

/// Codepoints for the composite glyph names above.
const COMPOSITE_UNICODES: &[(&str, u32)] = &[
    ("Agrave", 0x00C0),
    ("Aacute", 0x00C1),
    ("Acircumflex", 0x00C2),
    ("Atilde", 0x00C3),
    ("Adieresis", 0x00C4),
    ("Aring", 0x00C5),
    ("Ccedilla", 0x00C7),
    ("Egrave", 0x00C8),
    ("Eacute", 0x00C9),
    ("Ecircumflex", 0x00CA),
    ("Edieresis", 0x00CB),
    ("Igrave", 0x00CC),
    ("Iacute", 0x00CD),
    ("Icircumflex", 0x00CE),
    ("Idieresis", 0x00CF),
    ("Ntilde", 0x00D1),
    ("Ograve", 0x00D2),
    ("Oacute", 0x00D3),
    ("Ocircumflex", 0x00D4),
    ("Otilde", 0x00D5),
    ("Odieresis", 0x00D6),
    ("Ugrave", 0x00D9),
    ("Uacute", 0x00DA),
    ("Ucircumflex", 0x00DB),
    ("Udieresis", 0x00DC),
    ("Yacute", 0x00DD),
    ("agrave", 0x00E0),
    ("aacute", 0x00E1),
    ("acircumflex", 0x00E2),
    ("atilde", 0x00E3),
    ("adieresis", 0x00E4),
    ("aring", 0x00E5),
    ("ccedilla", 0x00E7),
    ("egrave", 0x00E8),
    ("eacute", 0x00E9),
    ("ecircumflex", 0x00EA),
    ("edieresis", 0x00EB),
    ("igrave", 0x00EC),
    ("iacute", 0x00ED),
    ("icircumflex", 0x00EE),
    ("idieresis", 0x00EF),
    ("ntilde", 0x00F1),
    ("ograve", 0x00F2),
    ("oacute", 0x00F3),
    ("ocircumflex", 0x00F4),
    ("otilde", 0x00F5),
    ("odieresis", 0x00F6),
    ("ugrave", 0x00F9),
    ("uacute", 0x00FA),
    ("ucircumflex", 0x00FB),
    ("udieresis", 0x00FC),
    ("yacute", 0x00FD),
    ("ydieresis", 0x00FF),
];

/// The codepoint assigned to a constructed composite.
pub fn composite_unicode(name: &str) -> Option<u32> {
    COMPOSITE_UNICODES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, cp)| *cp)
}

/// Whether a glyph name is scheduled for composite construction.
pub fn is_composite(name: &str) -> bool {
    COMPOSITES.iter().any(|(n, _)| *n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_composite_has_a_codepoint() {
        for (name, _) in COMPOSITES {
            assert!(composite_unicode(name).is_some(), "no codepoint for '{name}'");
        }
    }

    #[test]
    fn default_master_is_configured() {
        let default = MASTERS.iter().find(|m| m.filename == DEFAULT_MASTER).unwrap();
        assert_eq!(default.opsz, OPSZ_DEFAULT);
        assert!(default.copy_info);
    }

    #[test]
    fn composite_lookup() {
        assert!(is_composite("Agrave"));
        assert!(!is_composite("A"));
        assert_eq!(composite_unicode("ydieresis"), Some(0xFF));
    }
}
