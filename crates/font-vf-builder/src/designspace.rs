//! Designspace model for variable font building.
//!
//! Mirrors the descriptor concepts from designspace documents: axes with
//! label names and user-to-design maps, sources (masters) with locations,
//! and named instances.

use std::{collections::HashMap, path::PathBuf};

/// A variation axis in the designspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Four-character axis tag (e.g., "opsz", "wght")
    pub tag: String,
    /// Axis name, used to key location dimensions
    pub name: String,
    /// Minimum user value on this axis
    pub minimum: f32,
    /// Default user value on this axis
    pub default: f32,
    /// Maximum user value on this axis
    pub maximum: f32,
    /// Display labels per language code
    pub label_names: Vec<(String, String)>,
    /// Piecewise-linear user-to-design map; empty means identity
    pub map: Vec<(f32, f32)>,
}

impl Axis {
    /// Create a new axis.
    pub fn new(tag: &str, name: &str, minimum: f32, default: f32, maximum: f32) -> Self {
        Self {
            tag: tag.to_string(),
            name: name.to_string(),
            minimum,
            default,
            maximum,
            label_names: Vec::new(),
            map: Vec::new(),
        }
    }

    /// Create a standard optical size axis.
    pub fn optical_size(minimum: f32, default: f32, maximum: f32) -> Self {
        Self::new("opsz", "opsz", minimum, default, maximum)
    }

    /// Add a display label for a language code.
    pub fn with_label_name(mut self, lang: &str, label: &str) -> Self {
        self.label_names.push((lang.to_string(), label.to_string()));
        self
    }

    /// Set the user-to-design map.
    pub fn with_map(mut self, map: Vec<(f32, f32)>) -> Self {
        self.map = map;
        self
    }

    /// Map a user value into design space through the axis map.
    ///
    /// Values outside the map's range clamp to its ends. An empty map is
    /// the identity.
    pub fn map_forward(&self, value: f32) -> f32 {
        let Some((first, last)) = self.map.first().zip(self.map.last()) else {
            return value;
        };
        if value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }
        for pair in self.map.windows(2) {
            let (in0, out0) = pair[0];
            let (in1, out1) = pair[1];
            if value <= in1 {
                if in1 == in0 {
                    return out1;
                }
                return out0 + (out1 - out0) * (value - in0) / (in1 - in0);
            }
        }
        last.1
    }

    /// Normalize a user-space value to the range [-1, 1].
    ///
    /// The value and the axis extremes are first mapped into design space,
    /// then values below the default normalize to [-1, 0] and values above
    /// it to [0, 1].
    pub fn normalize(&self, value: f32) -> f32 {
        let value = self.map_forward(value);
        let minimum = self.map_forward(self.minimum);
        let default = self.map_forward(self.default);
        let maximum = self.map_forward(self.maximum);

        if value < default {
            if default == minimum {
                0.0
            } else {
                -((default - value) / (default - minimum))
            }
        } else if value > default {
            if default == maximum {
                0.0
            } else {
                (value - default) / (maximum - default)
            }
        } else {
            0.0
        }
    }
}

/// A source (master) font in the designspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Path to the source font
    pub path: PathBuf,
    /// Source name, conventionally the file name
    pub name: String,
    /// Location in the designspace as (axis_tag, user value) pairs
    pub location: HashMap<String, f32>,
    /// Optional family name
    pub family_name: Option<String>,
    /// Optional style name
    pub style_name: Option<String>,
    /// Whether font-wide info is copied from this source
    pub copy_info: bool,
}

impl Source {
    /// Create a new source with the given path and location.
    pub fn new(
        path: impl Into<PathBuf>,
        location: impl IntoIterator<Item = (&'static str, f32)>,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            location: location.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            family_name: None,
            style_name: None,
            copy_info: false,
        }
    }

    /// Set the family name.
    pub fn with_family_name(mut self, name: &str) -> Self {
        self.family_name = Some(name.to_string());
        self
    }

    /// Set the style name.
    pub fn with_style_name(mut self, name: &str) -> Self {
        self.style_name = Some(name.to_string());
        self
    }

    /// Mark this source as the one font-wide info is copied from.
    pub fn with_copy_info(mut self) -> Self {
        self.copy_info = true;
        self
    }

    /// Get the value for an axis, or the axis default if not specified.
    pub fn axis_value(&self, axis: &Axis) -> f32 {
        self.location.get(&axis.tag).copied().unwrap_or(axis.default)
    }

    /// Get the normalized location over the given axes.
    pub fn normalized_location(&self, axes: &[Axis]) -> Vec<f32> {
        axes.iter().map(|axis| axis.normalize(self.axis_value(axis))).collect()
    }
}

/// A named instance in the designspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Style name (e.g., "Subhead")
    pub name: String,
    /// Optional output filename for a generated instance font
    pub filename: Option<String>,
    /// Optional family name
    pub family_name: Option<String>,
    /// Location in the designspace as (axis_tag, user value) pairs
    pub location: HashMap<String, f32>,
}

impl Instance {
    /// Create a new instance with the given style name and location.
    pub fn new(name: &str, location: impl IntoIterator<Item = (&'static str, f32)>) -> Self {
        Self {
            name: name.to_string(),
            filename: None,
            family_name: None,
            location: location.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Set the output filename.
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// Set the family name.
    pub fn with_family_name(mut self, name: &str) -> Self {
        self.family_name = Some(name.to_string());
        self
    }

    /// Get the value for an axis, or the axis default if not specified.
    pub fn axis_value(&self, axis: &Axis) -> f32 {
        self.location.get(&axis.tag).copied().unwrap_or(axis.default)
    }

    /// Get the normalized location over the given axes.
    pub fn normalized_location(&self, axes: &[Axis]) -> Vec<f32> {
        axes.iter().map(|axis| axis.normalize(self.axis_value(axis))).collect()
    }
}

/// A complete designspace defining a variable font.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    /// Variation axes
    pub axes: Vec<Axis>,
    /// Source (master) fonts
    pub sources: Vec<Source>,
    /// Named instances
    pub instances: Vec<Instance>,
}

impl DesignSpace {
    /// Create a new designspace with the given axes and sources.
    pub fn new(axes: Vec<Axis>, sources: Vec<Source>) -> Self {
        Self { axes, sources, instances: Vec::new() }
    }

    /// Add named instances to the designspace.
    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    /// Find the default source (the one at the default location for all axes).
    pub fn default_source(&self) -> Option<&Source> {
        self.default_source_index().map(|idx| &self.sources[idx])
    }

    /// Find the index of the default source.
    pub fn default_source_index(&self) -> Option<usize> {
        self.sources.iter().position(|source| {
            self.axes
                .iter()
                .all(|axis| (source.axis_value(axis) - axis.default).abs() < 0.001)
        })
    }

    /// Get all master locations as normalized coordinates.
    pub fn master_locations(&self) -> Vec<Vec<f32>> {
        self.sources
            .iter()
            .map(|source| source.normalized_location(&self.axes))
            .collect()
    }

    /// Validate the designspace.
    pub fn validate(&self) -> Result<(), String> {
        if self.axes.is_empty() {
            return Err("Designspace must have at least one axis".to_string());
        }
        if self.sources.is_empty() {
            return Err("Designspace must have at least one source".to_string());
        }
        if self.default_source().is_none() {
            return Err("Designspace must have a source at the default location".to_string());
        }

        for axis in &self.axes {
            if axis.tag.len() > 4 {
                return Err(format!("Axis tag '{}' must be 4 characters or less", axis.tag));
            }
            if axis.minimum > axis.default || axis.default > axis.maximum {
                return Err(format!(
                    "Axis '{}' must satisfy minimum <= default <= maximum",
                    axis.tag
                ));
            }
        }

        Ok(())
    }
}
