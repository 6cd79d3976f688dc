//! Variation model for computing glyph deltas.
//!
//! Implements the core algorithm for computing how master contributions
//! are weighted at different locations in the design space. The same model
//! serves two callers: gvar delta computation (integer point coordinates)
//! and instance generation (f64 UFO geometry).

use std::iter::once;

use crate::designspace::DesignSpace;

/// A region in the variation space, defined by (start, peak, end) tuples.
///
/// Each tuple defines the contribution curve for one axis.
/// The contribution is 0 at start, 1 at peak, and 0 at end.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// (min, peak, max) for each axis in normalized coordinates
    pub axes: Vec<(f32, f32, f32)>,
}

impl Region {
    /// Create a region from a peak location with neighbor-based tent boundaries.
    ///
    /// For each axis, the tent (min, peak, max) follows the fontTools
    /// VariationModel scheme:
    /// - min: previous master's peak position (or 0 for the first positive
    ///   peak, -1 on the negative side)
    /// - max: axis maximum (1.0 for positive peaks, 0.0 approaching from
    ///   the negative side)
    pub fn from_peak_with_neighbors(peak: &[f32], all_locations: &[Vec<f32>]) -> Self {
        let axes = peak
            .iter()
            .enumerate()
            .map(|(axis_idx, &p)| {
                if p == 0.0 {
                    // Default location on this axis - no contribution
                    (0.0, 0.0, 0.0)
                } else {
                    let mut positions: Vec<f32> = all_locations
                        .iter()
                        .map(|loc| loc.get(axis_idx).copied().unwrap_or(0.0))
                        .collect();
                    positions.push(0.0);
                    positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
                    positions.dedup();

                    if p > 0.0 {
                        let pos_positions: Vec<f32> =
                            positions.iter().filter(|&&x| x >= 0.0).copied().collect();
                        let idx = pos_positions.iter().position(|&x| (x - p).abs() < 0.0001);

                        if let Some(i) = idx {
                            let min = if i == 0 { 0.0 } else { pos_positions[i - 1] };
                            (min, p, 1.0)
                        } else {
                            (0.0, p, 1.0)
                        }
                    } else {
                        let neg_positions: Vec<f32> =
                            positions.iter().filter(|&&x| x <= 0.0).copied().collect();
                        let idx = neg_positions.iter().position(|&x| (x - p).abs() < 0.0001);

                        if let Some(i) = idx {
                            let max = if i >= neg_positions.len() - 1 {
                                0.0
                            } else {
                                neg_positions[i + 1]
                            };
                            (-1.0, p, max)
                        } else {
                            (-1.0, p, 0.0)
                        }
                    }
                }
            })
            .collect();
        Self { axes }
    }

    /// Compute the scalar contribution of this region at a given location.
    ///
    /// Returns a value between 0 and 1.
    pub fn scalar_at(&self, location: &[f32]) -> f32 {
        let mut scalar = 1.0f32;

        for (i, &(min, peak, max)) in self.axes.iter().enumerate() {
            let loc = location.get(i).copied().unwrap_or(0.0);

            if peak == 0.0 {
                continue;
            }

            if loc < min || loc > max {
                return 0.0;
            }

            if loc == peak {
                continue;
            }

            if loc < peak {
                scalar *= (loc - min) / (peak - min);
            } else {
                scalar *= (max - loc) / (max - peak);
            }
        }

        scalar
    }
}

/// Variation model for computing deltas from master values.
#[derive(Debug)]
pub struct VariationModel {
    /// Regions for each master (excluding default)
    pub regions: Vec<Region>,
    /// Index of the default master in the original source list
    pub default_idx: usize,
    /// Order in which to process masters for delta computation
    pub master_order: Vec<usize>,
    /// Precomputed scalars: region_scalars[i][j] = scalar of region j at
    /// region i's peak. Only the lower triangle (j < i) is used.
    region_scalars: Vec<Vec<f32>>,
}

impl VariationModel {
    /// Create a variation model from a designspace.
    pub fn new(designspace: &DesignSpace) -> Option<Self> {
        let default_idx = designspace.default_source_index()?;
        let locations = designspace.master_locations();

        let mut regions_with_idx: Vec<(usize, Region)> = Vec::new();

        for (idx, loc) in locations.iter().enumerate() {
            if idx == default_idx {
                continue;
            }
            let region = Region::from_peak_with_neighbors(loc, &locations);
            regions_with_idx.push((idx, region));
        }

        // Masters with fewer active axes come first so deltas accumulate
        // in support order.
        regions_with_idx.sort_by_key(|(_, region)| {
            region.axes.iter().filter(|(_, peak, _)| *peak != 0.0).count()
        });

        let master_order: Vec<usize> = once(default_idx)
            .chain(regions_with_idx.iter().map(|(idx, _)| *idx))
            .collect();

        let regions: Vec<Region> = regions_with_idx.into_iter().map(|(_, r)| r).collect();

        let region_scalars: Vec<Vec<f32>> = regions
            .iter()
            .enumerate()
            .map(|(i, region_i)| {
                let peak_i: Vec<f32> = region_i.axes.iter().map(|(_, p, _)| *p).collect();
                regions[..i]
                    .iter()
                    .map(|region_j| region_j.scalar_at(&peak_i))
                    .collect()
            })
            .collect();

        Some(Self { regions, default_idx, master_order, region_scalars })
    }

    /// Compute deltas from per-master values.
    ///
    /// Given values at each master location (indexed by original source
    /// index), compute the deltas that reconstruct those values through
    /// variation interpolation. Returns (default_value, deltas) where
    /// deltas correspond to `self.regions`.
    pub fn compute_deltas(&self, master_values: &[f64]) -> (f64, Vec<f64>) {
        let default_value = master_values[self.default_idx];
        let mut deltas = Vec::with_capacity(self.regions.len());

        for region_idx in 0..self.regions.len() {
            let master_idx = self.master_order[region_idx + 1];
            let mut delta = master_values[master_idx] - default_value;

            for (prev_region_idx, &scalar) in self.region_scalars[region_idx].iter().enumerate() {
                if scalar != 0.0 {
                    delta -= deltas[prev_region_idx] * f64::from(scalar);
                }
            }

            deltas.push(delta);
        }

        (default_value, deltas)
    }

    /// Region scalars at an arbitrary normalized location.
    pub fn scalars_at(&self, location: &[f32]) -> Vec<f32> {
        self.regions.iter().map(|region| region.scalar_at(location)).collect()
    }

    /// Evaluate per-master values at a location given precomputed scalars.
    pub fn interpolate(&self, master_values: &[f64], scalars: &[f32]) -> f64 {
        let (default_value, deltas) = self.compute_deltas(master_values);
        default_value
            + deltas
                .iter()
                .zip(scalars)
                .map(|(delta, &scalar)| delta * f64::from(scalar))
                .sum::<f64>()
    }

    /// Compute 2D deltas (x, y) from master values.
    pub fn compute_deltas_2d(&self, master_values: &[(i16, i16)]) -> ((i16, i16), Vec<(i16, i16)>) {
        let default_value = master_values[self.default_idx];
        let mut deltas = Vec::with_capacity(self.regions.len());

        for region_idx in 0..self.regions.len() {
            let master_idx = self.master_order[region_idx + 1];
            let master_value = master_values[master_idx];

            let mut delta_x = i32::from(master_value.0) - i32::from(default_value.0);
            let mut delta_y = i32::from(master_value.1) - i32::from(default_value.1);

            for (prev_region_idx, &scalar) in self.region_scalars[region_idx].iter().enumerate() {
                if scalar != 0.0 {
                    let prev_delta: (i16, i16) = deltas[prev_region_idx];
                    delta_x -= (f32::from(prev_delta.0) * scalar) as i32;
                    delta_y -= (f32::from(prev_delta.1) * scalar) as i32;
                }
            }

            deltas.push((
                delta_x.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
                delta_y.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            ));
        }

        (default_value, deltas)
    }

    /// Compute the 2D delta for a single region (for per-point callers that
    /// already hold the preceding regions' deltas).
    #[inline]
    pub fn compute_delta_2d_for_region(
        &self,
        master_values: &[(i16, i16)],
        region_idx: usize,
        prev_deltas: &[(i16, i16)],
    ) -> (i16, i16) {
        let default_value = master_values[self.default_idx];
        let master_idx = self.master_order[region_idx + 1];
        let master_value = master_values[master_idx];

        let mut delta_x = i32::from(master_value.0) - i32::from(default_value.0);
        let mut delta_y = i32::from(master_value.1) - i32::from(default_value.1);

        for (prev_region_idx, &scalar) in self.region_scalars[region_idx].iter().enumerate() {
            if scalar != 0.0 {
                let prev_delta = prev_deltas[prev_region_idx];
                delta_x -= (f32::from(prev_delta.0) * scalar) as i32;
                delta_y -= (f32::from(prev_delta.1) * scalar) as i32;
            }
        }

        (
            delta_x.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            delta_y.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designspace::{Axis, Source};

    fn opsz_designspace() -> DesignSpace {
        let axes = vec![Axis::optical_size(8.0, 14.0, 14.0)];
        let sources = vec![
            Source::new("Lectura-Regular.ufo", vec![("opsz", 14.0)]),
            Source::new("Lectura-Caption.ufo", vec![("opsz", 8.0)]),
        ];
        DesignSpace::new(axes, sources)
    }

    fn two_axis_designspace() -> DesignSpace {
        let axes = vec![
            Axis::new("wght", "wght", 300.0, 400.0, 900.0),
            Axis::new("ital", "ital", 0.0, 0.0, 1.0),
        ];
        let sources = vec![
            Source::new("Regular.ufo", vec![("wght", 400.0), ("ital", 0.0)]),
            Source::new("Bold.ufo", vec![("wght", 900.0), ("ital", 0.0)]),
            Source::new("Italic.ufo", vec![("wght", 400.0), ("ital", 1.0)]),
            Source::new("BoldItalic.ufo", vec![("wght", 900.0), ("ital", 1.0)]),
        ];
        DesignSpace::new(axes, sources)
    }

    #[test]
    fn region_scalars() {
        let region = Region { axes: vec![(-1.0, -1.0, 0.0)] };
        assert_eq!(region.scalar_at(&[-1.0]), 1.0);
        assert_eq!(region.scalar_at(&[0.0]), 0.0);
        assert!((region.scalar_at(&[-0.5]) - 0.5).abs() < 0.001);
        assert_eq!(region.scalar_at(&[0.5]), 0.0);
    }

    #[test]
    fn model_creation() {
        let ds = two_axis_designspace();
        let model = VariationModel::new(&ds).unwrap();
        assert_eq!(model.default_idx, 0);
        assert_eq!(model.regions.len(), 3);
    }

    #[test]
    fn deltas_reconstruct_masters() {
        let ds = two_axis_designspace();
        let model = VariationModel::new(&ds).unwrap();

        // Regular=100, Bold=200, Italic=110, BoldItalic=220
        let values = [100.0, 200.0, 110.0, 220.0];

        for (idx, location) in ds.master_locations().iter().enumerate() {
            let scalars = model.scalars_at(location);
            let reconstructed = model.interpolate(&values, &scalars);
            assert!(
                (reconstructed - values[idx]).abs() < 0.001,
                "master {idx}: {reconstructed} != {}",
                values[idx]
            );
        }
    }

    #[test]
    fn interpolation_is_linear_between_masters() {
        let ds = opsz_designspace();
        let model = VariationModel::new(&ds).unwrap();

        let values = [700.0, 580.0];
        // opsz=11 normalizes to -0.5, halfway to the Caption master.
        let location = [ds.axes[0].normalize(11.0)];
        let scalars = model.scalars_at(&location);
        let value = model.interpolate(&values, &scalars);
        assert!((value - 640.0).abs() < 0.001);
    }

    #[test]
    fn deltas_2d() {
        let ds = opsz_designspace();
        let model = VariationModel::new(&ds).unwrap();

        let values = [(100i16, 50i16), (80i16, 40i16)];
        let (default, deltas) = model.compute_deltas_2d(&values);
        assert_eq!(default, (100, 50));
        assert_eq!(deltas, vec![(-20, -10)]);
    }
}
