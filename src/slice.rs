use log::warn;
use ndarray::Array2;
use num_traits::ToPrimitive;

/// Physical sample spacing of one slice, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSpacing {
    /// Distance between adjacent rows (vertical in-plane spacing)
    pub row: f32,
    /// Distance between adjacent columns (horizontal in-plane spacing)
    pub col: f32,
    /// Distance between adjacent slices along the scan axis
    pub thickness: f32,
}

impl Default for VoxelSpacing {
    fn default() -> Self {
        Self {
            row: 1.0,
            col: 1.0,
            thickness: 1.0,
        }
    }
}

/// Per-slice metadata as decoded by an external format parser.
///
/// Every field is optional: acquisition hardware and exporters routinely omit
/// tags. Accessors resolve missing or unusable values to documented defaults
/// instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SliceMetadata {
    pub rescale_slope: Option<f32>,
    pub rescale_intercept: Option<f32>,
    /// Z component of the slice's spatial position vector
    pub position_z: Option<f32>,
    /// Acquisition counter, used as an ordering fallback
    pub instance_number: Option<i32>,
    pub pixel_spacing_row: Option<f32>,
    pub pixel_spacing_col: Option<f32>,
    pub slice_thickness: Option<f32>,
}

impl SliceMetadata {
    /// Resolve the linear rescale parameters, defaulting to the identity
    /// transform (slope 1.0, intercept 0.0) when a field is missing or not a
    /// finite number. Never fails.
    pub fn rescale(&self) -> (f64, f64) {
        let slope = match self.rescale_slope {
            Some(s) if s.is_finite() => f64::from(s),
            Some(s) => {
                warn!("unusable rescale slope {s}, defaulting to 1.0");
                1.0
            }
            None => {
                warn!("rescale slope missing, defaulting to 1.0");
                1.0
            }
        };
        let intercept = match self.rescale_intercept {
            Some(i) if i.is_finite() => f64::from(i),
            Some(i) => {
                warn!("unusable rescale intercept {i}, defaulting to 0.0");
                0.0
            }
            None => {
                warn!("rescale intercept missing, defaulting to 0.0");
                0.0
            }
        };
        (slope, intercept)
    }

    /// Resolve the voxel geometry, substituting 1.0 mm for any spacing that is
    /// missing, non-finite or non-positive.
    pub fn spacing(&self) -> VoxelSpacing {
        let resolve = |value: Option<f32>, name: &str| match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            Some(v) => {
                warn!("unusable {name} {v}, defaulting to 1.0 mm");
                1.0
            }
            None => {
                warn!("{name} missing, defaulting to 1.0 mm");
                1.0
            }
        };
        VoxelSpacing {
            row: resolve(self.pixel_spacing_row, "row spacing"),
            col: resolve(self.pixel_spacing_col, "column spacing"),
            thickness: resolve(self.slice_thickness, "slice thickness"),
        }
    }
}

/// One decoded slice: a 2D grid of raw detector samples plus its metadata.
///
/// Samples are widened to `i32` on construction so that the calibrated
/// intensity range of any 16-bit acquisition fits without overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSlice {
    samples: Array2<i32>,
    metadata: SliceMetadata,
}

impl RawSlice {
    /// Build a slice from any integer sample grid. Values outside the `i32`
    /// range saturate.
    pub fn new<T: ToPrimitive + Copy>(samples: Array2<T>, metadata: SliceMetadata) -> Self {
        let samples = samples.mapv(|v| {
            v.to_i64()
                .unwrap_or(0)
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        });
        Self { samples, metadata }
    }

    pub fn samples(&self) -> &Array2<i32> {
        &self.samples
    }

    pub fn metadata(&self) -> &SliceMetadata {
        &self.metadata
    }

    /// Grid shape as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.samples.dim()
    }

    /// Convert the raw samples to calibrated intensity values using this
    /// slice's rescale metadata.
    pub fn to_intensity(&self) -> Array2<i32> {
        let (slope, intercept) = self.metadata.rescale();
        convert_to_intensity(&self.samples, slope, intercept)
    }
}

/// Apply the per-slice linear rescale `value * slope + intercept` element-wise,
/// producing calibrated intensity values.
///
/// The transform is computed in `f64` and rounded to the nearest integer, so
/// any 16-bit raw range combined with realistic scaling factors stays exact.
pub fn convert_to_intensity(samples: &Array2<i32>, slope: f64, intercept: f64) -> Array2<i32> {
    samples.mapv(|v| (f64::from(v) * slope + intercept).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn identity_transform_preserves_samples() {
        let samples = array![[-1024, 0, 512], [40, 3000, -2000]];
        assert_eq!(convert_to_intensity(&samples, 1.0, 0.0), samples);
    }

    #[test]
    fn rescale_applies_slope_and_intercept() {
        let samples = array![[0, 1024, 2048]];
        let intensity = convert_to_intensity(&samples, 1.0, -1024.0);
        assert_eq!(intensity, array![[-1024, 0, 1024]]);

        let halved = convert_to_intensity(&samples, 0.5, 0.0);
        assert_eq!(halved, array![[0, 512, 1024]]);
    }

    #[test]
    fn missing_rescale_fields_default_to_identity() {
        let metadata = SliceMetadata::default();
        assert_eq!(metadata.rescale(), (1.0, 0.0));
    }

    #[test]
    fn non_finite_rescale_fields_default_to_identity() {
        let metadata = SliceMetadata {
            rescale_slope: Some(f32::NAN),
            rescale_intercept: Some(f32::INFINITY),
            ..Default::default()
        };
        assert_eq!(metadata.rescale(), (1.0, 0.0));
    }

    #[test]
    fn invalid_spacing_defaults_to_unit() {
        let metadata = SliceMetadata {
            pixel_spacing_row: Some(0.0),
            pixel_spacing_col: None,
            slice_thickness: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(metadata.spacing(), VoxelSpacing::default());
    }

    #[test]
    fn unsigned_samples_widen_without_loss() {
        let samples = array![[0u16, 65535u16]];
        let slice = RawSlice::new(samples, SliceMetadata::default());
        assert_eq!(slice.samples(), &array![[0, 65535]]);
    }

    #[test]
    fn to_intensity_uses_slice_metadata() {
        let metadata = SliceMetadata {
            rescale_slope: Some(1.0),
            rescale_intercept: Some(-1024.0),
            ..Default::default()
        };
        let slice = RawSlice::new(array![[1024u16]], metadata);
        assert_eq!(slice.to_intensity(), array![[0]]);
    }
}
