use crate::enums::Orientation;
use crate::interpolator::bilinear_sample;
use crate::slice::{RawSlice, VoxelSpacing};
use crate::window::Window;

use image::ImageBuffer;
use image::Luma;
use ndarray::{Array2, Array3, ArrayView2, Zip, s};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("series contains no usable slices")]
    EmptySeries,

    #[error("slice {index} has grid shape {found:?}, expected {expected:?}")]
    GeometryMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Display-time scale factors compensating for anisotropic voxel spacing.
///
/// Each ratio relates the physical lengths of the two axes of one canonical
/// plane. Rendering a plane undistorted means stretching its vertical axis by
/// the ratio; the underlying sample data is never altered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatios {
    pub axial: f32,
    pub sagittal: f32,
    pub coronal: f32,
}

impl AspectRatios {
    fn from_spacing(spacing: VoxelSpacing) -> Self {
        Self {
            axial: spacing.col / spacing.row,
            sagittal: spacing.row / spacing.thickness,
            coronal: spacing.thickness / spacing.col,
        }
    }

    pub fn for_orientation(self, orientation: Orientation) -> f32 {
        match orientation {
            Orientation::Axial => self.axial,
            Orientation::Sagittal => self.sagittal,
            Orientation::Coronal => self.coronal,
        }
    }
}

/// A calibrated 3D intensity volume, immutable once assembled.
///
/// Layout is `(rows, cols, depth)`: depth index `i` holds the i-th slice of
/// the ordered sequence. Aspect ratios are derived once from the first slice's
/// voxel geometry (all slices of a series share geometry by construction).
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<i32>,
    spacing: VoxelSpacing,
    aspect: AspectRatios,
}

impl Volume {
    /// Stack an ordered sequence of slices into a volume, converting each to
    /// calibrated intensity on parallel workers.
    ///
    /// # Errors
    ///
    /// `EmptySeries` when no slices remain or the grids hold no samples,
    /// `GeometryMismatch` when any slice disagrees with the first slice's
    /// grid shape. A mismatch aborts before any volume data is produced;
    /// slices are never cropped, padded or silently skipped.
    pub fn assemble(slices: &[RawSlice]) -> Result<Self, AssembleError> {
        let first = slices.first().ok_or(AssembleError::EmptySeries)?;
        let (rows, cols) = first.dim();
        if rows == 0 || cols == 0 {
            return Err(AssembleError::EmptySeries);
        }
        for (index, slice) in slices.iter().enumerate() {
            if slice.dim() != (rows, cols) {
                return Err(AssembleError::GeometryMismatch {
                    index,
                    expected: (rows, cols),
                    found: slice.dim(),
                });
            }
        }

        // each slice's conversion is independent of every other slice
        let converted: Vec<Array2<i32>> = slices.par_iter().map(RawSlice::to_intensity).collect();

        let mut data = Array3::<i32>::zeros((rows, cols, slices.len()));
        for (i, intensity) in converted.iter().enumerate() {
            data.slice_mut(s![.., .., i]).assign(intensity);
        }

        let spacing = first.metadata().spacing();
        Ok(Self {
            data,
            spacing,
            aspect: AspectRatios::from_spacing(spacing),
        })
    }

    /// Volume shape as (rows, cols, depth)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array3<i32> {
        &self.data
    }

    pub fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }

    pub fn aspect_ratios(&self) -> AspectRatios {
        self.aspect
    }

    /// Map the whole volume onto the 8-bit display range.
    ///
    /// Without an explicit window the bounds come from the 1st/99th intensity
    /// percentiles, so a single outlier sample cannot collapse the visible
    /// range. This differs from the single-slice preview default (raw
    /// min/max); the two modes are intentionally distinct.
    pub fn normalize(&self, window: Option<Window>) -> DisplayVolume {
        let window = window.unwrap_or_else(|| Window::from_percentiles(&self.data, 1.0, 99.0));
        let mut data = Array3::<u8>::zeros(self.data.dim());
        Zip::from(&mut data)
            .and(&self.data)
            .par_for_each(|out, &v| *out = window.apply(v));
        DisplayVolume {
            data,
            aspect: self.aspect,
        }
    }
}

/// A volume already normalized to 8-bit display values, ready for plane
/// extraction and rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayVolume {
    data: Array3<u8>,
    aspect: AspectRatios,
}

impl DisplayVolume {
    /// Volume shape as (rows, cols, depth)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn aspect_ratios(&self) -> AspectRatios {
        self.aspect
    }

    /// Extract one canonical plane together with its display aspect ratio.
    ///
    /// The index defaults to the midpoint of the selected axis and is clamped
    /// into the valid range otherwise. Plane shapes: axial `(rows, cols)`,
    /// sagittal `(rows, depth)`, coronal `(depth, cols)`. The coronal plane
    /// is transposed so its displayed orientation matches the other two.
    pub fn extract_plane(
        &self,
        orientation: Orientation,
        index: Option<usize>,
    ) -> (Array2<u8>, f32) {
        let (rows, cols, depth) = self.data.dim();
        let extent = match orientation {
            Orientation::Axial => depth,
            Orientation::Sagittal => cols,
            Orientation::Coronal => rows,
        };
        let index = index.unwrap_or(extent / 2).min(extent.saturating_sub(1));

        let plane = match orientation {
            Orientation::Axial => self.data.slice(s![.., .., index]).to_owned(),
            Orientation::Sagittal => self.data.slice(s![.., index, ..]).to_owned(),
            Orientation::Coronal => self.data.slice(s![index, .., ..]).t().to_owned(),
        };

        (plane, self.aspect.for_orientation(orientation))
    }

    /// Extract a plane and wrap it as a grayscale image, without aspect
    /// correction.
    pub fn plane_image(
        &self,
        orientation: Orientation,
        index: Option<usize>,
    ) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (plane, _) = self.extract_plane(orientation, index);
        plane_to_image(&plane.view())
    }

    /// Extract a plane and rasterize it with its aspect ratio applied as a
    /// vertical resample, so anisotropic voxel spacing does not distort the
    /// result. The volume data itself is untouched.
    pub fn scaled_plane_image(
        &self,
        orientation: Orientation,
        index: Option<usize>,
    ) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (plane, aspect) = self.extract_plane(orientation, index);
        let (rows, cols) = plane.dim();
        if rows == 0 || cols == 0 {
            return plane_to_image(&plane.view());
        }

        let height = ((rows as f32) * aspect).round().max(1.0) as u32;
        let width = cols as u32;
        if height as usize == rows {
            return plane_to_image(&plane.view());
        }

        let view = plane.view();
        let pixel_data: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map(|y| {
                (0..width)
                    .map(|x| {
                        // normalized coordinates with half-pixel offset
                        let norm_y = (y as f32 + 0.5) / height as f32;
                        let src_y = (norm_y * rows as f32 - 0.5).clamp(0.0, (rows - 1) as f32);
                        bilinear_sample(&view, src_y, x as f32).round() as u8
                    })
                    .collect::<Vec<u8>>()
            })
            .collect();

        ImageBuffer::from_raw(width, height, pixel_data)
    }
}

fn plane_to_image(plane: &ArrayView2<u8>) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let (height, width) = plane.dim();
    let pixel_data: Vec<u8> = plane.iter().copied().collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
}
