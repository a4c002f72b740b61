//! # tomo-volume library
//!
//! This crate turns a series of tomographic scan slices into a calibrated 3D
//! intensity volume and extracts displayable 2D cross-sections from it.
//!
//! Slice decoding is left to the caller through the [`SliceDecoder`] trait:
//! the core consumes already-parsed sample grids and metadata, orders them
//! along the scan axis, converts raw detector counts to calibrated intensity
//! values via the per-slice linear rescale, and stacks the result into a
//! volume. If the environment supports it slices are decoded and converted in
//! parallel using rayon. The volume can be sliced in the three medical axes:
//!  - Axial
//!  - Sagittal
//!  - Coronal
//!
//! Any intensity sub-range (a "window") can be mapped onto the 8-bit display
//! range, either per slice for interactive preview or over the whole volume
//! using percentile bounds. Each extracted plane comes paired with the aspect
//! ratio needed to render it undistorted despite anisotropic voxel spacing;
//! applying the ratio is a display-time concern and never touches the data.
//!
//! # Examples
//!
//! ## Assembling a synthetic series and extracting a plane
//!
//! ```
//! use ndarray::Array2;
//! use tomo_volume::{Orientation, RawSlice, SliceMetadata, Volume, order_slices};
//!
//! let slices: Vec<RawSlice> = (0..3)
//!     .map(|i| {
//!         let metadata = SliceMetadata {
//!             position_z: Some(i as f32 * 2.5),
//!             rescale_intercept: Some(-1024.0),
//!             ..Default::default()
//!         };
//!         RawSlice::new(Array2::<u16>::zeros((4, 4)), metadata)
//!     })
//!     .collect();
//!
//! let volume = Volume::assemble(&order_slices(slices))?;
//! let display = volume.normalize(None);
//! let (plane, _aspect) = display.extract_plane(Orientation::Sagittal, None);
//! assert_eq!(plane.dim(), (4, 3));
//! # Ok::<(), tomo_volume::AssembleError>(())
//! ```
//!
//! ## Loading a series from a directory
//!
//! ```no_run
//! # use std::path::Path;
//! # use tomo_volume::{CancelToken, DecodeError, Orientation, RawSlice, SeriesLoader};
//! # fn my_decoder(path: &Path) -> Result<RawSlice, DecodeError> { unimplemented!() }
//! let loaded = SeriesLoader::load_from_directory("scans", "dcm", &my_decoder, &CancelToken::new())
//!     .expect("should have loaded files from directory");
//! let display = loaded.volume.normalize(None);
//! let image = display
//!     .scaled_plane_image(Orientation::Coronal, None)
//!     .expect("should have returned image at center of volume");
//! image.save("result.png");
//! ```

pub mod enums;
mod interpolator;
pub mod loader;
pub mod series;
pub mod slice;
pub mod volume;
pub mod window;

pub use enums::Orientation;
pub use loader::{CancelToken, DecodeError, LoadError, LoadedSeries, SeriesLoader, SliceDecoder};
pub use series::order_slices;
pub use slice::{RawSlice, SliceMetadata, VoxelSpacing, convert_to_intensity};
pub use volume::{AspectRatios, AssembleError, DisplayVolume, Volume};
pub use window::{Preset, Window, normalize_window};
