use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::series::order_slices;
use crate::slice::RawSlice;
use crate::volume::{AssembleError, Volume};

/// Failure reported by a [`SliceDecoder`] for a single file.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// External format-parsing collaborator: turns one candidate file into a
/// decoded slice, or reports why it could not.
///
/// Implementations must be callable from parallel workers. Any
/// `Fn(&Path) -> Result<RawSlice, DecodeError> + Sync` closure qualifies.
pub trait SliceDecoder: Sync {
    fn decode(&self, path: &Path) -> Result<RawSlice, DecodeError>;
}

impl<F> SliceDecoder for F
where
    F: Fn(&Path) -> Result<RawSlice, DecodeError> + Sync,
{
    fn decode(&self, path: &Path) -> Result<RawSlice, DecodeError> {
        self(path)
    }
}

/// Cooperative cancellation flag shared between the caller and in-flight
/// loading workers. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A file excluded from the series because it failed to decode.
#[derive(Debug)]
pub struct SkippedSlice {
    pub path: PathBuf,
    pub reason: String,
}

/// A successfully assembled series plus the batch report of files that were
/// skipped along the way.
#[derive(Debug)]
pub struct LoadedSeries {
    pub volume: Volume,
    pub skipped: Vec<SkippedSlice>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load cancelled before a volume was assembled")]
    Cancelled,

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SeriesLoader;

impl SeriesLoader {
    /// Load, order and assemble a series from candidate file paths.
    ///
    /// Each path is decoded and intensity-converted on parallel workers;
    /// per-file failures never abort the batch and are returned in
    /// [`LoadedSeries::skipped`]. Assembly is the synchronization barrier: it
    /// starts only after every surviving slice is decoded and globally
    /// ordered, so no partially built volume can escape.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the token fires before assembly (in-flight work is
    /// abandoned and no volume is published), otherwise the fatal structural
    /// errors of [`Volume::assemble`].
    pub fn load_from_paths<D: SliceDecoder>(
        paths: &[PathBuf],
        decoder: &D,
        cancel: &CancelToken,
    ) -> Result<LoadedSeries, LoadError> {
        let results: Vec<(&PathBuf, Result<RawSlice, DecodeError>)> = paths
            .par_iter()
            .filter_map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some((path, decoder.decode(path)))
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let mut slices = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (path, result) in results {
            match result {
                Ok(slice) => slices.push(slice),
                Err(error) => {
                    warn!("skipping unreadable slice {}: {error}", path.display());
                    skipped.push(SkippedSlice {
                        path: path.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        let ordered = order_slices(slices);
        let volume = Volume::assemble(&ordered)?;
        info!(
            "assembled volume {:?} from {} slices ({} skipped)",
            volume.dim(),
            volume.dim().2,
            skipped.len()
        );

        Ok(LoadedSeries { volume, skipped })
    }

    /// Load a series from every file in `dir` whose extension matches
    /// `extension` (case-insensitive).
    pub fn load_from_directory<D: SliceDecoder>(
        dir: impl AsRef<Path>,
        extension: &str,
        decoder: &D,
        cancel: &CancelToken,
    ) -> Result<LoadedSeries, LoadError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .collect();
        // directory iteration order is platform-defined; sort so tie-breaking
        // during ordering stays deterministic
        paths.sort();

        Self::load_from_paths(&paths, decoder, cancel)
    }
}
