//! Arrays spilled from memory to a temporary file

use super::{subspace, Array};
use crate::element::Element;
use crate::errors::{CfArrayError, Result};
use crate::indexing::Indices;
use crate::masked::MaskedArray;
use ndarray::{ArrayD, IxDyn};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::debug;

/// Where spilled arrays are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillConfig {
    pub temp_dir: PathBuf,
    pub prefix: String,
}

impl SpillConfig {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            prefix: "cf_spill_".to_string(),
        }
    }

    /// Spill into the operating system's temporary directory
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }
}

/// A masked array whose values live in a temporary file
///
/// The file holds the raw element bytes in row-major order followed by one
/// byte per cell for the mask. It is deleted when the last copy is dropped.
#[derive(Debug, Clone)]
pub struct SpilledArray<T> {
    file: Arc<TempPath>,
    shape: Vec<usize>,
    _element: PhantomData<T>,
}

impl<T: Element> SpilledArray<T> {
    /// Write `array` to a new file described by `config`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn spill(array: &MaskedArray<T>, config: &SpillConfig) -> Result<Self> {
        let data = array.data().as_standard_layout();
        let values = data
            .as_slice()
            .ok_or_else(|| CfArrayError::shape_mismatch("array is not contiguous"))?;
        let mask: Vec<u8> = array.mask().iter().map(|&m| u8::from(m)).collect();

        let mut file = tempfile::Builder::new()
            .prefix(&config.prefix)
            .suffix(".bin")
            .tempfile_in(&config.temp_dir)?;
        file.write_all(bytemuck::cast_slice(values))?;
        file.write_all(&mask)?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), shape = ?array.shape(), "spilled array to disk");

        Ok(Self {
            file: Arc::new(path),
            shape: array.shape().to_vec(),
            _element: PhantomData,
        })
    }

    /// Location of the spill file
    pub fn path(&self) -> &Path {
        &self.file
    }

    fn read_all(&self) -> Result<MaskedArray<T>> {
        let bytes = std::fs::read(self.path())?;
        let cells: usize = self.shape.iter().product();
        let data_len = cells * T::DATA_TYPE.size_of();
        if bytes.len() != data_len + cells {
            return Err(CfArrayError::shape_mismatch(format!(
                "spill file '{}' holds {} bytes, expected {}",
                self.path().display(),
                bytes.len(),
                data_len + cells
            )));
        }

        let values: Vec<T> = bytemuck::pod_collect_to_vec(&bytes[..data_len]);
        let mask: Vec<bool> = bytes[data_len..].iter().map(|&b| b != 0).collect();
        MaskedArray::from_parts(
            ArrayD::from_shape_vec(IxDyn(&self.shape), values)?,
            ArrayD::from_shape_vec(IxDyn(&self.shape), mask)?,
        )
    }
}

impl<T: Element> Array for SpilledArray<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        subspace(&self.read_all()?, indices)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_in_memory(&self) -> bool {
        false
    }
}
