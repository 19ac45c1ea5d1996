//! Lazily opened arrays stored in NetCDF files
//!
//! A [`FileArray`] knows where its values live and what shape they have, but
//! holds no open file between reads unless [`FileArray::open`] was called
//! explicitly. Cells equal to the variable's `_FillValue` are masked.

use super::{subspace, Array};
use crate::element::Element;
use crate::errors::{CfArrayError, Result};
use crate::indexing::Indices;
use crate::masked::MaskedArray;
use ndarray::{ArrayD, IxDyn};
use netcdf::{AttributeValue, Variable};
use num_traits::ToPrimitive;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// A variable in a NetCDF file, read on demand
pub struct FileArray<T> {
    path: PathBuf,
    variable: String,
    shape: Vec<usize>,
    handle: Mutex<Option<netcdf::File>>,
    _element: PhantomData<T>,
}

impl<T: Element> FileArray<T> {
    /// Describe `variable` in the file at `path` without touching the file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a relative path cannot be made absolute.
    pub fn new(path: impl AsRef<Path>, variable: &str, shape: Vec<usize>) -> Result<Self> {
        Ok(Self {
            path: normalize_path(path.as_ref())?,
            variable: variable.to_string(),
            shape,
            handle: Mutex::new(None),
            _element: PhantomData,
        })
    }

    /// Describe `variable` by reading its dimensions from the file
    ///
    /// # Errors
    ///
    /// Returns `IoFailure` if the file cannot be opened and
    /// `VariableNotFound` if it has no such variable.
    pub fn from_file(path: impl AsRef<Path>, variable: &str) -> Result<Self> {
        let path = normalize_path(path.as_ref())?;
        let file = open_file(&path)?;
        let var = file
            .variable(variable)
            .ok_or_else(|| CfArrayError::VariableNotFound {
                var: variable.to_string(),
                path: path.clone(),
            })?;
        let shape = var.dimensions().iter().map(|d| d.len()).collect();

        Ok(Self {
            path,
            variable: variable.to_string(),
            shape,
            handle: Mutex::new(None),
            _element: PhantomData,
        })
    }

    /// Absolute path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Open the file and keep it open until [`close`](Self::close)
    ///
    /// Opening an already open array does nothing.
    ///
    /// # Errors
    ///
    /// Returns `IoFailure` if the file cannot be opened.
    pub fn open(&self) -> Result<()> {
        let mut handle = self.lock();
        if handle.is_none() {
            *handle = Some(open_file(&self.path)?);
        }
        Ok(())
    }

    /// Close the file; closing a closed array does nothing
    pub fn close(&self) {
        if self.lock().take().is_some() {
            trace!(path = %self.path.display(), "closed netCDF file");
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<netcdf::File>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read every value of the variable, masking fill values
    fn read_all(&self, file: &netcdf::File) -> Result<MaskedArray<T>> {
        let var = file
            .variable(&self.variable)
            .ok_or_else(|| CfArrayError::VariableNotFound {
                var: self.variable.clone(),
                path: self.path.clone(),
            })?;

        let file_shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if file_shape != self.shape {
            return Err(CfArrayError::shape_mismatch(format!(
                "variable '{}' has shape {:?} in '{}', expected {:?}",
                self.variable,
                file_shape,
                self.path.display(),
                self.shape
            )));
        }

        let values: Vec<T> = var
            .get_values::<T, _>(..)
            .map_err(|source| CfArrayError::IoFailure {
                path: self.path.clone(),
                source,
            })?;
        let data = ArrayD::from_shape_vec(IxDyn(&self.shape), values)?;

        let mask = match fill_value::<T>(&var) {
            Some(fill) if is_nan(fill) => data.mapv(is_nan),
            Some(fill) => data.mapv(|v| v == fill),
            None => ArrayD::from_elem(data.raw_dim(), false),
        };
        MaskedArray::from_parts(data, mask)
    }
}

impl<T: Element> Array for FileArray<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        let full = {
            let handle = self.lock();
            match handle.as_ref() {
                Some(file) => self.read_all(file)?,
                None => {
                    let file = open_file(&self.path)?;
                    let full = self.read_all(&file)?;
                    drop(file);
                    trace!(path = %self.path.display(), "closed netCDF file");
                    full
                }
            }
        };
        subspace(&full, indices)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_in_memory(&self) -> bool {
        false
    }
}

impl<T> Clone for FileArray<T> {
    /// The copy refers to the same file but starts closed
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            variable: self.variable.clone(),
            shape: self.shape.clone(),
            handle: Mutex::new(None),
            _element: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FileArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileArray")
            .field("path", &self.path)
            .field("variable", &self.variable)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

fn open_file(path: &Path) -> Result<netcdf::File> {
    let file = netcdf::open(path).map_err(|source| CfArrayError::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    trace!(path = %path.display(), "opened netCDF file");
    Ok(file)
}

/// Absolute path with `.` and `..` components removed
fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// The variable's `_FillValue` converted to the element type
fn fill_value<T: Element>(var: &Variable<'_>) -> Option<T> {
    let value = match var.attribute("_FillValue")?.value().ok()? {
        AttributeValue::Uchar(v) => f64::from(v),
        AttributeValue::Schar(v) => f64::from(v),
        AttributeValue::Ushort(v) => f64::from(v),
        AttributeValue::Short(v) => f64::from(v),
        AttributeValue::Uint(v) => f64::from(v),
        AttributeValue::Int(v) => f64::from(v),
        AttributeValue::Ulonglong(v) => v as f64,
        AttributeValue::Longlong(v) => v as f64,
        AttributeValue::Float(v) => f64::from(v),
        AttributeValue::Double(v) => v,
        _ => return None,
    };
    num_traits::cast(value)
}

/// NaN never equals itself, so a NaN fill value is matched by class
fn is_nan<T: Element>(value: T) -> bool {
    value.to_f64().is_some_and(f64::is_nan)
}
