//! Masked n-dimensional arrays
//!
//! A [`MaskedArray`] pairs an [`ArrayD`] of values with a boolean mask of the
//! same shape. Masked cells are those the compressed store never observed (or
//! that carry the variable's fill value).

use crate::errors::{CfArrayError, Result};
use ndarray::{ArrayD, ArrayViewMutD, IxDyn};

/// Values plus a mask where `true` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray<T> {
    data: ArrayD<T>,
    mask: ArrayD<bool>,
}

impl<T: Copy + Default> MaskedArray<T> {
    /// Create an array of `shape` in which every cell is masked
    #[must_use]
    pub fn masked(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), T::default()),
            mask: ArrayD::from_elem(IxDyn(shape), true),
        }
    }

    /// Wrap plain data, masking nothing
    #[must_use]
    pub fn from_data(data: ArrayD<T>) -> Self {
        let mask = ArrayD::from_elem(data.raw_dim(), false);
        Self { data, mask }
    }

    /// Combine data with an explicit mask
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the mask and data shapes differ.
    pub fn from_parts(data: ArrayD<T>, mask: ArrayD<bool>) -> Result<Self> {
        if data.shape() != mask.shape() {
            return Err(CfArrayError::shape_mismatch(format!(
                "mask shape {:?} does not match data shape {:?}",
                mask.shape(),
                data.shape()
            )));
        }
        Ok(Self { data, mask })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Total number of cells, masked or not
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying values, including the placeholders under masked cells
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn mask(&self) -> &ArrayD<bool> {
        &self.mask
    }

    /// Value at `index`, or `None` if the cell is masked or out of bounds
    pub fn value(&self, index: &[usize]) -> Option<T> {
        match self.mask.get(index) {
            Some(false) => self.data.get(index).copied(),
            _ => None,
        }
    }

    /// Whether the cell at `index` is masked; out-of-bounds cells count as masked
    pub fn is_masked(&self, index: &[usize]) -> bool {
        self.mask.get(index).copied().unwrap_or(true)
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Copy of the values with every masked cell replaced by `fill_value`
    #[must_use]
    pub fn filled(&self, fill_value: T) -> ArrayD<T> {
        let mut out = self.data.clone();
        out.zip_mut_with(&self.mask, |value, &masked| {
            if masked {
                *value = fill_value;
            }
        });
        out
    }

    /// Unmasked values in row-major order
    pub fn compressed(&self) -> Vec<T> {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, &masked)| !masked)
            .map(|(&value, _)| value)
            .collect()
    }

    pub fn into_parts(self) -> (ArrayD<T>, ArrayD<bool>) {
        (self.data, self.mask)
    }

    /// Mutable views of the values and the mask, for in-place filling
    pub(crate) fn views_mut(&mut self) -> (ArrayViewMutD<'_, T>, ArrayViewMutD<'_, bool>) {
        (self.data.view_mut(), self.mask.view_mut())
    }
}
