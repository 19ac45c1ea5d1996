//! In-memory arrays

use super::{subspace, Array};
use crate::element::Element;
use crate::errors::Result;
use crate::indexing::Indices;
use crate::masked::MaskedArray;
use ndarray::ArrayD;
use std::sync::Arc;

/// A masked array held in memory and shared between copies
#[derive(Debug, Clone)]
pub struct MemoryArray<T> {
    array: Arc<MaskedArray<T>>,
}

impl<T: Element> MemoryArray<T> {
    pub fn new(array: MaskedArray<T>) -> Self {
        Self {
            array: Arc::new(array),
        }
    }

    /// Wrap unmasked data
    pub fn from_data(data: ArrayD<T>) -> Self {
        Self::new(MaskedArray::from_data(data))
    }

    /// Borrow the full buffer without copying it
    pub fn as_masked(&self) -> &MaskedArray<T> {
        &self.array
    }

    /// Whether two wrappers share the same buffer
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.array, &other.array)
    }
}

impl<T: Element> Array for MemoryArray<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        subspace(&self.array, indices)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_in_memory(&self) -> bool {
        true
    }
}

impl<T: Element> From<ArrayD<T>> for MemoryArray<T> {
    fn from(data: ArrayD<T>) -> Self {
        Self::from_data(data)
    }
}
