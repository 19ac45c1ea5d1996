//! The array capability and the concrete stores behind it
//!
//! Every array in the crate, compressed or not, exposes the same small
//! interface through the [`Array`] trait: shape, dtype and an outer-indexed
//! [`get`](Array::get) that returns an in-memory [`MaskedArray`].
//!
//! The stores a compressed array can wrap form the closed [`Store`] union:
//! - [`MemoryArray`]: a shared in-memory buffer
//! - [`FileArray`]: a lazily opened NetCDF variable
//! - [`SpilledArray`]: a buffer written out to a temporary file
//! - [`SharedArray`]: a buffer registered in a [`SharedArena`]

pub mod file;
pub mod memory;
pub mod shared;
pub mod spill;

pub use file::FileArray;
pub use memory::MemoryArray;
pub use shared::{SharedArena, SharedArray, SharedHandle};
pub use spill::{SpillConfig, SpilledArray};

use crate::element::{DataType, Element};
use crate::errors::Result;
use crate::indexing::Indices;
use crate::masked::MaskedArray;

/// Common contract of every array
pub trait Array {
    type Elem: Element;

    /// Size of each dimension
    fn shape(&self) -> &[usize];

    /// Read the subspace selected by `indices` into memory
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` for a malformed expression and an I/O error if
    /// the backing storage cannot be read.
    fn get(&self, indices: &Indices) -> Result<MaskedArray<Self::Elem>>;

    /// A new wrapper over the same data; no values are copied
    #[must_use]
    fn copy(&self) -> Self
    where
        Self: Sized;

    /// Whether the values are held in memory rather than read from storage
    fn is_in_memory(&self) -> bool;

    fn dtype(&self) -> DataType {
        Self::Elem::DATA_TYPE
    }

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of cells
    fn size(&self) -> usize {
        self.shape().iter().product()
    }
}

/// The closed set of arrays that can back a compressed array
#[derive(Debug, Clone)]
pub enum Store<T: Element> {
    Memory(MemoryArray<T>),
    File(FileArray<T>),
    Spilled(SpilledArray<T>),
    Shared(SharedArray<T>),
}

impl<T: Element> Array for Store<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        match self {
            Self::Memory(array) => array.shape(),
            Self::File(array) => array.shape(),
            Self::Spilled(array) => array.shape(),
            Self::Shared(array) => array.shape(),
        }
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        match self {
            Self::Memory(array) => array.get(indices),
            Self::File(array) => array.get(indices),
            Self::Spilled(array) => array.get(indices),
            Self::Shared(array) => array.get(indices),
        }
    }

    fn copy(&self) -> Self {
        match self {
            Self::Memory(array) => Self::Memory(array.copy()),
            Self::File(array) => Self::File(array.copy()),
            Self::Spilled(array) => Self::Spilled(array.copy()),
            Self::Shared(array) => Self::Shared(array.copy()),
        }
    }

    fn is_in_memory(&self) -> bool {
        match self {
            Self::Memory(array) => array.is_in_memory(),
            Self::File(array) => array.is_in_memory(),
            Self::Spilled(array) => array.is_in_memory(),
            Self::Shared(array) => array.is_in_memory(),
        }
    }
}

impl<T: Element> From<MemoryArray<T>> for Store<T> {
    fn from(array: MemoryArray<T>) -> Self {
        Self::Memory(array)
    }
}

impl<T: Element> From<FileArray<T>> for Store<T> {
    fn from(array: FileArray<T>) -> Self {
        Self::File(array)
    }
}

impl<T: Element> From<SpilledArray<T>> for Store<T> {
    fn from(array: SpilledArray<T>) -> Self {
        Self::Spilled(array)
    }
}

impl<T: Element> From<SharedArray<T>> for Store<T> {
    fn from(array: SharedArray<T>) -> Self {
        Self::Shared(array)
    }
}

impl<T: Element> From<MaskedArray<T>> for Store<T> {
    fn from(array: MaskedArray<T>) -> Self {
        Self::Memory(MemoryArray::new(array))
    }
}

/// Read `indices` out of an array that is already fully in memory
pub(crate) fn subspace<T: Element>(array: &MaskedArray<T>, indices: &Indices) -> Result<MaskedArray<T>> {
    if indices.is_all() {
        return Ok(array.clone());
    }
    let selectors = crate::indexing::parse_indices(array.shape(), indices)?;
    crate::indexing::extract_subspace(array, &selectors)
}
