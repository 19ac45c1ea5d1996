//! CF compressed arrays presented as ordinary dense arrays
//!
//! A [`CompressedArray`] wraps a compressed store together with its
//! [`CompressionDescriptor`]. Each read rebuilds the full logical array, with
//! every cell the store does not provide left masked, and then extracts the
//! requested subspace.
//!
//! # Organization
//!
//! - [`descriptor`]: descriptor types, JSON exchange and validation
//! - [`gathered`]: decompression by gathering
//! - [`ragged`]: contiguous, indexed and indexed contiguous ragged arrays

pub mod descriptor;
mod gathered;
mod ragged;

pub use descriptor::{
    CompressionDescriptor, CompressionKind, ContiguousMapping, GatheredMapping,
    IndexedContiguousMapping, IndexedMapping,
};

use crate::array::{subspace, Array, MemoryArray, Store};
use crate::element::Element;
use crate::errors::Result;
use crate::indexing::Indices;
use crate::masked::MaskedArray;
use std::sync::Arc;
use tracing::debug;

/// A compressed store exposed with its uncompressed shape
///
/// The store and descriptor are immutable and shared between copies, so
/// concurrent reads need no locking beyond what the store itself does.
#[derive(Debug, Clone)]
pub struct CompressedArray<T: Element> {
    store: Arc<Store<T>>,
    shape: Vec<usize>,
    descriptor: Arc<CompressionDescriptor>,
}

impl<T: Element> CompressedArray<T> {
    /// Wrap `store`, presenting it with `shape`
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the descriptor does not describe a mapping
    /// from the store's shape to `shape`.
    pub fn new(
        store: impl Into<Store<T>>,
        shape: Vec<usize>,
        descriptor: CompressionDescriptor,
    ) -> Result<Self> {
        Self::from_shared(Arc::new(store.into()), shape, descriptor)
    }

    /// Like [`new`](Self::new), for a store already shared with other arrays
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the descriptor does not fit the shapes.
    pub fn from_shared(
        store: Arc<Store<T>>,
        shape: Vec<usize>,
        descriptor: CompressionDescriptor,
    ) -> Result<Self> {
        descriptor.validate(store.shape(), &shape)?;
        Ok(Self {
            store,
            shape,
            descriptor: Arc::new(descriptor),
        })
    }

    pub fn store(&self) -> &Arc<Store<T>> {
        &self.store
    }

    pub fn descriptor(&self) -> &CompressionDescriptor {
        &self.descriptor
    }

    pub fn compression_kind(&self) -> CompressionKind {
        self.descriptor.kind()
    }

    /// Whether reads go to storage rather than to an in-memory buffer;
    /// always the opposite of [`Array::is_in_memory`]
    pub fn is_on_disk(&self) -> bool {
        !self.is_in_memory()
    }

    /// Store axis that holds the compressed data
    pub fn compressed_dimension(&self) -> usize {
        match &*self.descriptor {
            CompressionDescriptor::Gathered(mapping) => mapping.sample_axis,
            _ => 0,
        }
    }

    /// Logical axes that are collapsed into the compressed dimension
    pub fn compressed_axes(&self) -> Vec<usize> {
        match &*self.descriptor {
            CompressionDescriptor::Gathered(mapping) => {
                (mapping.sample_axis..mapping.sample_axis + mapping.collapsed_axes).collect()
            }
            CompressionDescriptor::RaggedContiguous(_) | CompressionDescriptor::RaggedIndexed(_) => {
                vec![0, 1]
            }
            CompressionDescriptor::RaggedIndexedContiguous(_) => vec![0, 1, 2],
        }
    }

    /// A copy whose store has been read fully into memory
    ///
    /// # Errors
    ///
    /// Returns any error raised while reading the store.
    pub fn to_memory(&self) -> Result<Self> {
        let store = Store::Memory(MemoryArray::new(self.store.get(&Indices::All)?));
        Ok(Self {
            store: Arc::new(store),
            shape: self.shape.clone(),
            descriptor: Arc::clone(&self.descriptor),
        })
    }

    /// Rebuild the full logical array
    fn decompress(&self) -> Result<MaskedArray<T>> {
        debug!(
            kind = %self.compression_kind(),
            shape = ?self.shape,
            "decompressing array"
        );
        let source = self.store.get(&Indices::All)?;
        let mut target = MaskedArray::masked(&self.shape);

        match &*self.descriptor {
            CompressionDescriptor::Gathered(mapping) => {
                gathered::decompress(&source, mapping, &mut target);
            }
            CompressionDescriptor::RaggedContiguous(mapping) => {
                ragged::decompress_contiguous(&source, mapping, &mut target);
            }
            CompressionDescriptor::RaggedIndexed(mapping) => {
                ragged::decompress_indexed(&source, mapping, &mut target);
            }
            CompressionDescriptor::RaggedIndexedContiguous(mapping) => {
                ragged::decompress_indexed_contiguous(&source, mapping, &mut target);
            }
        }
        Ok(target)
    }
}

impl<T: Element> Array for CompressedArray<T> {
    type Elem = T;

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn get(&self, indices: &Indices) -> Result<MaskedArray<T>> {
        let uncompressed = self.decompress()?;
        if indices.is_all() {
            return Ok(uncompressed);
        }
        subspace(&uncompressed, indices)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_in_memory(&self) -> bool {
        self.store.is_in_memory()
    }
}
