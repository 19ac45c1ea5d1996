//! cf_compressed: CF compressed arrays as ordinary dense arrays
//!
//! NetCDF files following the CF conventions often store sparse or
//! variable-length data in compressed form: gathered arrays collapse several
//! axes into one sample axis, and ragged arrays pack a variable number of
//! elements per instance into one flat axis. This crate presents such data
//! as randomly indexable masked arrays of the full (uncompressed) shape,
//! materializing only what a caller asks for.
//!
//! ## Key Features
//!
//! - **All four CF encodings**: gathered, contiguous ragged, indexed ragged
//!   and indexed contiguous ragged arrays
//! - **Masked output**: every cell the store does not provide is masked
//! - **Outer indexing**: integer, slice, list, boolean and ellipsis indices,
//!   resolved independently per axis
//! - **Lazy storage**: NetCDF-backed, spilled-to-disk and arena-shared stores
//!   behind one [`Array`](array::Array) trait
//!
//! ## Module Organization
//!
//! - [`array`]: the array capability and the store variants
//! - [`compression`]: descriptors and the [`CompressedArray`] adapter
//! - [`indexing`]: index parsing and subspace extraction
//! - [`masked`]: the [`MaskedArray`] result type
//! - [`element`]: supported element types
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use cf_compressed::prelude::*;
//! use ndarray::ArrayD;
//!
//! // Three stations with 2, 0 and 3 observations
//! let store = MemoryArray::from_data(
//!     ArrayD::from_shape_vec(vec![5], vec![1.0f32, 2.0, 3.0, 4.0, 5.0]).unwrap(),
//! );
//! let descriptor = CompressionDescriptor::RaggedContiguous(ContiguousMapping {
//!     count: vec![2, 0, 3],
//! });
//! let array = CompressedArray::new(store, vec![3, 3], descriptor).unwrap();
//!
//! let station = array.get(&Index::Int(2).into()).unwrap();
//! assert_eq!(station.compressed(), vec![3.0, 4.0, 5.0]);
//! ```

pub mod array;
pub mod compression;
pub mod element;
pub mod errors;
pub mod indexing;
pub mod masked;

pub use array::{
    Array, FileArray, MemoryArray, SharedArena, SharedArray, SharedHandle, SpillConfig,
    SpilledArray, Store,
};
pub use compression::{
    CompressedArray, CompressionDescriptor, CompressionKind, ContiguousMapping, GatheredMapping,
    IndexedContiguousMapping, IndexedMapping,
};
pub use element::{DataType, Element};
pub use errors::{CfArrayError, Result};
pub use indexing::{AxisSelector, Index, Indices, SliceSelector};
pub use masked::MaskedArray;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::array::{Array, FileArray, MemoryArray, Store};
    pub use crate::compression::{
        CompressedArray, CompressionDescriptor, CompressionKind, ContiguousMapping,
        GatheredMapping, IndexedContiguousMapping, IndexedMapping,
    };
    pub use crate::errors::{CfArrayError, Result};
    pub use crate::indexing::{Index, Indices};
    pub use crate::masked::MaskedArray;
}
