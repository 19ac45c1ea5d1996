//! Index expressions and outer-indexed subspace extraction
//!
//! Reading a subspace is a two step process:
//! - [`parser`]: normalizes an [`Indices`] expression against a shape into
//!   one canonical [`AxisSelector`] per axis
//! - [`extract`]: applies canonical selectors to an in-memory
//!   [`MaskedArray`](crate::masked::MaskedArray), axis by axis
//!
//! List selectors on different axes are never paired: selecting `[0, 2]` on
//! axis 0 and `[1, 3]` on axis 1 returns the 2x2 cross-product block.

pub mod extract;
pub mod parser;

pub use extract::extract_subspace;
pub use parser::parse_indices;

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// One per-axis entry of an index expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// A single position; the axis is kept with length 1
    Int(isize),
    /// A Python-style slice; missing bounds default to the whole axis
    Slice {
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    },
    /// Positions gathered along the axis, in the given order
    List(Vec<isize>),
    /// Boolean selection; must have exactly the axis length
    Mask(Vec<bool>),
    /// Expands to full slices over all axes not otherwise indexed
    Ellipsis,
}

impl Index {
    /// Slice covering the whole axis
    #[must_use]
    pub const fn full() -> Self {
        Self::Slice {
            start: None,
            stop: None,
            step: None,
        }
    }

    #[must_use]
    pub const fn slice(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self::Slice { start, stop, step }
    }
}

impl From<isize> for Index {
    fn from(position: isize) -> Self {
        Self::Int(position)
    }
}

impl From<Range<isize>> for Index {
    fn from(range: Range<isize>) -> Self {
        Self::slice(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<isize>> for Index {
    fn from(range: RangeFrom<isize>) -> Self {
        Self::slice(Some(range.start), None, None)
    }
}

impl From<RangeTo<isize>> for Index {
    fn from(range: RangeTo<isize>) -> Self {
        Self::slice(None, Some(range.end), None)
    }
}

impl From<RangeFull> for Index {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// A complete index expression
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indices {
    /// Select everything; bypasses parsing
    #[default]
    All,
    /// Per-axis entries, possibly fewer than the number of axes
    Axes(Vec<Index>),
}

impl Indices {
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<Index> for Indices {
    fn from(index: Index) -> Self {
        Self::Axes(vec![index])
    }
}

impl From<Vec<Index>> for Indices {
    fn from(indices: Vec<Index>) -> Self {
        Self::Axes(indices)
    }
}

/// A slice resolved against an axis length
///
/// Selects `len` positions starting at `start` and moving by `step`
/// (negative steps walk backwards). Selectors from [`parse_indices`] always
/// [`fits`](Self::fits) their axis; hand-built ones are checked on extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSelector {
    pub start: usize,
    pub step: isize,
    pub len: usize,
}

impl SliceSelector {
    /// Selector taking every position of an axis of length `len`
    #[must_use]
    pub const fn full(len: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            len,
        }
    }

    /// Whether this selects `0..axis_len` in order
    #[must_use]
    pub fn is_full(&self, axis_len: usize) -> bool {
        self.len == axis_len && (self.len == 0 || (self.start == 0 && self.step == 1))
    }

    /// Position of the last selected element
    ///
    /// `None` if nothing is selected or the walk would leave `0..=usize::MAX`.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        let steps = self.len.checked_sub(1)?;
        let offset = steps.checked_mul(self.step.unsigned_abs())?;
        if self.step > 0 {
            self.start.checked_add(offset)
        } else {
            self.start.checked_sub(offset)
        }
    }

    /// Whether every selected position lies in `0..axis_len`
    #[must_use]
    pub fn fits(&self, axis_len: usize) -> bool {
        if self.len == 0 {
            return true;
        }
        self.start < axis_len && self.last().is_some_and(|last| last < axis_len)
    }
}

/// Canonical selector for one axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisSelector {
    Slice(SliceSelector),
    List(Vec<usize>),
}

impl AxisSelector {
    /// Number of positions selected
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Slice(slice) => slice.len,
            Self::List(positions) => positions.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
