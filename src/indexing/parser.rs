//! Normalization of index expressions against a shape

use super::{AxisSelector, Index, Indices, SliceSelector};
use crate::errors::{CfArrayError, Result};

/// Parse `indices` against `shape` into one canonical selector per axis
///
/// Missing trailing entries and the [`Index::Ellipsis`] marker expand to full
/// slices. Integer positions keep their axis as a length-1 slice.
///
/// # Errors
///
/// Returns `InvalidIndex` if:
/// - a position lies outside `[-len, len)`
/// - a slice step is zero
/// - a boolean mask does not have the axis length
/// - more than one ellipsis is given
/// - there are more entries than axes
pub fn parse_indices(shape: &[usize], indices: &Indices) -> Result<Vec<AxisSelector>> {
    let entries = match indices {
        Indices::All => {
            return Ok(shape
                .iter()
                .map(|&len| AxisSelector::Slice(SliceSelector::full(len)))
                .collect())
        }
        Indices::Axes(entries) => entries,
    };

    let expanded = expand_ellipsis(shape.len(), entries)?;
    expanded
        .iter()
        .zip(shape)
        .enumerate()
        .map(|(axis, (index, &len))| parse_axis(axis, len, index))
        .collect()
}

/// Replace the ellipsis (or the missing tail) with full slices so there is
/// exactly one entry per axis
fn expand_ellipsis(ndim: usize, entries: &[Index]) -> Result<Vec<Index>> {
    let ellipses = entries
        .iter()
        .filter(|index| matches!(index, Index::Ellipsis))
        .count();
    if ellipses > 1 {
        return Err(CfArrayError::invalid_index(
            "an index can only have a single ellipsis",
        ));
    }

    let explicit = entries.len() - ellipses;
    if explicit > ndim {
        return Err(CfArrayError::invalid_index(format!(
            "too many indices: array is {ndim}-dimensional, but {explicit} were indexed"
        )));
    }

    let fill = ndim - explicit;
    let mut expanded = Vec::with_capacity(ndim);
    for index in entries {
        if matches!(index, Index::Ellipsis) {
            expanded.extend(std::iter::repeat(Index::full()).take(fill));
        } else {
            expanded.push(index.clone());
        }
    }
    if ellipses == 0 {
        expanded.extend(std::iter::repeat(Index::full()).take(fill));
    }
    Ok(expanded)
}

fn parse_axis(axis: usize, len: usize, index: &Index) -> Result<AxisSelector> {
    match index {
        Index::Int(position) => {
            let start = resolve_position(axis, len, *position)?;
            Ok(AxisSelector::Slice(SliceSelector {
                start,
                step: 1,
                len: 1,
            }))
        }
        Index::Slice { start, stop, step } => {
            normalize_slice(axis, len, *start, *stop, *step).map(AxisSelector::Slice)
        }
        Index::List(positions) => positions
            .iter()
            .map(|&position| resolve_position(axis, len, position))
            .collect::<Result<Vec<_>>>()
            .map(AxisSelector::List),
        Index::Mask(flags) => {
            if flags.len() != len {
                return Err(CfArrayError::invalid_index(format!(
                    "boolean index of length {} does not match axis {axis} of length {len}",
                    flags.len()
                )));
            }
            Ok(AxisSelector::List(
                flags
                    .iter()
                    .enumerate()
                    .filter(|(_, &keep)| keep)
                    .map(|(position, _)| position)
                    .collect(),
            ))
        }
        Index::Ellipsis => unreachable!("ellipsis is expanded before per-axis parsing"),
    }
}

/// Bounds-check a single position, counting negative positions from the end
fn resolve_position(axis: usize, len: usize, position: isize) -> Result<usize> {
    let signed_len = len as isize;
    let resolved = if position < 0 {
        position + signed_len
    } else {
        position
    };
    if resolved < 0 || resolved >= signed_len {
        return Err(CfArrayError::invalid_index(format!(
            "index {position} is out of bounds for axis {axis} with size {len}"
        )));
    }
    Ok(resolved as usize)
}

/// Resolve a slice the way Python's `slice.indices` does, clamping bounds to
/// the axis
fn normalize_slice(
    axis: usize,
    len: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
) -> Result<SliceSelector> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(CfArrayError::invalid_index(format!(
            "slice step cannot be zero (axis {axis})"
        )));
    }

    let n = len as isize;
    let clamp = |value: isize, lower: isize, upper: isize| {
        let value = if value < 0 { value + n } else { value };
        value.clamp(lower, upper)
    };

    let (first, end) = if step > 0 {
        (
            start.map_or(0, |s| clamp(s, 0, n)),
            stop.map_or(n, |s| clamp(s, 0, n)),
        )
    } else {
        (
            start.map_or(n - 1, |s| clamp(s, -1, n - 1)),
            stop.map_or(-1, |s| clamp(s, -1, n - 1)),
        )
    };

    // Both bounds lie in -1..=n here, so their distance fits a usize
    let stride = step.unsigned_abs();
    let count = if step > 0 && end > first {
        (end - first - 1) as usize / stride + 1
    } else if step < 0 && first > end {
        (first - end - 1) as usize / stride + 1
    } else {
        0
    };

    Ok(SliceSelector {
        start: if count == 0 { 0 } else { first as usize },
        step,
        len: count,
    })
}
