//! Decompression of contiguous, indexed and indexed contiguous ragged arrays
//!
//! The store's first axis is the flat element axis. Every instance (and, for
//! indexed contiguous arrays, every profile of an instance) is a run of
//! elements copied to the start of its row in the logical array; the rest of
//! the row stays masked.

use super::descriptor::{ContiguousMapping, IndexedContiguousMapping, IndexedMapping};
use crate::element::Element;
use crate::masked::MaskedArray;
use ndarray::{ArrayViewD, ArrayViewMutD, Axis, Slice};
use std::ops::Range;

pub(crate) fn decompress_contiguous<T: Element>(
    source: &MaskedArray<T>,
    mapping: &ContiguousMapping,
    target: &mut MaskedArray<T>,
) {
    for (instance, range) in runs(&mapping.count).enumerate() {
        copy_run(source, range, target, &[instance], 0);
    }
}

pub(crate) fn decompress_indexed<T: Element>(
    source: &MaskedArray<T>,
    mapping: &IndexedMapping,
    target: &mut MaskedArray<T>,
) {
    let instances = target.shape()[0];
    for (instance, elements) in group_by_instance(&mapping.index, instances)
        .into_iter()
        .enumerate()
    {
        for (slot, element) in elements.into_iter().enumerate() {
            copy_run(source, element..element + 1, target, &[instance], slot);
        }
    }
}

pub(crate) fn decompress_indexed_contiguous<T: Element>(
    source: &MaskedArray<T>,
    mapping: &IndexedContiguousMapping,
    target: &mut MaskedArray<T>,
) {
    let instances = target.shape()[0];
    let profiles: Vec<Range<usize>> = runs(&mapping.count).collect();
    for (instance, owned) in group_by_instance(&mapping.index, instances)
        .into_iter()
        .enumerate()
    {
        for (slot, profile) in owned.into_iter().enumerate() {
            copy_run(source, profiles[profile].clone(), target, &[instance, slot], 0);
        }
    }
}

/// Element range of each run, in store order
fn runs(count: &[usize]) -> impl Iterator<Item = Range<usize>> + '_ {
    count.iter().scan(0, |start, &n| {
        let range = *start..*start + n;
        *start += n;
        Some(range)
    })
}

/// Positions owned by each instance, preserving store order
fn group_by_instance(index: &[usize], instances: usize) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); instances];
    for (position, &instance) in index.iter().enumerate() {
        groups[instance].push(position);
    }
    groups
}

/// Copy store elements `range` to
/// `target[prefix..., offset..offset + range.len(), ...]`
fn copy_run<T: Element>(
    source: &MaskedArray<T>,
    range: Range<usize>,
    target: &mut MaskedArray<T>,
    prefix: &[usize],
    offset: usize,
) {
    if range.is_empty() {
        return;
    }
    let (data, mask) = target.views_mut();
    assign_run(data, prefix, offset, source.data().view(), range.clone());
    assign_run(mask, prefix, offset, source.mask().view(), range);
}

fn assign_run<A: Clone>(
    target: ArrayViewMutD<'_, A>,
    prefix: &[usize],
    offset: usize,
    source: ArrayViewD<'_, A>,
    range: Range<usize>,
) {
    let len = range.len();
    let mut row = target;
    for &coord in prefix {
        row = row.index_axis_move(Axis(0), coord);
    }
    row.slice_axis_inplace(Axis(0), Slice::from(offset..offset + len));
    row.assign(&source.slice_axis(Axis(0), Slice::from(range)));
}
