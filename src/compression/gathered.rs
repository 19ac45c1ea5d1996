//! Decompression of gathered arrays

use super::descriptor::GatheredMapping;
use crate::element::Element;
use crate::masked::MaskedArray;
use ndarray::{ArrayViewD, ArrayViewMutD, Axis};

/// Split a row-major position within `sizes` into one coordinate per axis,
/// most significant first
pub(crate) fn unravel(mut position: usize, sizes: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; sizes.len()];
    for (coord, &size) in coords.iter_mut().zip(sizes).rev() {
        *coord = position % size;
        position /= size;
    }
    coords
}

/// Copy every sample of `source` to its position in `target`
pub(crate) fn decompress<T: Element>(
    source: &MaskedArray<T>,
    mapping: &GatheredMapping,
    target: &mut MaskedArray<T>,
) {
    let axis = mapping.sample_axis;
    let sizes = target.shape()[axis..axis + mapping.collapsed_axes].to_vec();
    let (mut data, mut mask) = target.views_mut();

    for (sample, &position) in mapping.list.iter().enumerate() {
        let coords = unravel(position, &sizes);
        place(
            data.view_mut(),
            axis,
            &coords,
            source.data().index_axis(Axis(axis), sample),
        );
        place(
            mask.view_mut(),
            axis,
            &coords,
            source.mask().index_axis(Axis(axis), sample),
        );
    }
}

/// Fix the collapsed axes of `target` at `coords` and assign `sample` there
fn place<A: Clone>(target: ArrayViewMutD<'_, A>, axis: usize, coords: &[usize], sample: ArrayViewD<'_, A>) {
    let mut cell = target;
    for &coord in coords {
        cell = cell.index_axis_move(Axis(axis), coord);
    }
    cell.assign(&sample);
}

