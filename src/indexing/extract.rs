//! Outer-indexed extraction of a subspace from an in-memory masked array

use super::{AxisSelector, SliceSelector};
use crate::errors::{CfArrayError, Result};
use crate::masked::MaskedArray;
use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use tracing::trace;

/// Apply canonical selectors to `array`, one axis at a time
///
/// Slice selectors are taken as views; list selectors gather along their own
/// axis only, so the result has shape `[selector.len() for each axis]`.
///
/// # Errors
///
/// Returns `InvalidIndex` if the number of selectors differs from the number
/// of axes or a selector reaches past the end of its axis.
pub fn extract_subspace<T: Copy + Default>(
    array: &MaskedArray<T>,
    selectors: &[AxisSelector],
) -> Result<MaskedArray<T>> {
    check_selectors(array.shape(), selectors)?;

    let identity = selectors
        .iter()
        .zip(array.shape())
        .all(|(selector, &len)| matches!(selector, AxisSelector::Slice(s) if s.is_full(len)));
    if identity {
        return Ok(array.clone());
    }

    trace!(shape = ?array.shape(), ?selectors, "extracting subspace");
    let data = select_outer(array.data().view(), selectors);
    let mask = select_outer(array.mask().view(), selectors);
    MaskedArray::from_parts(data, mask)
}

fn check_selectors(shape: &[usize], selectors: &[AxisSelector]) -> Result<()> {
    if selectors.len() != shape.len() {
        return Err(CfArrayError::invalid_index(format!(
            "{} selectors given for a {}-dimensional array",
            selectors.len(),
            shape.len()
        )));
    }

    for (axis, (selector, &len)) in selectors.iter().zip(shape).enumerate() {
        let out_of_bounds = match selector {
            AxisSelector::Slice(slice) => !slice.fits(len),
            AxisSelector::List(positions) => positions.iter().any(|&p| p >= len),
        };
        if out_of_bounds {
            return Err(CfArrayError::invalid_index(format!(
                "selector {selector:?} is out of bounds for axis {axis} with size {len}"
            )));
        }
    }
    Ok(())
}

fn to_ndarray_slice(slice: &SliceSelector) -> Slice {
    match slice.last() {
        None => Slice::new(0, Some(0), 1),
        // A single position needs no stride
        Some(last) if slice.len == 1 => Slice::new(last as isize, Some(last as isize + 1), 1),
        Some(last) if slice.step > 0 => {
            Slice::new(slice.start as isize, Some(last as isize + 1), slice.step)
        }
        // ndarray walks negative steps backwards from the end of the range
        Some(last) => Slice::new(last as isize, Some(slice.start as isize + 1), slice.step),
    }
}

fn select_outer<A: Clone>(mut view: ArrayViewD<'_, A>, selectors: &[AxisSelector]) -> ArrayD<A> {
    for (axis, selector) in selectors.iter().enumerate() {
        match selector {
            AxisSelector::Slice(slice) => {
                view.slice_axis_inplace(Axis(axis), to_ndarray_slice(slice));
            }
            AxisSelector::List(positions) if positions.is_empty() => {
                view.slice_axis_inplace(Axis(axis), Slice::new(0, Some(0), 1));
            }
            AxisSelector::List(_) => {}
        }
    }

    let mut gathered: Option<ArrayD<A>> = None;
    for (axis, selector) in selectors.iter().enumerate() {
        if let AxisSelector::List(positions) = selector {
            if positions.is_empty() {
                continue;
            }
            gathered = Some(match gathered {
                Some(array) => array.select(Axis(axis), positions),
                None => view.select(Axis(axis), positions),
            });
        }
    }

    gathered.unwrap_or_else(|| view.to_owned())
}
