//! Tests for index parsing and outer-indexed subspace extraction

use cf_compressed::{
    errors::{CfArrayError, Result},
    indexing::{extract_subspace, parse_indices, AxisSelector, Index, Indices, SliceSelector},
    masked::MaskedArray,
};
use ndarray::{arr2, ArrayD, IxDyn};

fn grid(rows: usize, cols: usize) -> MaskedArray<i32> {
    let values: Vec<i32> = (0..(rows * cols) as i32).collect();
    MaskedArray::from_data(ArrayD::from_shape_vec(IxDyn(&[rows, cols]), values).unwrap())
}

#[test]
fn test_out_of_range_index_is_rejected() {
    let result = parse_indices(&[5], &Index::Int(10).into());
    match result {
        Err(CfArrayError::InvalidIndex { message }) => {
            assert!(message.contains("10"));
        }
        other => panic!("Expected InvalidIndex error, got {other:?}"),
    }

    assert!(parse_indices(&[5], &Index::Int(-6).into()).is_err());
    assert!(parse_indices(&[5], &Index::List(vec![0, 5]).into()).is_err());
}

#[test]
fn test_negative_positions_count_from_the_end() -> Result<()> {
    let selectors = parse_indices(&[5], &Index::Int(-1).into())?;
    assert_eq!(
        selectors,
        vec![AxisSelector::Slice(SliceSelector {
            start: 4,
            step: 1,
            len: 1
        })]
    );

    let selectors = parse_indices(&[5], &Index::List(vec![-1, 0, -5]).into())?;
    assert_eq!(selectors, vec![AxisSelector::List(vec![4, 0, 0])]);
    Ok(())
}

#[test]
fn test_zero_step_is_rejected() {
    let result = parse_indices(&[5], &Index::slice(None, None, Some(0)).into());
    assert!(matches!(result, Err(CfArrayError::InvalidIndex { .. })));
}

#[test]
fn test_slices_are_clamped_and_normalized() -> Result<()> {
    let parse = |index: Index| parse_indices(&[10], &index.into());

    assert_eq!(
        parse(Index::slice(Some(2), Some(100), Some(3)))?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 2,
            step: 3,
            len: 3
        })]
    );
    assert_eq!(
        parse(Index::slice(Some(-3), None, None))?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 7,
            step: 1,
            len: 3
        })]
    );
    assert_eq!(
        parse(Index::slice(None, None, Some(-1)))?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 9,
            step: -1,
            len: 10
        })]
    );
    assert_eq!(parse(Index::slice(Some(5), Some(2), None))?[0].len(), 0);
    assert_eq!(parse((..4).into())?[0].len(), 4);
    Ok(())
}

#[test]
fn test_extreme_steps_select_within_the_axis() -> Result<()> {
    let parse = |index: Index| parse_indices(&[4], &index.into());

    assert_eq!(
        parse(Index::slice(None, None, Some(isize::MIN)))?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 3,
            step: isize::MIN,
            len: 1
        })]
    );
    assert_eq!(
        parse(Index::slice(None, None, Some(isize::MAX)))?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 0,
            step: isize::MAX,
            len: 1
        })]
    );

    // Clamped to 9 then walking down by 3 until position 0
    assert_eq!(
        parse_indices(&[10], &Index::slice(Some(100), Some(-100), Some(-3)).into())?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 9,
            step: -3,
            len: 4
        })]
    );
    assert_eq!(
        parse_indices(&[10], &Index::slice(Some(-100), Some(100), Some(4)).into())?,
        vec![AxisSelector::Slice(SliceSelector {
            start: 0,
            step: 4,
            len: 3
        })]
    );
    Ok(())
}

#[test]
fn test_extreme_steps_extract_one_cell() -> Result<()> {
    let source = MaskedArray::from_data(ArrayD::from_shape_vec(IxDyn(&[4]), vec![0, 1, 2, 3])?);

    for (step, expected) in [(isize::MIN, 3), (isize::MAX, 0)] {
        let index = Index::slice(None, None, Some(step));
        let subspace = extract_subspace(&source, &parse_indices(&[4], &index.into())?)?;
        assert_eq!(subspace.compressed(), vec![expected]);
    }

    let index = Index::slice(Some(100), Some(-100), Some(-3));
    let subspace = extract_subspace(&source, &parse_indices(&[4], &index.into())?)?;
    assert_eq!(subspace.compressed(), vec![3, 0]);
    Ok(())
}

#[test]
fn test_ellipsis_and_missing_axes_expand_to_full_slices() -> Result<()> {
    let shape = [2, 3, 4];
    let full = |len| AxisSelector::Slice(SliceSelector::full(len));

    let selectors = parse_indices(&shape, &vec![Index::Ellipsis, Index::Int(1)].into())?;
    assert_eq!(selectors[0], full(2));
    assert_eq!(selectors[1], full(3));
    assert_eq!(
        selectors[2],
        AxisSelector::Slice(SliceSelector {
            start: 1,
            step: 1,
            len: 1
        })
    );

    let selectors = parse_indices(&shape, &Index::Int(0).into())?;
    assert_eq!(selectors.len(), 3);
    assert_eq!(selectors[1], full(3));
    assert_eq!(selectors[2], full(4));

    let selectors = parse_indices(&shape, &Indices::All)?;
    assert_eq!(selectors, vec![full(2), full(3), full(4)]);
    Ok(())
}

#[test]
fn test_malformed_expressions_are_rejected() {
    let shape = [2, 3];

    let two_ellipses = vec![Index::Ellipsis, Index::Int(0), Index::Ellipsis];
    assert!(matches!(
        parse_indices(&shape, &two_ellipses.into()),
        Err(CfArrayError::InvalidIndex { .. })
    ));

    let too_many = vec![Index::Int(0), Index::Int(0), Index::Int(0)];
    assert!(matches!(
        parse_indices(&shape, &too_many.into()),
        Err(CfArrayError::InvalidIndex { .. })
    ));

    let short_mask = vec![Index::Mask(vec![true, false])];
    assert!(matches!(
        parse_indices(&[3], &short_mask.into()),
        Err(CfArrayError::InvalidIndex { .. })
    ));
}

#[test]
fn test_boolean_mask_selects_true_positions() -> Result<()> {
    let selectors = parse_indices(&[4], &Index::Mask(vec![true, false, false, true]).into())?;
    assert_eq!(selectors, vec![AxisSelector::List(vec![0, 3])]);
    Ok(())
}

#[test]
fn test_list_selectors_give_cross_product() -> Result<()> {
    let source = grid(4, 4);
    let indices: Indices = vec![Index::List(vec![0, 2]), Index::List(vec![1, 3])].into();
    let selectors = parse_indices(source.shape(), &indices)?;
    let subspace = extract_subspace(&source, &selectors)?;

    // Rows 0 and 2 crossed with columns 1 and 3, not the diagonal [1, 11]
    assert_eq!(subspace.shape(), &[2, 2]);
    assert_eq!(subspace.data(), &arr2(&[[1, 3], [9, 11]]).into_dyn());
    assert_eq!(subspace.masked_count(), 0);
    Ok(())
}

#[test]
fn test_mixed_slice_and_list_selection() -> Result<()> {
    let source = grid(4, 5);
    let indices: Indices = vec![
        Index::slice(None, None, Some(-2)),
        Index::List(vec![4, 0]),
    ]
    .into();
    let subspace = extract_subspace(&source, &parse_indices(source.shape(), &indices)?)?;

    assert_eq!(subspace.data(), &arr2(&[[19, 15], [9, 5]]).into_dyn());
    Ok(())
}

#[test]
fn test_extraction_carries_the_mask() -> Result<()> {
    let data = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    let mask = ArrayD::from_shape_vec(
        IxDyn(&[2, 3]),
        vec![false, true, false, true, false, false],
    )?;
    let source = MaskedArray::from_parts(data, mask)?;

    let indices: Indices = vec![Index::Ellipsis, Index::List(vec![1, 2])].into();
    let subspace = extract_subspace(&source, &parse_indices(source.shape(), &indices)?)?;

    assert_eq!(subspace.shape(), &[2, 2]);
    assert_eq!(subspace.value(&[0, 0]), None);
    assert_eq!(subspace.value(&[0, 1]), Some(3.0));
    assert_eq!(subspace.value(&[1, 0]), Some(5.0));
    assert_eq!(subspace.compressed(), vec![3.0, 5.0, 6.0]);
    Ok(())
}

#[test]
fn test_empty_selections_keep_dimensionality() -> Result<()> {
    let source = grid(3, 3);
    let indices: Indices = vec![Index::List(vec![]), Index::slice(Some(1), Some(1), None)].into();
    let subspace = extract_subspace(&source, &parse_indices(source.shape(), &indices)?)?;
    assert_eq!(subspace.shape(), &[0, 0]);
    Ok(())
}

#[test]
fn test_extractor_rejects_bad_selectors() {
    let source = grid(2, 2);
    let result = extract_subspace(&source, &[AxisSelector::List(vec![0])]);
    assert!(matches!(result, Err(CfArrayError::InvalidIndex { .. })));

    let result = extract_subspace(
        &source,
        &[AxisSelector::List(vec![2]), AxisSelector::List(vec![0])],
    );
    assert!(matches!(result, Err(CfArrayError::InvalidIndex { .. })));
}

#[test]
fn test_extractor_rejects_slices_running_off_the_axis() {
    let source = MaskedArray::from_data(ArrayD::from_shape_vec(IxDyn(&[4]), vec![0, 1, 2, 3]).unwrap());
    let extract = |start, step, len| {
        extract_subspace(
            &source,
            &[AxisSelector::Slice(SliceSelector { start, step, len })],
        )
    };

    // Below position 0
    assert!(matches!(extract(2, -1, 5), Err(CfArrayError::InvalidIndex { .. })));
    // Past the end
    assert!(matches!(extract(2, 1, 3), Err(CfArrayError::InvalidIndex { .. })));
    assert!(matches!(extract(4, -1, 1), Err(CfArrayError::InvalidIndex { .. })));
    // Stride far larger than the axis
    assert!(matches!(
        extract(0, isize::MAX, 3),
        Err(CfArrayError::InvalidIndex { .. })
    ));

    assert_eq!(extract(3, -1, 4).unwrap().compressed(), vec![3, 2, 1, 0]);
    assert_eq!(extract(3, isize::MIN, 1).unwrap().compressed(), vec![3]);
    assert_eq!(extract(9, 1, 0).unwrap().shape(), &[0]);
}

#[test]
fn test_slice_selector_fits() {
    let selector = SliceSelector {
        start: 3,
        step: -2,
        len: 2,
    };
    assert_eq!(selector.last(), Some(1));
    assert!(selector.fits(4));
    assert!(!selector.fits(3));

    let below = SliceSelector { len: 3, ..selector };
    assert_eq!(below.last(), None);
    assert!(!below.fits(10));
    assert!(SliceSelector::full(0).fits(0));
}
