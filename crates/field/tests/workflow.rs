use approx::assert_abs_diff_eq;
use cmbs_field::{AnomalyBase, FieldError, MaskedGridField, ReduceOp, Region};
use ndarray::{ArrayD, IxDyn, arr1, arr2, arr3};

/// Three samples of a 1x2 grid: [[1,2],[3,4],[5,6]].
fn three_step_cube() -> MaskedGridField {
    let data = arr3(&[[[1.0, 2.0]], [[3.0, 4.0]], [[5.0, 6.0]]]).into_dyn();
    MaskedGridField::from_values(data)
        .unwrap()
        .with_time(vec![0.0, 1.0, 2.0])
        .unwrap()
        .with_time_cycle(1)
        .with_coordinates(arr1(&[10.0]).into_dyn(), arr1(&[0.0, 90.0]).into_dyn())
        .with_label("t2m")
}

#[test]
fn climatology_and_anomaly_of_constant_cycle() {
    let f = three_step_cube();

    let clim = f.climatology().unwrap();
    assert_eq!(clim.shape(), &[1, 1, 2]);
    assert_eq!(clim.data(), &arr3(&[[[3.0, 4.0]]]).into_dyn());
    assert_eq!(clim.label(), "t2m climatology");

    let tiled = f.climatology_tiled().unwrap();
    assert_eq!(
        tiled.data(),
        &arr3(&[[[3.0, 4.0]], [[3.0, 4.0]], [[3.0, 4.0]]]).into_dyn()
    );

    let anomaly = f.deseasonalized_anomaly(AnomalyBase::Current).unwrap();
    assert_eq!(
        anomaly.data(),
        &arr3(&[[[-2.0, -2.0]], [[0.0, 0.0]], [[2.0, 2.0]]]).into_dyn()
    );
    assert_eq!(anomaly.time(), f.time());
}

#[test]
fn anomaly_plus_climatology_recomposes_field() {
    let data = ArrayD::from_shape_fn(IxDyn(&[24, 2, 3]), |ix| {
        (ix[0] % 12) as f64 * 1.5 + ix[1] as f64 - 0.25 * ix[2] as f64 + (ix[0] / 12) as f64
    });
    let mut mask = ArrayD::from_elem(IxDyn(&[24, 2, 3]), false);
    mask[[5, 1, 1]] = true;
    let f = MaskedGridField::new(data, mask)
        .unwrap()
        .with_time((0..24).map(|i| f64::from(i) * 30.0).collect())
        .unwrap()
        .with_time_cycle(12);

    let anomaly = f.deseasonalized_anomaly(AnomalyBase::Current).unwrap();
    let recomposed = anomaly.add(&f.climatology_tiled().unwrap()).unwrap();
    for ((r, o), &m) in recomposed.data().iter().zip(f.data()).zip(f.mask()) {
        if !m {
            assert_abs_diff_eq!(*r, *o, epsilon = 1e-12);
        }
    }
    assert!(recomposed.mask()[[5, 1, 1]]);
}

#[test]
fn clone_shares_nothing() {
    let mut original = three_step_cube();
    original.cache_climatology().unwrap();
    let mut copy = original.clone();

    copy.data_mut()[[0, 0, 0]] = 100.0;
    copy.mask_mut()[[1, 0, 1]] = true;
    copy.set_label("changed");
    copy.apply_mask(&arr2(&[[false, true]]).into_dyn(), true)
        .unwrap();

    assert_eq!(original.data()[[0, 0, 0]], 1.0);
    assert!(!original.mask()[[1, 0, 1]]);
    assert_eq!(original.label(), "t2m");
    assert!(!original.climatology_raw().unwrap().mask()[[0, 0, 0]]);
    assert!(copy.climatology_raw().unwrap().mask()[[0, 0, 0]]);
}

#[test]
fn arithmetic_mask_is_union_of_operands() {
    let a = MaskedGridField::new(
        arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn(),
        arr2(&[[true, false], [false, false]]).into_dyn(),
    )
    .unwrap();
    let b = MaskedGridField::new(
        arr2(&[[1.0, 0.0], [1.0, 1.0]]).into_dyn(),
        arr2(&[[false, false], [false, true]]).into_dyn(),
    )
    .unwrap();

    let q = a.div(&b).unwrap();
    // Union of both masks plus the division by zero.
    assert_eq!(
        q.mask(),
        &arr2(&[[true, true], [false, true]]).into_dyn()
    );
    assert_eq!(q.data()[[1, 0]], 3.0);
}

#[test]
fn full_range_subset_is_identity() {
    let f = three_step_cube();
    let s = f.subset_time(Some(0.0), Some(2.0)).unwrap();
    assert_eq!(s, f);

    let r = Region::index(1, "all", 0, 2, 0, 1).unwrap();
    let sub = f.region_subset(&r).unwrap();
    assert_eq!(sub.data(), f.data());
    assert_eq!(sub.mask(), f.mask());
}

#[test]
fn cached_climatology_survives_subsetting() {
    let mut f = three_step_cube();
    f.cache_climatology().unwrap();
    let last = f.subset_time(Some(2.0), Some(2.0)).unwrap();
    let anomaly = last.deseasonalized_anomaly(AnomalyBase::All).unwrap();
    assert_eq!(anomaly.data(), &arr3(&[[[2.0, 2.0]]]).into_dyn());
}

#[test]
fn region_mask_then_field_mean() {
    let mut f = three_step_cube().with_lon_convention(cmbs_field::LonConvention::PlusMinus180);
    let east = Region::lat_lon(2, "east", 45.0, 135.0, -90.0, 90.0).unwrap();
    f.apply_region_mask(&east).unwrap();

    let series = f.fldmean().unwrap();
    assert_eq!(series.data(), &arr1(&[2.0, 4.0, 6.0]).into_dyn());

    let weights = arr2(&[[1.0, 1.0]]).into_dyn();
    let summed = f.weighted_reduce(&weights, ReduceOp::Sum).unwrap();
    assert_eq!(summed.data(), &arr1(&[2.0, 4.0, 6.0]).into_dyn());
}

#[test]
fn errors_are_reported_not_panicked() {
    let f = three_step_cube();
    assert_eq!(
        f.deseasonalized_anomaly(AnomalyBase::All),
        Err(FieldError::MissingClimatology)
    );
    let other = MaskedGridField::from_values(arr2(&[[1.0, 2.0, 3.0]]).into_dyn()).unwrap();
    assert!(matches!(
        f.add(&other),
        Err(FieldError::DimensionMismatch { .. })
    ));
}
