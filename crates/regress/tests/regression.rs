use approx::assert_abs_diff_eq;
use cmbs_field::{MaskedGridField, Region};
use cmbs_regress::{
    RegressionConfig, ValidityMode, corr_single, correlate, detrend, detrend_in_place,
    get_valid_data,
};
use ndarray::{ArrayD, IxDyn, arr1, arr2};

fn with_days(field: MaskedGridField) -> MaskedGridField {
    let nt = field.shape()[0];
    field.with_time((0..nt).map(|i| i as f64).collect()).unwrap()
}

#[test]
fn valid_selection_of_point_series() {
    // Three time steps, two points; the first point has one invalid sample.
    let f = with_days(
        MaskedGridField::new(
            arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).into_dyn(),
            arr2(&[[false, false], [true, false], [false, false]]).into_dyn(),
        )
        .unwrap(),
    );

    let all = get_valid_data(&f, ValidityMode::All);
    assert_eq!(all.selection, vec![false, true]);
    assert_eq!(all.data.column(0).to_vec(), vec![2.0, 4.0, 6.0]);

    let one = get_valid_data(&f, ValidityMode::One);
    assert_eq!(one.selection, vec![true, true]);
    assert!(one.data_mask[[1, 0]]);
}

#[test]
fn single_series_regression_recovers_line() {
    let f = with_days(MaskedGridField::from_values(arr2(&[[1.0], [3.0], [5.0]]).into_dyn()).unwrap());
    let res = corr_single(&f, &[0.0, 1.0, 2.0], None, &RegressionConfig::new()).unwrap();
    assert_abs_diff_eq!(res.slope.data()[[0]], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(res.intercept.data()[[0]], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(res.correlation.data()[[0]], 1.0, epsilon = 1e-12);
}

#[test]
fn correlation_is_symmetric() {
    let a = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[8, 2, 2]), |ix| {
            ((ix[0] * 7 + ix[1] * 3 + ix[2]) % 5) as f64
        }))
        .unwrap(),
    );
    let b = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[8, 2, 2]), |ix| {
            ix[0] as f64 + ((ix[0] + ix[2]) % 3) as f64
        }))
        .unwrap(),
    );
    let config = RegressionConfig::new();
    let ab = correlate(&a, &b, &config).unwrap();
    let ba = correlate(&b, &a, &config).unwrap();
    for (x, y) in ab.coefficient.data().iter().zip(ba.coefficient.data()) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
    }
    assert_eq!(ab.coefficient.mask(), ba.coefficient.mask());
}

#[test]
fn serial_and_parallel_agree() {
    let f = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[10, 3, 4]), |ix| {
            (ix[0] as f64).sin() * (ix[1] + 1) as f64 + 0.1 * (ix[0] * ix[2]) as f64
        }))
        .unwrap(),
    );
    let serial = detrend(&f, &RegressionConfig::new().with_parallel(false)).unwrap();
    let parallel = detrend(&f, &RegressionConfig::new()).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn valid_selection_of_cube_keeps_coordinates_aligned() {
    // 3 steps on a 2x3 grid, value = 100 t + 10 y + x.
    let mut mask = ArrayD::from_elem(IxDyn(&[3, 2, 3]), false);
    mask[[1, 0, 0]] = true;
    let mut f = with_days(
        MaskedGridField::new(
            ArrayD::from_shape_fn(IxDyn(&[3, 2, 3]), |ix| {
                (100 * ix[0] + 10 * ix[1] + ix[2]) as f64
            }),
            mask,
        )
        .unwrap()
        .with_coordinates(
            arr1(&[0.0, 10.0]).into_dyn(),
            arr1(&[0.0, 20.0, 40.0]).into_dyn(),
        ),
    );
    let west = Region::lat_lon(1, "west", -10.0, 30.0, -90.0, 90.0).unwrap();
    f.apply_region_mask(&west).unwrap();

    let v = get_valid_data(&f, ValidityMode::All);
    assert_eq!(v.selection, vec![false, true, false, true, true, false]);
    assert_eq!(v.n_selected(), 3);
    assert_eq!(v.lat.unwrap(), vec![0.0, 10.0, 10.0]);
    assert_eq!(v.lon.unwrap(), vec![20.0, 0.0, 20.0]);
    assert_eq!(v.data.column(0).to_vec(), vec![1.0, 101.0, 201.0]);
    assert_eq!(v.data.column(2).to_vec(), vec![11.0, 111.0, 211.0]);
    assert!(v.data_mask.iter().all(|&m| !m));
}

#[test]
fn detrended_cube_has_no_slope_left() {
    let nt = 12;
    let mut f = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[nt, 2, 2]), |ix| {
            let t = ix[0] as f64;
            (1.5 + ix[2] as f64) * t + (t * 0.7).sin() * (ix[1] + 1) as f64
        }))
        .unwrap(),
    );
    let config = RegressionConfig::new();
    let steps: Vec<f64> = (0..nt).map(|t| t as f64).collect();

    let before = corr_single(&f, &steps, None, &config).unwrap();
    assert!(before.slope.data().iter().all(|&s| s > 1.0));

    detrend_in_place(&mut f, &config).unwrap();
    assert!(f.is_detrended());
    let after = corr_single(&f, &steps, None, &config).unwrap();
    assert_eq!(after.slope.n_valid(), 4);
    for s in after.slope.data() {
        assert_abs_diff_eq!(*s, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn significance_masks_cube_coefficients_but_keeps_p_values() {
    let nt = 6;
    let x = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[nt, 1, 2]), |ix| {
            ix[0] as f64
        }))
        .unwrap(),
    );
    // First cell follows x exactly; the second alternates around zero.
    let y = with_days(
        MaskedGridField::from_values(ArrayD::from_shape_fn(IxDyn(&[nt, 1, 2]), |ix| {
            if ix[2] == 0 {
                2.0 * ix[0] as f64 + 1.0
            } else if ix[0] % 2 == 0 {
                1.0
            } else {
                -1.0
            }
        }))
        .unwrap(),
    );

    let res = correlate(&x, &y, &RegressionConfig::new().with_threshold(0.05)).unwrap();
    assert_eq!(res.coefficient.shape(), &[1, 2]);
    assert!(!res.coefficient.mask()[[0, 0]]);
    assert_abs_diff_eq!(res.coefficient.data()[[0, 0]], 1.0, epsilon = 1e-12);
    assert!(res.coefficient.mask()[[0, 1]]);

    assert!(!res.p_value.mask()[[0, 1]]);
    assert!(res.p_value.data()[[0, 1]] > 0.05);
    assert!(res.p_value.data()[[0, 1]] <= 1.0);
}
