use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use price_forecast::metrics::ForecastAccuracy;
use price_forecast::{percent_change, PercentChange, ReconciledRow};
use rstest::rstest;

fn rows(actual: &[Option<f64>], predicted: &[f64]) -> Vec<ReconciledRow> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    actual
        .iter()
        .zip(predicted)
        .enumerate()
        .map(|(i, (&actual, &predicted))| ReconciledRow {
            timestamp: start + Duration::days(i as i64),
            actual,
            predicted,
            lower_bound: predicted - 2.5,
            upper_bound: predicted + 2.5,
        })
        .collect()
}

#[test]
fn test_accuracy_metrics() {
    let rows = rows(
        &[Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)],
        &[12.0, 18.0, 33.0, 37.0, 52.0],
    );

    let accuracy = ForecastAccuracy::from_rows(&rows).unwrap();

    assert_eq!(accuracy.samples, 5);
    assert_abs_diff_eq!(accuracy.mae, 2.4, epsilon = 1e-9);
    assert_abs_diff_eq!(accuracy.rmse, 6.0f64.sqrt(), epsilon = 1e-9);
    // |2/10| + |2/20| + |3/30| + |3/40| + |2/50|, averaged
    assert_abs_diff_eq!(accuracy.mape.unwrap(), 10.3, epsilon = 1e-9);
    assert_abs_diff_eq!(accuracy.coverage, 0.6, epsilon = 1e-9);
}

#[test]
fn test_accuracy_ignores_future_rows() {
    let rows = rows(&[Some(10.0), None, None], &[11.0, 12.0, 13.0]);

    let accuracy = ForecastAccuracy::from_rows(&rows).unwrap();

    assert_eq!(accuracy.samples, 1);
    assert_abs_diff_eq!(accuracy.mae, 1.0, epsilon = 1e-9);
}

#[test]
fn test_accuracy_without_observations() {
    let rows = rows(&[None, None], &[1.0, 2.0]);
    assert!(ForecastAccuracy::from_rows(&rows).is_none());
}

#[test]
fn test_mape_undefined_for_zero_actuals() {
    let rows = rows(&[Some(0.0), Some(0.0)], &[1.0, -1.0]);

    let accuracy = ForecastAccuracy::from_rows(&rows).unwrap();

    assert!(accuracy.mape.is_none());
    assert!(accuracy.to_string().contains("MAPE:     undefined"));
}

#[rstest]
#[case(100.0, 105.0, Some(5.0))]
#[case(200.0, 150.0, Some(-25.0))]
#[case(0.0, 10.0, None)]
#[case(f64::NAN, 10.0, None)]
#[case(10.0, f64::INFINITY, None)]
#[case(1e-300, 1e10, None)]
fn test_percent_change(#[case] actual: f64, #[case] predicted: f64, #[case] expected: Option<f64>) {
    let change = percent_change(actual, predicted);
    match expected {
        Some(value) => assert_abs_diff_eq!(change.value().unwrap(), value, epsilon = 1e-9),
        None => assert_eq!(change, PercentChange::Undefined),
    }
}

#[test]
fn test_percent_change_display() {
    assert_eq!(percent_change(100.0, 105.0).to_string(), "5.00%");
    assert_eq!(percent_change(0.0, 105.0).to_string(), "undefined");
}
