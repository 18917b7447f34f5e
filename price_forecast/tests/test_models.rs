use approx::assert_relative_eq;
use chrono::{Datelike, Duration, NaiveDate};
use price_forecast::horizon::daily_axis;
use price_forecast::models::{
    AdditiveModel, ExponentialSmoothing, FittedModel, ForecastModel, ModelKind,
};
use price_forecast::{ModelError, PreparedPoint, PreparedSeries, PriceField};
use rstest::rstest;

fn trading_days(days: i64) -> PreparedSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let points = (0..days)
        .map(|i| start + Duration::days(i))
        .filter(|d| d.weekday().number_from_monday() <= 5)
        .enumerate()
        .map(|(i, d)| PreparedPoint::new(d, 150.0 + 0.2 * i as f64 + (i % 3) as f64))
        .collect();
    PreparedSeries::new("TEST", PriceField::Close, points).unwrap()
}

#[rstest]
#[case("additive", ModelKind::Additive)]
#[case("Prophet", ModelKind::Additive)]
#[case("exponential-smoothing", ModelKind::ExponentialSmoothing)]
#[case("ses", ModelKind::ExponentialSmoothing)]
fn test_model_kind_parsing(#[case] label: &str, #[case] expected: ModelKind) {
    assert_eq!(label.parse::<ModelKind>().unwrap(), expected);
}

#[test]
fn test_unknown_model_kind() {
    assert!("arima".parse::<ModelKind>().is_err());
}

#[test]
fn test_additive_band_contains_prediction_and_widens() {
    let series = trading_days(120);
    let fitted = AdditiveModel::new().fit(&series).unwrap();
    let last = series.last_date();
    let axis = daily_axis(series.first_date(), last + Duration::days(90));

    let points = fitted.predict(&axis).unwrap();

    assert_eq!(points.len(), axis.len());
    for p in &points {
        assert!(p.lower_bound <= p.predicted && p.predicted <= p.upper_bound);
    }
    let width = |d: NaiveDate| {
        let p = points.iter().find(|p| p.timestamp == d).unwrap();
        p.upper_bound - p.lower_bound
    };
    assert!(width(last + Duration::days(90)) > width(last));
}

#[test]
fn test_additive_predicts_weekend_dates() {
    let series = trading_days(30);
    let fitted = AdditiveModel::new().fit(&series).unwrap();

    // 2022-01-08 is a Saturday with no observation
    let saturday = NaiveDate::from_ymd_opt(2022, 1, 8).unwrap();
    let points = fitted.predict(&[saturday]).unwrap();

    assert_eq!(points[0].timestamp, saturday);
    assert!(points[0].predicted.is_finite());
}

#[test]
fn test_exponential_smoothing_is_flat_past_history() {
    let series = trading_days(40);
    let fitted = ExponentialSmoothing::new(0.3).unwrap().fit(&series).unwrap();
    let last = series.last_date();

    let points = fitted
        .predict(&[last + Duration::days(1), last + Duration::days(30)])
        .unwrap();

    assert_relative_eq!(points[0].predicted, fitted.level(), epsilon = 1e-9);
    assert_relative_eq!(points[1].predicted, fitted.level(), epsilon = 1e-9);
    let near = points[0].upper_bound - points[0].lower_bound;
    let far = points[1].upper_bound - points[1].lower_bound;
    assert!(far > near);
    assert!(fitted.decompose(&[last]).unwrap().is_none());
}

#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        ExponentialSmoothing::new(1.5),
        Err(ModelError::InvalidParameter(_))
    ));
    assert!(AdditiveModel::new().with_interval_width(0.0).is_err());
}
