use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution as _, Normal};

use eva_pipeline::app::pipeline::run_analysis;
use eva_pipeline::domain::{
    AnalysisConfig, Distribution, DurationArg, EmptyBlockPolicy, ExtractionParams, ExtremesType,
    ModelConfig, PlotKind, ReturnPeriods, Signal,
};
use eva_pipeline::{ErrorKind, Eva};

fn day_zero() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily standard-normal noise from 1900-01-01 through 2000-12-31.
fn century_daily(seed: u64) -> Signal {
    let end = NaiveDate::from_ymd_opt(2000, 12, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let days = (end - day_zero()).num_days();
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let observations = (0..=days)
        .map(|i| (day_zero() + Duration::days(i), Some(noise.sample(&mut rng))))
        .collect();
    Signal::new("noise", observations).unwrap()
}

fn annual_maxima(extremes_type: ExtremesType) -> Eva {
    let mut eva = Eva::new(century_daily(11));
    eva.get_extremes(
        extremes_type,
        ExtractionParams::block_maxima("1Y").with_errors(EmptyBlockPolicy::Ignore),
    )
    .unwrap();
    eva
}

fn quick_mle() -> ModelConfig {
    ModelConfig::PointEstimate {
        bootstrap_samples: 30,
        seed: 5,
    }
}

#[test]
fn century_of_daily_data_block_maxima() {
    let mut eva = annual_maxima(ExtremesType::High);
    let n = eva.extremes().unwrap().len();
    assert!(n <= 101, "at most one extreme per year, got {n}");
    assert!(n >= 100, "expected a full century of annual maxima, got {n}");

    eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();
    assert_eq!(eva.model().unwrap().distribution(), &Distribution::GumbelR);

    let err = eva
        .fit_model(ModelConfig::mle(), Distribution::GenPareto)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compatibility);
    // The Gumbel fit survives the rejected request.
    assert_eq!(eva.model().unwrap().distribution(), &Distribution::GumbelR);
}

#[test]
fn annual_blocks_give_reciprocal_probabilities() {
    let mut eva = annual_maxima(ExtremesType::High);
    eva.fit_model(quick_mle(), Distribution::GumbelR).unwrap();

    let values = eva.get_return_value([10.0, 50.0, 100.0], "1Y", None).unwrap();
    assert_eq!(values.exceedance_probabilities, vec![0.1, 0.02, 0.01]);
    assert!(values.lower.is_none() && values.upper.is_none());
    assert!(values.estimate.windows(2).all(|w| w[0] < w[1]));
    // Annual maxima of 365 standard normals sit near 2.8.
    assert!(values.estimate[0] > 2.0 && values.estimate[0] < 5.0);
}

#[test]
fn return_values_keep_request_shape() {
    let mut eva = annual_maxima(ExtremesType::High);
    eva.fit_model(quick_mle(), Distribution::GenExtreme).unwrap();

    let single = eva.get_return_value(100.0, "1Y", Some(0.9)).unwrap();
    assert!(single.is_scalar());
    let (estimate, lower, upper) = single.as_scalar().unwrap();
    let (lower, upper) = (lower.unwrap(), upper.unwrap());
    assert!(estimate.is_finite());
    assert!(lower <= upper);

    let many = eva
        .get_return_value(ReturnPeriods::Many(vec![5.0, 2.0, 20.0]), "1Y", Some(0.9))
        .unwrap();
    assert!(!many.is_scalar());
    assert!(many.as_scalar().is_none());
    assert_eq!(many.return_periods, vec![5.0, 2.0, 20.0]);
    assert_eq!(many.estimate.len(), 3);
    assert_eq!(many.lower.as_ref().unwrap().len(), 3);

    let summary = eva.get_summary([5.0, 2.0, 20.0], "1Y", None).unwrap();
    let periods: Vec<f64> = summary.rows.iter().map(|r| r.return_period).collect();
    assert_eq!(periods, vec![5.0, 2.0, 20.0]);
}

#[test]
fn low_extremes_map_back_to_signal_scale() {
    let mut eva = annual_maxima(ExtremesType::Low);
    eva.fit_model(quick_mle(), Distribution::GumbelR).unwrap();

    let values = eva.get_return_value([10.0, 100.0], "1Y", Some(0.9)).unwrap();
    // Rarer minima are lower.
    assert!(values.estimate[1] < values.estimate[0]);
    assert!(values.estimate[0] < -2.0);
    let lower = values.lower.unwrap();
    let upper = values.upper.unwrap();
    for i in 0..2 {
        assert!(lower[i] <= upper[i]);
    }
}

#[test]
fn peaks_over_threshold_with_pareto_tail() {
    let mut eva = Eva::new(century_daily(23));
    eva.get_extremes(
        ExtremesType::High,
        ExtractionParams::peaks_over_threshold(2.0).with_window("72H"),
    )
    .unwrap();
    let extremes = eva.extremes().unwrap();
    assert!(extremes.len() > 100);
    assert!(extremes.values().iter().all(|&v| v > 2.0));

    eva.fit_model(quick_mle(), Distribution::GenPareto).unwrap();
    assert_eq!(eva.model().unwrap().params().loc, 2.0);

    let values = eva.get_return_value([1.0, 10.0, 100.0], "1Y", None).unwrap();
    assert!(values.estimate.iter().all(|&v| v > 2.0));
    assert!(values.estimate.windows(2).all(|w| w[0] < w[1]));

    let err = eva
        .fit_model(ModelConfig::mle(), Distribution::GumbelR)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compatibility);
}

#[test]
fn posterior_sampling_end_to_end() {
    let mut eva = annual_maxima(ExtremesType::High);
    let config = ModelConfig::PosteriorSample {
        walkers: 10,
        samples: 300,
        burn_in: 100,
        seed: 3,
    };
    eva.fit_model(config.clone(), Distribution::GumbelR).unwrap();
    assert_eq!(eva.model_config(), Some(&config));
    assert_eq!(eva.model().unwrap().name(), "Emcee");

    let values = eva.get_return_value(50.0, "1Y", Some(0.95)).unwrap();
    let (estimate, lower, upper) = values.as_scalar().unwrap();
    assert!(estimate.is_finite());
    assert!(lower.unwrap() <= upper.unwrap());

    let description = eva.to_string();
    assert!(description.contains("Walkers"));
}

#[test]
fn diagnostics_need_a_model() {
    let eva = annual_maxima(ExtremesType::High);
    let err = eva.probability_plot_data(PlotKind::PP, "1Y", Default::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let err = "ZZ".parse::<PlotKind>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert!(err.to_string().contains("PP, QQ"));
}

#[test]
fn probability_plot_pairs_every_extreme() {
    let mut eva = annual_maxima(ExtremesType::High);
    eva.fit_model(quick_mle(), Distribution::GumbelR).unwrap();
    let n = eva.extremes().unwrap().len();

    let pp = eva.probability_plot_data(PlotKind::PP, "1Y", Default::default()).unwrap();
    assert_eq!(pp.observed.len(), n);
    assert!(pp.theoretical.iter().all(|&p| (0.0..=1.0).contains(&p)));

    let qq = eva.probability_plot_data(PlotKind::QQ, "1Y", Default::default()).unwrap();
    assert_eq!(qq.theoretical.len(), n);
}

#[test]
fn messy_input_is_cleaned() {
    let t = |d: i64| day_zero() + Duration::days(d);
    let signal = Signal::new(
        "messy",
        vec![
            (t(3), Some(3.0)),
            (t(1), Some(1.0)),
            (t(2), None),
            (t(1), Some(9.0)),
            (t(4), Some(f64::NAN)),
            (t(0), Some(0.5)),
        ],
    )
    .unwrap();
    assert_eq!(signal.timestamps(), &[t(0), t(1), t(3)]);
    assert_eq!(signal.values(), &[0.5, 1.0, 3.0]);
    assert!(signal.timestamps().windows(2).all(|w| w[0] < w[1]));
    assert!(signal.values().iter().all(|v| v.is_finite()));

    let err = Signal::new("empty", vec![(t(0), None)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn csv_run_matches_library_calls() {
    let path = std::env::temp_dir().join(format!("eva-pipeline-{}.csv", std::process::id()));
    let signal = century_daily(31);
    let mut csv = String::from("date,flow\n");
    for (ts, v) in signal.iter() {
        csv.push_str(&format!("{},{v}\n", ts.format("%Y-%m-%d")));
    }
    std::fs::write(&path, csv).unwrap();

    let config = AnalysisConfig {
        input: path.clone(),
        label: None,
        extremes_type: ExtremesType::High,
        extraction: ExtractionParams::block_maxima("1Y").with_errors(EmptyBlockPolicy::Ignore),
        model: ModelConfig::mle(),
        distribution: Distribution::GumbelR,
        return_periods: ReturnPeriods::Many(vec![10.0, 100.0]),
        return_period_size: DurationArg::from("1Y"),
        alpha: None,
        export: None,
    };
    let run = run_analysis(&config).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(run.rows_read, signal.len());
    assert_eq!(run.eva.signal().name(), "flow");

    let mut direct = Eva::new(signal);
    direct
        .get_extremes(ExtremesType::High, config.extraction.clone())
        .unwrap();
    assert_eq!(
        run.eva.extremes().unwrap().values(),
        direct.extremes().unwrap().values()
    );

    let table = run.eva.get_summary([10.0, 100.0], "1Y", None).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert!(table.rows[0].return_value < table.rows[1].return_value);
}
