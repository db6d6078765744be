use loda::{
    Classification, Loda, LodaConfig, LodaError, ProjectionEnsemble, Threshold,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

fn gaussian_window(rng: &mut StdRng, samples: usize, features: usize) -> Vec<Vec<f64>> {
    (0..samples)
        .map(|_| (0..features).map(|_| rng.sample(StandardNormal)).collect())
        .collect()
}

#[test]
fn rejects_invalid_configuration() {
    let mut rng = StdRng::seed_from_u64(1);
    let window = gaussian_window(&mut rng, 32, 3);

    for (m, q) in [(0, 0.1), (10, -0.1), (10, 1.5), (10, f64::NAN)] {
        let err = Loda::new(m, q, 5, &window).unwrap_err();
        assert!(
            matches!(err, LodaError::InvalidConfiguration(_)),
            "m={m}, q={q}: {err:?}"
        );
    }

    let short = gaussian_window(&mut rng, 1, 3);
    assert!(matches!(
        Loda::new(10, 0.1, 5, &short),
        Err(LodaError::InvalidConfiguration(_))
    ));

    let featureless: Vec<Vec<f64>> = vec![vec![], vec![]];
    assert!(matches!(
        Loda::new(10, 0.1, 5, &featureless),
        Err(LodaError::InvalidConfiguration(_))
    ));

    let ragged = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
    assert_eq!(
        Loda::new(10, 0.1, 5, &ragged).unwrap_err(),
        LodaError::DimensionMismatch {
            expected: 2,
            got: 3
        }
    );
}

#[test]
fn warmup_detector_is_not_fitted() {
    let mut rng = StdRng::seed_from_u64(2);
    for features in 1..6 {
        let window = gaussian_window(&mut rng, 40, features);
        let mut detector = Loda::prepare(LodaConfig::new(20, 0.1, 3), &window).unwrap();

        assert!(!detector.is_fitted());
        assert_eq!(detector.threshold(), Threshold::Uncalibrated);
        for sample in &window {
            assert_eq!(detector.predict(sample), Err(LodaError::NotFitted));
            assert_eq!(detector.score_sample(sample), Err(LodaError::NotFitted));
            assert!(matches!(detector.score_features(sample), Err(LodaError::NotFitted)));
        }

        // the first window of updates completes the first rotation
        for (i, sample) in window.iter().enumerate() {
            assert_eq!(detector.window_position(), i);
            detector.update(sample).unwrap();
        }
        assert!(detector.is_fitted());
        assert_eq!(detector.rotations(), 1);
        assert!(detector.predict(&window[0]).is_ok());
    }
}

#[test]
fn construction_completes_first_rotation() {
    let mut rng = StdRng::seed_from_u64(3);
    let window = gaussian_window(&mut rng, 100, 4);
    let detector = Loda::new(30, 0.1, 8, &window).unwrap();

    assert!(detector.is_fitted());
    assert_eq!(detector.rotations(), 1);
    assert_eq!(detector.window_position(), 0);
    assert_eq!(detector.window_size(), 100);
    assert_eq!(detector.n_features(), 4);
    assert!(detector.threshold().value().is_some());

    // training bank was reset, estimators hold the whole window
    assert!(detector.training_histograms().iter().all(Option::is_none));
    let estimators = detector.estimators().unwrap();
    assert_eq!(estimators.len(), 30);
    for h in estimators {
        assert_eq!(h.total_count(), 100);
    }

    let p = detector.projections();
    assert_eq!(p.len(), 30);
    for row in p.rows() {
        assert_eq!(row.iter().filter(|w| **w != 0.0).count(), 2);
    }
}

#[test]
fn threshold_is_quantile_of_window_scores() {
    let mut rng = StdRng::seed_from_u64(4);
    let window = gaussian_window(&mut rng, 64, 3);
    let mut detector = Loda::prepare(LodaConfig::new(25, 0.2, 17), &window).unwrap();

    let scores: Vec<f64> = window
        .iter()
        .map(|s| detector.update(s).unwrap())
        .collect();
    let expected = loda::stats::quantile(&scores, 0.2).unwrap();
    assert_eq!(detector.threshold(), Threshold::Calibrated(expected));
}

#[test]
fn seeded_detectors_agree() {
    let mut rng = StdRng::seed_from_u64(5);
    let window = gaussian_window(&mut rng, 80, 5);
    let probe = gaussian_window(&mut rng, 10, 5);

    let a = Loda::new(40, 0.1, 99, &window).unwrap();
    let b = Loda::new(40, 0.1, 99, &window).unwrap();
    assert_eq!(a.threshold(), b.threshold());
    assert_eq!(a.bin_widths(), b.bin_widths());
    for x in &probe {
        assert_eq!(a.score_sample(x).unwrap(), b.score_sample(x).unwrap());
    }
}

#[test]
fn rotation_swaps_banks_every_window() {
    let mut rng = StdRng::seed_from_u64(6);
    let window = gaussian_window(&mut rng, 50, 3);
    let mut detector = Loda::new(20, 0.1, 21, &window).unwrap();
    let before = detector.threshold();

    let stream = gaussian_window(&mut rng, 125, 3);
    for (i, x) in stream.iter().enumerate() {
        detector.update(x).unwrap();
        if i < 49 {
            // estimators stay the initial window's until the next boundary
            assert_eq!(detector.threshold(), before);
            assert!(detector.training_histograms().iter().all(Option::is_some));
        }
    }
    assert_eq!(detector.rotations(), 3);
    assert_eq!(detector.window_position(), 25);
    assert_ne!(detector.threshold(), before);
}

#[test]
fn score_matches_mean_log_likelihood() {
    let mut rng = StdRng::seed_from_u64(7);
    let window = gaussian_window(&mut rng, 60, 4);
    let detector = Loda::new(30, 0.1, 13, &window).unwrap();

    let x = &window[7];
    let logs = detector.log_likelihoods(x).unwrap();
    assert_eq!(logs.len(), 30);
    let mean = logs.iter().sum::<f64>() / logs.len() as f64;
    assert!((detector.score_sample(x).unwrap() - mean).abs() < 1e-12);
}

#[test]
fn far_outlier_is_anomalous_and_attributed() {
    let mut rng = StdRng::seed_from_u64(8);
    // two features: every projection uses exactly one of them
    let window = gaussian_window(&mut rng, 256, 2);
    let detector = Loda::new(100, 0.05, 31, &window).unwrap();

    let outlier = [50.0, 0.0];
    assert_eq!(detector.predict(&outlier).unwrap(), Classification::Anomalous);

    let attribution = detector.score_features(&outlier).unwrap();
    assert_eq!(attribution.len(), 2);
    assert!(attribution.degenerate_features().is_empty());
    let ranked = attribution.ranked();
    assert_eq!(ranked[0].0, 0);
    assert!(ranked[0].1 > 0.0);
    assert!(attribution.get(1).unwrap() < 0.0);

    let single = detector.feature_score(&outlier, 0).unwrap();
    assert_eq!(Some(single), attribution.get(0));
}

#[test]
fn feature_used_everywhere_is_degenerate() {
    let mut rng = StdRng::seed_from_u64(9);
    let window = gaussian_window(&mut rng, 64, 2);
    let projections =
        ProjectionEnsemble::from_weights(vec![vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 2.0]])
            .unwrap();
    let detector = Loda::with_projections(LodaConfig::default(), projections, &window).unwrap();
    assert_eq!(detector.config().n_estimators, 3);

    let x = [0.5, -0.5];
    let attribution = detector.score_features(&x).unwrap();
    assert_eq!(attribution.get(1), None);
    assert!(attribution.degenerate_features().contains(&1));
    assert_eq!(
        detector.feature_score(&x, 1),
        Err(LodaError::DegenerateAttribution { feature: 1 })
    );

    let raw = detector.feature_statistics(&x).unwrap();
    assert!(!raw[1].is_finite());
}

#[test]
fn legacy_zero_sentinel_blocks_prediction() {
    // constant window: one unit bin with density 1, so every score is ln(1) = 0
    let window = vec![vec![3.0]; 20];

    let mut config = LodaConfig::new(4, 0.5, 1);
    let detector = Loda::with_config(config.clone(), &window).unwrap();
    assert_eq!(detector.threshold(), Threshold::Calibrated(0.0));
    assert_eq!(detector.predict(&[3.0]), Ok(Classification::Normal));

    config.zero_threshold_is_unfitted = true;
    let legacy = Loda::with_config(config, &window).unwrap();
    assert!(legacy.is_fitted());
    assert_eq!(legacy.predict(&[3.0]), Err(LodaError::NotFitted));
}

#[test]
fn anomaly_rate_on_initial_window_tracks_quantile() {
    let mut rng = StdRng::seed_from_u64(10);
    for q in [0.05, 0.1, 0.25] {
        let samples = 200 + rng.random_range(0..100);
        let features = 3 + rng.random_range(0..5);
        let window = gaussian_window(&mut rng, samples, features);
        let seed = rng.random_range(1..u64::MAX);
        let detector = Loda::new(120, q, seed, &window).unwrap();

        let anomalies = window
            .iter()
            .filter(|x| detector.predict(x).unwrap().is_anomalous())
            .count();
        let rate = anomalies as f64 / samples as f64;
        assert!((rate - q).abs() < 0.15, "q={q}, rate={rate}");
    }
}

#[test]
fn anomaly_rate_on_stream_tracks_quantile() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(12);
    let q = 0.1;
    let window = gaussian_window(&mut rng, 256, 2);
    let mut detector = Loda::new(140, q, 2024, &window).unwrap();

    let stream = gaussian_window(&mut rng, 256 * 8, 2);
    let mut anomalies = 0;
    for x in &stream {
        if detector.predict(x).unwrap().is_anomalous() {
            anomalies += 1;
        }
        detector.update(x).unwrap();
    }
    let rate = anomalies as f64 / stream.len() as f64;
    assert!((rate - q).abs() < 0.15, "rate={rate}");
    assert_eq!(detector.rotations(), 9);
}
