use rstest::rstest;
use scoreforge_core::consts::{MAX_RATING, NEUTRAL_RATING};
use scoreforge_core::relativize::{Method, Relativizer};
use scoreforge_core::stats::Population;
use scoreforge_core::{Direction, EngineError};

mod common;
use common::close;

#[rstest]
#[case(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0], 2.0, 10, 4.583333333333333)]
#[case(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0], 1.0, 10, 3.3333333333333335)]
#[case(&[2.0, 2.0, 2.0, 2.0, 12.0], 2.0, 2, 1.875)]
#[case(&[2.0, 2.0, 2.0, 2.0, 12.0], 12.0, 2, 5.0)]
#[case(&[4.0, 9.0], 4.0, 10, 1.25)]
#[case(&[4.0, 9.0], 9.0, 10, 3.75)]
fn test_worked_examples(
    #[case] values: &[f64],
    #[case] v: f64,
    #[case] min_distinct: usize,
    #[case] expected: f64,
) {
    let population = Population::from_values(values);
    let rating = Relativizer::new(min_distinct)
        .relativize("X", v, &population, Direction::Greater)
        .unwrap();
    assert!(close(rating, expected), "got {} expected {}", rating, expected);
}

#[rstest]
#[case(Method::Percentile)]
#[case(Method::Sigma)]
fn test_direction_law(#[case] method: Method) {
    let population = Population::from_values(&[1.0, 3.0, 3.0, 8.0, 13.0, 21.0]);
    let r = Relativizer::new(10);
    for v in [-4.0, 1.0, 3.0, 5.5, 21.0, 40.0] {
        let greater = r
            .relativize_with(method, "X", v, &population, Direction::Greater)
            .unwrap();
        let lower = r
            .relativize_with(method, "X", v, &population, Direction::Lower)
            .unwrap();
        assert!(close(lower, MAX_RATING - greater));
        assert!((0.0..=MAX_RATING).contains(&greater));
    }
}

#[rstest]
#[case(Method::Percentile, Direction::Greater)]
#[case(Method::Percentile, Direction::Lower)]
#[case(Method::Sigma, Direction::Greater)]
#[case(Method::Sigma, Direction::Lower)]
fn test_single_valued_population_is_neutral(#[case] method: Method, #[case] direction: Direction) {
    let population = Population::from_values(&[42.0; 7]);
    let r = Relativizer::new(10);
    for v in [0.0, 42.0, 1e6] {
        assert_eq!(
            r.relativize_with(method, "X", v, &population, direction).unwrap(),
            NEUTRAL_RATING
        );
    }
}

#[rstest]
#[case(9, Method::Percentile)]
#[case(10, Method::Sigma)]
#[case(11, Method::Sigma)]
fn test_threshold_boundary(#[case] distinct: usize, #[case] expected: Method) {
    let values: Vec<f64> = (0..distinct).map(|i| i as f64).collect();
    let population = Population::from_values(&values);
    assert_eq!(Relativizer::new(10).method_for(&population), expected);
}

#[test]
fn test_empty_population_is_a_resolution_failure() {
    let err = Relativizer::new(10)
        .relativize("WEIGHT", 1.0, &Population::default(), Direction::Greater)
        .unwrap_err();
    assert!(matches!(err, EngineError::ValueResolution { .. }));
}
