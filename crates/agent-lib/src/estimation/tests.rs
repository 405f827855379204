//! Behavioural tests for the estimation engine
//!
//! Cover the linear power model, the carbon conversion scale and the
//! fallback paths for unknown classes and regions.

use super::*;
use crate::models::UtilizationSample;

const EPSILON: f64 = 1e-12;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

const CLASSES: &[&str] = &[
    "t2.micro",
    "t2.small",
    "t2.medium",
    "t3.micro",
    "t3.small",
    "t3.medium",
    "m5.large",
    "",
];

mod energy_model {
    use super::*;

    #[test]
    fn test_idle_equals_base_power() {
        let engine = EstimationEngine::new();
        for class in CLASSES {
            let profile = engine.power_profiles().resolve(class);
            assert!(approx_eq(engine.estimate_energy(0.0, class), profile.base_watts));
        }
    }

    #[test]
    fn test_full_load_equals_max_power() {
        let engine = EstimationEngine::new();
        for class in CLASSES {
            let profile = engine.power_profiles().resolve(class);
            assert!(approx_eq(
                engine.estimate_energy(100.0, class),
                profile.base_watts * profile.scale_multiplier
            ));
        }
    }

    #[test]
    fn test_monotonic_in_utilization() {
        let engine = EstimationEngine::new();
        for class in CLASSES {
            let mut previous = f64::NEG_INFINITY;
            for step in 0..=400 {
                let cpu = step as f64 * 0.25;
                let energy = engine.estimate_energy(cpu, class);
                assert!(energy >= previous, "{class} not monotone at {cpu}");
                previous = energy;
            }
        }
    }

    #[test]
    fn test_half_load_t3_medium() {
        let engine = EstimationEngine::new();
        assert!(approx_eq(engine.estimate_energy(50.0, "t3.medium"), 14.0));
    }

    #[test]
    fn test_unknown_class_uses_fallback_profile() {
        let engine = EstimationEngine::new();
        assert!(approx_eq(engine.estimate_energy(0.0, "c7g.metal"), 5.0));
        assert!(approx_eq(engine.estimate_energy(100.0, "c7g.metal"), 12.5));
    }

    #[test]
    fn test_out_of_range_utilization_is_clamped() {
        let engine = EstimationEngine::new();
        assert!(approx_eq(engine.estimate_energy(-20.0, "t3.medium"), 8.0));
        assert!(approx_eq(engine.estimate_energy(250.0, "t3.medium"), 20.0));
        assert!(approx_eq(engine.estimate_energy(f64::NAN, "t3.medium"), 8.0));
    }

    #[test]
    fn test_empty_tables_use_fallback_only() {
        let engine =
            EstimationEngine::with_tables(PowerProfileTable::empty(), CarbonFactorTable::empty());
        assert!(approx_eq(engine.estimate_energy(50.0, "t3.medium"), 8.75));
        assert!(approx_eq(
            engine.estimate_carbon(1_000_000.0, "us-east-1"),
            FALLBACK_CARBON_FACTOR
        ));
    }
}

mod carbon_model {
    use super::*;

    #[test]
    fn test_us_east_scale() {
        let engine = EstimationEngine::new();
        let carbon = engine.estimate_carbon(14.0, "us-east-1");
        assert!((carbon - 0.0056).abs() < 1e-12, "got {carbon}");
    }

    #[test]
    fn test_non_negative_for_non_negative_energy() {
        let engine = EstimationEngine::new();
        for region in ["us-east-1", "eu-west-1", "ap-southeast-1", "nowhere"] {
            for energy in [0.0, 0.5, 14.0, 200.0, 1e9] {
                assert!(engine.estimate_carbon(energy, region) >= 0.0);
            }
        }
    }

    #[test]
    fn test_linear_in_energy() {
        let engine = EstimationEngine::new();
        for region in ["us-east-1", "eu-west-1", "nowhere"] {
            for energy in [1.0, 7.25, 12.5, 300.0] {
                let single = engine.estimate_carbon(energy, region);
                let double = engine.estimate_carbon(energy * 2.0, region);
                assert!((double - 2.0 * single).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_unknown_region_uses_fallback_factor() {
        let engine = EstimationEngine::new();
        let carbon = engine.estimate_carbon(1_000_000.0, "mars-north-1");
        assert!(approx_eq(carbon, 500.0));
    }
}

mod composed {
    use super::*;

    #[test]
    fn test_estimate_echoes_input() {
        let engine = EstimationEngine::new();
        let sample = UtilizationSample::new("i-abc", "t3.medium", "us-east-1", 50.0)
            .with_memory(40.0)
            .with_timestamp(1_700_000_000);

        let result = engine.estimate(&sample);

        assert_eq!(result.instance_id, "i-abc");
        assert_eq!(result.instance_class, "t3.medium");
        assert_eq!(result.region, "us-east-1");
        assert_eq!(result.cpu_utilization, 50.0);
        assert_eq!(result.memory_utilization, 40.0);
        assert_eq!(result.timestamp, 1_700_000_000);
        assert!(approx_eq(result.energy_consumption_watts, 14.0));
        assert!((result.carbon_footprint_kg - 0.0056).abs() < 1e-12);
    }

    #[test]
    fn test_select_best_over_results() {
        let engine = EstimationEngine::new();
        let samples = vec![
            UtilizationSample::new("busy", "t3.medium", "us-east-1", 90.0),
            UtilizationSample::new("idle", "t3.medium", "us-east-1", 5.0),
            UtilizationSample::new("small", "t3.micro", "eu-west-1", 80.0),
        ];
        let results = engine.estimate_all(&samples);

        // t3.micro at 80% draws 2 + 3 * 0.8 = 4.4W, below idle t3.medium
        let best = engine.select_best(&results).unwrap();
        assert_eq!(best.instance_id, "small");
    }

    #[test]
    fn test_select_best_with_repeated_ids_keeps_scanned_entry() {
        let engine = EstimationEngine::new();
        let samples = vec![
            UtilizationSample::new("i-1", "t3.medium", "us-east-1", 80.0),
            UtilizationSample::new("i-1", "t3.medium", "us-east-1", 10.0),
        ];
        let results = engine.estimate_all(&samples);

        let best = engine.select_best(&results).unwrap();
        assert_eq!(best.cpu_utilization, 10.0);
    }

    #[test]
    fn test_select_best_empty() {
        let engine = EstimationEngine::new();
        assert_eq!(engine.select_best(&[]), Err(NoCandidatesError));
    }

    #[test]
    fn test_sustainability_lookup() {
        let engine = EstimationEngine::new();

        let eu = engine.sustainability("eu-west-1");
        assert_eq!(eu.renewable_percentage, 60.0);
        assert_eq!(eu.carbon_intensity, 200.0);

        let unknown = engine.sustainability("af-south-1");
        assert_eq!(unknown.region, "af-south-1");
        assert_eq!(unknown.renewable_percentage, FALLBACK_RENEWABLE_PERCENTAGE);
        assert_eq!(unknown.carbon_intensity, FALLBACK_CARBON_FACTOR);
    }
}
