//! Parallel sweeps over many configurations.
//!
//! Each configuration is an independent run; results keep input order.

use rayon::prelude::*;
use tracing::debug;

use a51_slide::config::SimulationConfig;
use a51_slide::domain::Keystream;
use a51_slide::error::ConfigError;
use a51_slide::hashing::canonical_hash;
use a51_slide::simulate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepResult {
    pub config: SimulationConfig,
    pub keystream: Keystream,
    pub hash: String,
}

/// Run every configuration on the rayon pool.
///
/// One bad configuration yields an `Err` in its slot and does not abort
/// the others.
pub fn run_sweep(configs: &[SimulationConfig]) -> Vec<Result<SweepResult, ConfigError>> {
    let results: Vec<_> = configs
        .par_iter()
        .map(|config| -> Result<SweepResult, ConfigError> {
            let output = simulate(config)?;
            Ok(SweepResult {
                config: config.clone(),
                hash: canonical_hash(&output),
                keystream: output.keystream,
            })
        })
        .collect();
    debug!(
        runs = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        "sweep complete"
    );
    results
}

/// Cartesian product of keys × frames, all with the same cycle counts.
pub fn grid(keys: &[u64], frames: &[u64], warmup_cycles: i64, keystream_bits: i64) -> Vec<SimulationConfig> {
    keys.iter()
        .flat_map(|&key| {
            frames
                .iter()
                .map(move |&frame| SimulationConfig::new(key, frame, warmup_cycles, keystream_bits))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_grid_order() {
        let configs = grid(&[1, 2], &[10, 20, 30], 4, 8);
        let pairs: Vec<(u64, u64)> = configs.iter().map(|c| (c.key, c.frame)).collect();
        assert_eq!(pairs, vec![(1, 10), (1, 20), (1, 30), (2, 10), (2, 20), (2, 30)]);
        assert!(configs.iter().all(|c| c.warmup_cycles == 4 && c.keystream_bits == 8));
    }

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let configs = grid(&[0xBEEF, 0x1234, 0xFFFF], &[0x00, 0x3A, 0xFF], 10, 16);
        let results = run_sweep(&configs);
        assert_eq!(results.len(), configs.len());
        for (config, result) in configs.iter().zip(&results) {
            let expected = simulate(config).unwrap();
            let result = result.as_ref().unwrap();
            assert_eq!(&result.config, config);
            assert_eq!(result.keystream, expected.keystream);
            assert_eq!(result.hash, canonical_hash(&expected));
        }
    }

    #[rstest]
    #[case(SimulationConfig::new(0x1_0000, 0, 0, 0))]
    #[case(SimulationConfig::new(0, 0x100, 0, 0))]
    #[case(SimulationConfig::new(0, 0, -1, 0))]
    fn test_bad_config_isolated(#[case] bad: SimulationConfig) {
        let configs = vec![SimulationConfig::default(), bad, SimulationConfig::default()];
        let results = run_sweep(&configs);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[0], results[2]);
        assert_eq!(results[0].as_ref().unwrap().keystream.to_string(), "10011000");
    }
}
