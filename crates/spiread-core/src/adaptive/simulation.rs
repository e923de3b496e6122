//! Monte Carlo check of staircase convergence.
//!
//! A simulated player answers each trial correctly with a logistic
//! probability that falls as the level rises past their ability. Running the
//! staircase against that player shows where a tunable will settle and how
//! quickly, which is how new `AdaptationConfig` values get sanity-checked.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::calibration::AdaptationConfig;
use super::staircase::StaircaseState;

/// Configuration for a staircase simulation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of trials to run
    pub trials: usize,

    /// Level at which the simulated player succeeds half the time
    pub ability: f64,

    /// Steepness of the psychometric curve (per level unit)
    pub slope: f64,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 200,
            ability: 5.0,
            slope: 1.0,
            seed: None,
        }
    }
}

/// Result of one simulated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub final_level: f64,
    pub final_step_size: f64,
    pub reversals: u32,
    /// Share of all trials answered correctly
    pub success_rate: f64,
    /// Mean level over the second half of the run
    pub settled_level: f64,
    /// Level after every trial
    pub trajectory: Vec<f64>,
}

/// Probability that a player of `ability` succeeds at `level`.
pub fn success_probability(level: f64, ability: f64, slope: f64) -> f64 {
    1.0 / (1.0 + (slope * (level - ability)).exp())
}

/// Run `config.trials` simulated trials against the tunable in `adaptation`.
pub fn simulate_staircase(adaptation: &AdaptationConfig, config: &SimulationConfig) -> SimulationResult {
    let mut rng = match config.seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    };

    let mut staircase: StaircaseState = adaptation.staircase(adaptation.initial_value);
    let mut successes = 0usize;
    let mut trajectory = Vec::with_capacity(config.trials);

    for _ in 0..config.trials {
        let p = success_probability(staircase.current_level, config.ability, config.slope);
        let correct = rng.gen::<f64>() < p;
        if correct {
            successes += 1;
        }
        staircase.apply(correct);
        trajectory.push(staircase.current_level);
    }

    let tail = &trajectory[trajectory.len() / 2..];
    let settled_level = if tail.is_empty() {
        staircase.current_level
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    };

    SimulationResult {
        final_level: staircase.current_level,
        final_step_size: staircase.step_size,
        reversals: staircase.reversals,
        success_rate: if config.trials == 0 {
            0.0
        } else {
            successes as f64 / config.trials as f64
        },
        settled_level,
        trajectory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drill() -> AdaptationConfig {
        AdaptationConfig::new("drill", "level", 5.0, 0.0, 20.0, 1.0)
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = SimulationConfig {
            seed: Some(7),
            ..SimulationConfig::default()
        };
        let a = simulate_staircase(&drill(), &config);
        let b = simulate_staircase(&drill(), &config);
        assert_eq!(a.trajectory, b.trajectory);
    }

    #[test]
    fn converges_near_seventy_nine_percent_point() {
        let config = SimulationConfig {
            trials: 4000,
            ability: 10.0,
            slope: 1.0,
            seed: Some(42),
        };
        let result = simulate_staircase(&drill(), &config);
        // p = 0.794 where level = ability - 1.35 / slope
        assert!(result.settled_level > 7.0 && result.settled_level < 10.5, "{result:?}");
        assert!(result.success_rate > 0.6 && result.success_rate < 0.92);
        assert!(result.reversals > 4);
        assert!(result.final_step_size < 1.0);
    }

    #[test]
    fn trajectory_respects_bounds() {
        let config = SimulationConfig {
            trials: 500,
            ability: 100.0,
            slope: 2.0,
            seed: Some(1),
        };
        let result = simulate_staircase(&drill(), &config);
        assert!(result.trajectory.iter().all(|&l| (0.0..=20.0).contains(&l)));
        assert_eq!(result.final_level, 20.0);
    }

    #[test]
    fn zero_trials() {
        let config = SimulationConfig {
            trials: 0,
            seed: Some(3),
            ..SimulationConfig::default()
        };
        let result = simulate_staircase(&drill(), &config);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.final_level, 5.0);
    }
}
