//! Stopping criteria for LEARNING's cold-start sampling.
//!
//! A criterion sees the class candidates after every sampled block and
//! decides whether sampling can stop. Each column gets a fresh instance.

use sti_model::HeaderAnnotation;

use crate::config::StoppingCriteriaConfig;
use crate::error::{Result, StiError};

pub trait StoppingCriteria: Send {
    fn name(&self) -> &'static str;

    /// Called after each sampled block; `true` ends sampling.
    fn stop(&mut self, state: &[HeaderAnnotation], processed_rows: usize) -> bool;
}

/// Stops once the entropy of the class score distribution has changed by
/// less than `threshold` for `patience` consecutive blocks.
#[derive(Debug, Clone)]
pub struct EntropyConvergence {
    threshold: f64,
    patience: usize,
    previous: Option<f64>,
    stable: usize,
}

impl EntropyConvergence {
    pub const DEFAULT_THRESHOLD: f64 = 0.0001;
    pub const DEFAULT_PATIENCE: usize = 2;

    pub fn new(threshold: f64, patience: usize) -> Self {
        Self {
            threshold,
            patience: patience.max(1),
            previous: None,
            stable: 0,
        }
    }

    /// Shannon entropy of the normalized positive final scores.
    pub fn entropy(state: &[HeaderAnnotation]) -> Option<f64> {
        let total: f64 = state.iter().map(|c| c.final_score.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        Some(
            state
                .iter()
                .map(|c| c.final_score.max(0.0) / total)
                .filter(|p| *p > 0.0)
                .map(|p| -p * p.ln())
                .sum(),
        )
    }
}

impl StoppingCriteria for EntropyConvergence {
    fn name(&self) -> &'static str {
        "entropy"
    }

    fn stop(&mut self, state: &[HeaderAnnotation], _processed_rows: usize) -> bool {
        let Some(entropy) = Self::entropy(state) else {
            self.previous = None;
            self.stable = 0;
            return false;
        };
        if let Some(previous) = self.previous {
            if (entropy - previous).abs() < self.threshold {
                self.stable += 1;
            } else {
                self.stable = 0;
            }
        }
        self.previous = Some(entropy);
        self.stable >= self.patience
    }
}

/// Never stops early: every block is sampled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaust;

impl StoppingCriteria for Exhaust {
    fn name(&self) -> &'static str {
        "exhaust"
    }

    fn stop(&mut self, _state: &[HeaderAnnotation], _processed_rows: usize) -> bool {
        false
    }
}

fn param<T: std::str::FromStr>(config: &StoppingCriteriaConfig, index: usize, default: T) -> Result<T> {
    match config.params.get(index) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| StiError::StoppingCriteriaParam {
            name: config.name.clone(),
            value: raw.clone(),
        }),
    }
}

/// Builds the configured criteria.
pub fn build_stopping_criteria(config: &StoppingCriteriaConfig) -> Result<Box<dyn StoppingCriteria>> {
    match config.name.trim().to_ascii_lowercase().as_str() {
        "entropy" => {
            let threshold: f64 = param(config, 0, EntropyConvergence::DEFAULT_THRESHOLD)?;
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(StiError::StoppingCriteriaParam {
                    name: config.name.clone(),
                    value: threshold.to_string(),
                });
            }
            let patience: usize = param(config, 1, EntropyConvergence::DEFAULT_PATIENCE)?;
            Ok(Box::new(EntropyConvergence::new(threshold, patience)))
        }
        "exhaust" => Ok(Box::new(Exhaust)),
        _ => Err(StiError::UnknownStoppingCriteria {
            name: config.name.clone(),
        }),
    }
}
