//! Experience contribution model
//!
//! Converts a learner's ordered attempt history on one concept (oldest first)
//! into a bounded estimate of the next attempt succeeding.
//!
//! Per-attempt contribution, keyed on (previous, current):
//!
//! | previous | current | contribution |
//! |----------|---------|--------------|
//! | none     | success | 0.50 |
//! | none     | failure | 0.25 |
//! | success  | success | 1.00 |
//! | success  | failure | 0.25 |
//! | failure  | success | 0.50 |
//! | failure  | failure | 0.00 if the contribution two attempts back is non-zero, else -0.25 |
//!
//! Contributions are combined with ascending linear weights `i / (N(N+1)/2)`
//! (oldest i = 1), then blended with a maturity prior:
//!
//! score = 1/3 * Σ w_i c_i + 2/3 * PoissonCDF(N; λ = 5)

use statrs::distribution::{DiscreteCDF, Poisson};

use crate::error::{Result, SimError};
use crate::sanitize::sanitize_probability;

// ==================== Constants ====================

const FIRST_SUCCESS: f64 = 0.5;
const FIRST_FAILURE: f64 = 0.25;
const STREAK_SUCCESS: f64 = 1.0;
const FAILURE_AFTER_SUCCESS: f64 = 0.25;
const RECOVERY_SUCCESS: f64 = 0.5;
const FAILURE_NOISE: f64 = 0.0;
const REPEATED_FAILURE: f64 = -0.25;

/// Poisson rate of the maturity prior
pub const MATURITY_LAMBDA: f64 = 5.0;

const HISTORY_WEIGHT: f64 = 1.0 / 3.0;
const MATURITY_WEIGHT: f64 = 2.0 / 3.0;

// ==================== Contributions ====================

/// Contribution of each attempt in `records`
pub fn learning_contributions(records: &[bool]) -> Vec<f64> {
    let mut contrs: Vec<f64> = Vec::with_capacity(records.len());

    for (i, &current) in records.iter().enumerate() {
        let c = if i == 0 {
            if current {
                FIRST_SUCCESS
            } else {
                FIRST_FAILURE
            }
        } else {
            let previous = records[i - 1];
            match (previous, current) {
                (true, true) => STREAK_SUCCESS,
                (true, false) => FAILURE_AFTER_SUCCESS,
                (false, true) => RECOVERY_SUCCESS,
                (false, false) => match i.checked_sub(2).map(|k| contrs[k]) {
                    Some(two_back) if two_back != 0.0 => FAILURE_NOISE,
                    _ => REPEATED_FAILURE,
                },
            }
        };
        contrs.push(c);
    }

    contrs
}

/// Linear weights for `nfold` attempts; later attempts weigh more and the
/// weights sum to 1.
pub fn descending_weights(nfold: usize) -> Result<Vec<f64>> {
    if nfold == 0 {
        return Err(SimError::InvalidArgument(
            "nfold must be a positive integer".to_string(),
        ));
    }
    let denom = (nfold * (nfold + 1)) as f64 / 2.0;
    Ok((1..=nfold).map(|i| i as f64 / denom).collect())
}

/// P(X <= k) for X ~ Poisson(lambda). A rate that is not strictly
/// positive puts all mass at 0.
pub fn poisson_cdf(k: usize, lambda: f64) -> f64 {
    match Poisson::new(lambda) {
        Ok(dist) => sanitize_probability(dist.cdf(k as u64)),
        Err(_) => 1.0,
    }
}

/// Recency-weighted experience score in [0, 1]. An empty history scores 0.
pub fn experience_score(records: &[bool]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let denom = (records.len() * (records.len() + 1)) as f64 / 2.0;
    let tot: f64 = learning_contributions(records)
        .iter()
        .enumerate()
        .map(|(i, c)| c * (i + 1) as f64 / denom)
        .sum();

    sanitize_probability(
        HISTORY_WEIGHT * tot + MATURITY_WEIGHT * poisson_cdf(records.len(), MATURITY_LAMBDA),
    )
}
