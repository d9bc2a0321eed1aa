//! Learning curves for a single synthetic learner on one concept.
//!
//! Each attempt is drawn with
//! p = 0.25 + 0.25·experience(history) + 0.40·ci + 0.10·luck
//! so accuracy should rise as the history grows.

use rand::Rng;
use serde::Serialize;

use crate::error::{Result, SimError};
use crate::profile::{Profile, ProfileGenerator};
use crate::simulator::{AnswerSimulator, ConceptEvidence, FusionInput};

#[derive(Debug, Clone, Serialize)]
pub struct LearningCurve {
    pub profile: Profile,
    pub outcomes: Vec<bool>,
    pub probabilities: Vec<f64>,
}

fn accuracy(outcomes: &[bool]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|&&v| v).count() as f64 / outcomes.len() as f64
}

impl LearningCurve {
    pub fn accuracy(&self) -> f64 {
        accuracy(&self.outcomes)
    }

    pub fn first_half_accuracy(&self) -> f64 {
        accuracy(&self.outcomes[..self.outcomes.len() / 2])
    }

    pub fn last_half_accuracy(&self) -> f64 {
        accuracy(&self.outcomes[self.outcomes.len() / 2..])
    }

    /// Running accuracy after each attempt
    pub fn cumulative_accuracy(&self) -> Vec<f64> {
        let mut correct = 0usize;
        self.outcomes
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if v {
                    correct += 1;
                }
                correct as f64 / (i + 1) as f64
            })
            .collect()
    }
}

/// Simulate `n_question` sequential attempts for a freshly sampled learner
pub fn simulate_learning_curve<R: Rng + ?Sized>(
    rng: &mut R,
    generator: &ProfileGenerator,
    user_id: &str,
    n_question: usize,
) -> Result<LearningCurve> {
    if n_question == 0 {
        return Err(SimError::InvalidArgument(
            "n_question must be positive".to_string(),
        ));
    }

    let profile = generator.generate(rng, user_id);
    let simulator = AnswerSimulator::default();
    let compound_index = profile.compound_index();

    let mut outcomes = Vec::with_capacity(n_question);
    let mut probabilities = Vec::with_capacity(n_question);

    for _ in 0..n_question {
        let input = FusionInput {
            compound_index,
            repeat_gap: None,
            concepts: vec![ConceptEvidence {
                history: &outcomes,
                transfer: None,
            }],
        };
        let luck = rng.gen_bool(0.5);
        let (p, _) = simulator.correctness_probability(&input, luck);
        let correct = rng.gen_bool(p);
        probabilities.push(p);
        outcomes.push(correct);
    }

    tracing::debug!(
        user_id,
        compound_index,
        accuracy = accuracy(&outcomes),
        "learning curve simulated"
    );

    Ok(LearningCurve {
        profile,
        outcomes,
        probabilities,
    })
}
