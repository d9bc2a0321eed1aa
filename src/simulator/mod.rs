//! Answer simulator: probability fusion and outcome sampling
//!
//! For one answering event the simulator fuses
//! - a recency gate for repeated questions (fixed high probabilities when the
//!   previous attempt on the same question is recent),
//! - the learner's compound index,
//! - the per-concept experience evidence,
//! - a binary luck bit,
//!
//! into a correctness probability, then draws a Bernoulli outcome and the
//! submitted option letter.
//!
//! Policies after the recency gate:
//! - ExperienceWeighted: p = 0.25 + 0.25·meanExperience + 0.40·ci + 0.10·luck
//! - Tally (stale repeat): p = 0.30 + 0.10·luck + 0.30·ci + 0.30·avgConceptCorrectness
//! - Tally (first attempt): p = 0.10 + 0.40·luck + 0.50·ci

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::experience::experience_score;
use crate::sanitize::{mean, safe_ratio, sanitize_probability};
use crate::types::QUESTION_OPTIONS;

// ==================== Constants ====================

const WITHIN_DAY_PROBABILITY: f64 = 0.90;
const WITHIN_WEEK_PROBABILITY: f64 = 0.85;
const WITHIN_THIRTY_WEEKS_PROBABILITY: f64 = 0.80;

/// Mean concept correctness when no linked concept has history
const DEFAULT_CONCEPT_CORRECTNESS: f64 = 0.5;

const LUCK_PROBABILITY: f64 = 0.5;

// ==================== Data Structures ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Full boolean histories scored by the experience model
    #[default]
    ExperienceWeighted,
    /// Correct/incorrect counters with Laplace smoothing
    Tally,
}

impl FusionPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "experience" | "experience_weighted" => Some(Self::ExperienceWeighted),
            "tally" => Some(Self::Tally),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub policy: FusionPolicy,
    /// Whether concepts without own history borrow evidence from
    /// correlated neighbours
    pub concept_transfer: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            policy: FusionPolicy::ExperienceWeighted,
            concept_transfer: true,
        }
    }
}

/// Evidence for one linked concept
#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptEvidence<'a> {
    /// Outcomes on this concept, oldest first
    pub history: &'a [bool],
    /// Score transferred from correlated concepts, if any
    pub transfer: Option<f64>,
}

impl ConceptEvidence<'_> {
    pub fn tally(&self) -> (usize, usize) {
        let correct = self.history.iter().filter(|&&v| v).count();
        (correct, self.history.len() - correct)
    }

    fn signal(&self) -> f64 {
        if self.history.is_empty() {
            self.transfer.map(sanitize_probability).unwrap_or(0.0)
        } else {
            experience_score(self.history)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FusionInput<'a> {
    pub compound_index: f64,
    /// Time since the previous attempt on the same question; `None` on the
    /// first attempt.
    pub repeat_gap: Option<Duration>,
    pub concepts: Vec<ConceptEvidence<'a>>,
}

/// Which branch produced the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilitySource {
    RecentRepeat,
    StaleRepeat,
    FirstAttempt,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub correct: bool,
    pub user_answer: char,
    pub probability: f64,
    pub luck: bool,
    pub source: ProbabilitySource,
}

// ==================== Main Implementation ====================

#[derive(Debug, Clone, Default)]
pub struct AnswerSimulator {
    config: FusionConfig,
}

impl AnswerSimulator {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fixed probability for a repeat within 24h / 7 days / 30 weeks
    pub fn recency_probability(gap: Duration) -> Option<f64> {
        if gap <= Duration::hours(24) {
            Some(WITHIN_DAY_PROBABILITY)
        } else if gap <= Duration::days(7) {
            Some(WITHIN_WEEK_PROBABILITY)
        } else if gap <= Duration::weeks(30) {
            Some(WITHIN_THIRTY_WEEKS_PROBABILITY)
        } else {
            None
        }
    }

    /// Mean experience signal over the linked concepts
    pub fn mean_experience(concepts: &[ConceptEvidence<'_>]) -> f64 {
        let signals: Vec<f64> = concepts.iter().map(ConceptEvidence::signal).collect();
        mean(&signals).unwrap_or(0.0)
    }

    /// Laplace-smoothed correctness averaged over concepts with history
    pub fn average_concept_correctness(concepts: &[ConceptEvidence<'_>]) -> f64 {
        let ratios: Vec<f64> = concepts
            .iter()
            .filter(|c| !c.history.is_empty())
            .map(|c| {
                let (correct, incorrect) = c.tally();
                safe_ratio(correct as f64, (correct + incorrect + 1) as f64, 0.0)
            })
            .collect();
        mean(&ratios).unwrap_or(DEFAULT_CONCEPT_CORRECTNESS)
    }

    /// Correctness probability for a given luck bit, clamped to [0, 1]
    pub fn correctness_probability(
        &self,
        input: &FusionInput<'_>,
        luck: bool,
    ) -> (f64, ProbabilitySource) {
        let luck = if luck { 1.0 } else { 0.0 };
        let ci = sanitize_probability(input.compound_index);

        if let Some(gap) = input.repeat_gap {
            if let Some(p) = Self::recency_probability(gap) {
                return (p, ProbabilitySource::RecentRepeat);
            }
        }
        let source = match input.repeat_gap {
            Some(_) => ProbabilitySource::StaleRepeat,
            None => ProbabilitySource::FirstAttempt,
        };

        let p = match (self.config.policy, source) {
            (FusionPolicy::ExperienceWeighted, _) => {
                0.25 + 0.25 * Self::mean_experience(&input.concepts) + 0.40 * ci + 0.10 * luck
            }
            (FusionPolicy::Tally, ProbabilitySource::StaleRepeat) => {
                0.3 + 0.1 * luck
                    + 0.3 * ci
                    + 0.3 * Self::average_concept_correctness(&input.concepts)
            }
            (FusionPolicy::Tally, _) => 0.1 + 0.4 * luck + 0.5 * ci,
        };

        (sanitize_probability(p), source)
    }

    /// Draw the luck bit, the outcome and the submitted letter
    pub fn decide<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        input: &FusionInput<'_>,
        correct_answer: char,
    ) -> Decision {
        let luck = rng.gen_bool(LUCK_PROBABILITY);
        let (probability, source) = self.correctness_probability(input, luck);
        let correct = rng.gen_bool(probability);
        let user_answer = Self::answering(rng, correct, correct_answer);

        Decision {
            correct,
            user_answer,
            probability,
            luck,
            source,
        }
    }

    /// The correct letter when correct, otherwise a uniform pick among the
    /// other options.
    pub fn answering<R: Rng + ?Sized>(rng: &mut R, correct: bool, answer: char) -> char {
        if correct {
            return answer;
        }
        let wrong: Vec<char> = QUESTION_OPTIONS
            .iter()
            .copied()
            .filter(|&c| c != answer)
            .collect();
        wrong.choose(rng).copied().unwrap_or(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_recency_windows() {
        assert_eq!(AnswerSimulator::recency_probability(Duration::minutes(5)), Some(0.90));
        assert_eq!(AnswerSimulator::recency_probability(Duration::hours(24)), Some(0.90));
        assert_eq!(AnswerSimulator::recency_probability(Duration::hours(25)), Some(0.85));
        assert_eq!(AnswerSimulator::recency_probability(Duration::days(7)), Some(0.85));
        assert_eq!(AnswerSimulator::recency_probability(Duration::days(8)), Some(0.80));
        assert_eq!(AnswerSimulator::recency_probability(Duration::weeks(30)), Some(0.80));
        assert_eq!(AnswerSimulator::recency_probability(Duration::weeks(31)), None);
    }

    #[test]
    fn test_recent_repeat_ignores_other_inputs() {
        let history = [false; 10];
        for policy in [FusionPolicy::ExperienceWeighted, FusionPolicy::Tally] {
            let sim = AnswerSimulator::new(FusionConfig {
                policy,
                concept_transfer: true,
            });
            for ci in [0.0, 0.5, 1.0] {
                for luck in [false, true] {
                    let input = FusionInput {
                        compound_index: ci,
                        repeat_gap: Some(Duration::hours(3)),
                        concepts: vec![ConceptEvidence {
                            history: &history,
                            transfer: None,
                        }],
                    };
                    let (p, source) = sim.correctness_probability(&input, luck);
                    assert_eq!(p, 0.90);
                    assert_eq!(source, ProbabilitySource::RecentRepeat);
                }
            }
        }
    }

    #[test]
    fn test_tally_first_attempt() {
        let sim = AnswerSimulator::new(FusionConfig {
            policy: FusionPolicy::Tally,
            concept_transfer: false,
        });
        let input = FusionInput {
            compound_index: 0.4,
            repeat_gap: None,
            concepts: vec![],
        };
        let (p, source) = sim.correctness_probability(&input, true);
        assert!(approx(p, 0.1 + 0.4 + 0.5 * 0.4));
        assert_eq!(source, ProbabilitySource::FirstAttempt);
        let (p, _) = sim.correctness_probability(&input, false);
        assert!(approx(p, 0.1 + 0.2));
    }

    #[test]
    fn test_tally_stale_repeat() {
        let sim = AnswerSimulator::new(FusionConfig {
            policy: FusionPolicy::Tally,
            concept_transfer: false,
        });
        let h1 = [true, true, false];
        let h2: [bool; 0] = [];
        let input = FusionInput {
            compound_index: 0.5,
            repeat_gap: Some(Duration::weeks(40)),
            concepts: vec![
                ConceptEvidence { history: &h1, transfer: None },
                ConceptEvidence { history: &h2, transfer: None },
            ],
        };
        // only h1 counts: 2 / (2 + 1 + 1)
        let (p, source) = sim.correctness_probability(&input, false);
        assert!(approx(p, 0.3 + 0.3 * 0.5 + 0.3 * 0.5));
        assert_eq!(source, ProbabilitySource::StaleRepeat);
    }

    #[test]
    fn test_average_concept_correctness_default() {
        assert_eq!(AnswerSimulator::average_concept_correctness(&[]), 0.5);
        let empty: [bool; 0] = [];
        let evidence = [ConceptEvidence { history: &empty, transfer: Some(0.9) }];
        assert_eq!(AnswerSimulator::average_concept_correctness(&evidence), 0.5);
    }

    #[test]
    fn test_experience_weighted_first_attempt() {
        let sim = AnswerSimulator::default();
        let h = [true, true, true];
        let input = FusionInput {
            compound_index: 0.5,
            repeat_gap: None,
            concepts: vec![ConceptEvidence { history: &h, transfer: None }],
        };
        let expected = 0.25 + 0.25 * experience_score(&h) + 0.40 * 0.5 + 0.10;
        let (p, source) = sim.correctness_probability(&input, true);
        assert!(approx(p, expected));
        assert_eq!(source, ProbabilitySource::FirstAttempt);
    }

    #[test]
    fn test_mean_experience_uses_transfer_for_empty_history() {
        let empty: [bool; 0] = [];
        let h = [true];
        let evidence = [
            ConceptEvidence { history: &empty, transfer: Some(0.6) },
            ConceptEvidence { history: &h, transfer: Some(0.0) },
        ];
        let expected = (0.6 + experience_score(&h)) / 2.0;
        assert!(approx(AnswerSimulator::mean_experience(&evidence), expected));

        let cold = [ConceptEvidence { history: &empty, transfer: None }];
        assert_eq!(AnswerSimulator::mean_experience(&cold), 0.0);
    }

    #[test]
    fn test_probability_always_in_unit_interval() {
        let sim = AnswerSimulator::default();
        let h = [true; 30];
        let input = FusionInput {
            compound_index: 5.0,
            repeat_gap: None,
            concepts: vec![ConceptEvidence { history: &h, transfer: None }],
        };
        let (p, _) = sim.correctness_probability(&input, true);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_answering_wrong_letter_differs() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for answer in QUESTION_OPTIONS {
            for _ in 0..50 {
                let a = AnswerSimulator::answering(&mut rng, false, answer);
                assert_ne!(a, answer);
                assert!(QUESTION_OPTIONS.contains(&a));
            }
            assert_eq!(AnswerSimulator::answering(&mut rng, true, answer), answer);
        }
    }

    #[test]
    fn test_decide_consistency() {
        let sim = AnswerSimulator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let input = FusionInput {
            compound_index: 0.3,
            repeat_gap: None,
            concepts: vec![],
        };
        for _ in 0..200 {
            let d = sim.decide(&mut rng, &input, 'B');
            assert_eq!(d.correct, d.user_answer == 'B');
            assert!((0.0..=1.0).contains(&d.probability));
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(FusionPolicy::parse("tally"), Some(FusionPolicy::Tally));
        assert_eq!(
            FusionPolicy::parse("Experience"),
            Some(FusionPolicy::ExperienceWeighted)
        );
        assert_eq!(FusionPolicy::parse("bayes"), None);
    }
}
