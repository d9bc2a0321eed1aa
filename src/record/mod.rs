//! Record store
//!
//! Owns the mutable per-user state of a simulation run:
//! - answer records, grouped per question in first-attempt order
//! - per-concept outcome histories (oldest first)
//! - the user's simulated clock (timestamp of the last event)
//! - the user's random stream
//!
//! Each user is an independent shard. Event generation for one user is
//! strictly sequential; shards for different users can run in parallel and
//! produce the same per-user sequences as a sequential run.

pub mod clock;
pub mod export;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::concept::ConceptGraph;
use crate::error::{Result, SimError};
use crate::experience::experience_score;
use crate::profile::Profile;
use crate::simulator::{AnswerSimulator, ConceptEvidence, FusionConfig, FusionInput};
use crate::types::{ConceptId, DifficultyLevel, Question, QuestionId, UserId};

pub use clock::{Clock, FixedClock, SessionKind, SystemClock};
pub use export::{CollectingSink, JsonLinesSink, RecordSink};

// ==================== Data Structures ====================

/// One simulated answering event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "UserID")]
    pub user_id: UserId,
    #[serde(rename = "QuestionID")]
    pub question_id: QuestionId,
    #[serde(rename = "ConceptIDs")]
    pub concept_ids: Vec<ConceptId>,
    #[serde(rename = "DifficultyLevel")]
    pub difficulty: DifficultyLevel,
    #[serde(rename = "CorrectAnswer")]
    pub correct_answer: char,
    #[serde(rename = "UserAnswer")]
    pub user_answer: char,
    /// Seconds
    #[serde(rename = "TimeSpent")]
    pub time_spent: u32,
    #[serde(rename = "TimeStamp", with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Record {
    pub fn is_correct(&self) -> bool {
        self.correct_answer == self.user_answer
    }
}

mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::clock::{from_epoch_seconds, to_epoch_seconds};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(to_epoch_seconds(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(d)?;
        from_epoch_seconds(secs)
            .ok_or_else(|| de::Error::custom(format!("timestamp {secs} out of range")))
    }
}

/// Construction options for a [`RecordStore`]
#[derive(Clone)]
pub struct StoreOptions {
    pub seed: u64,
    pub fusion: FusionConfig,
    pub clock: Arc<dyn Clock>,
    /// Shard batch generation across users with rayon
    pub parallel: bool,
}

impl StoreOptions {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            fusion: FusionConfig::default(),
            clock: Arc::new(SystemClock),
            parallel: false,
        }
    }
}

/// Mutable state of one user
#[derive(Debug)]
struct UserShard {
    profile_index: usize,
    rng: ChaCha8Rng,
    questions: Vec<(QuestionId, Vec<Record>)>,
    question_slots: HashMap<QuestionId, usize>,
    concept_history: HashMap<ConceptId, Vec<bool>>,
    last_event: Option<DateTime<Utc>>,
}

impl UserShard {
    fn new(profile_index: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(profile_index as u64);
        Self {
            profile_index,
            rng,
            questions: Vec::new(),
            question_slots: HashMap::new(),
            concept_history: HashMap::new(),
            last_event: None,
        }
    }

    fn record_count(&self) -> usize {
        self.questions.iter().map(|(_, r)| r.len()).sum()
    }
}

/// Read-only inputs shared by all shards
struct EventContext<'a> {
    profiles: &'a [Profile],
    questions: &'a [Question],
    graph: &'a ConceptGraph,
    simulator: &'a AnswerSimulator,
    clock: &'a dyn Clock,
}

impl EventContext<'_> {
    fn generate(&self, shard: &mut UserShard) -> Result<Record> {
        let profile = &self.profiles[shard.profile_index];
        let UserShard {
            rng,
            questions,
            question_slots,
            concept_history,
            last_event,
            ..
        } = shard;

        let question = self
            .questions
            .choose(rng)
            .ok_or_else(|| SimError::InvalidArgument("question pool is empty".to_string()))?;
        let difficulty = *DifficultyLevel::ALL
            .choose(rng)
            .unwrap_or(&DifficultyLevel::Easy);
        let correct_answer = question.answer_for(difficulty);

        let (timestamp, session) = clock::next_submission(rng, *last_event, self.clock);
        let time_spent = clock::time_spent(rng);

        let repeat_gap = latest_attempt(questions, question_slots, &question.id)
            .map(|prev| timestamp - prev);
        let concepts = concept_evidence(
            self.graph,
            self.simulator.config().concept_transfer,
            concept_history,
            &question.concepts,
        );

        let input = FusionInput {
            compound_index: profile.compound_index(),
            repeat_gap,
            concepts,
        };
        let decision = self.simulator.decide(rng, &input, correct_answer);

        tracing::debug!(
            user_id = profile.id(),
            question_id = %question.id,
            difficulty = difficulty.as_str(),
            session = ?session,
            source = ?decision.source,
            probability = decision.probability,
            luck = decision.luck,
            correct = decision.correct,
            "answer simulated"
        );

        let record = Record {
            user_id: profile.id().to_string(),
            question_id: question.id.clone(),
            concept_ids: question.concepts.clone(),
            difficulty,
            correct_answer,
            user_answer: decision.user_answer,
            time_spent,
            timestamp,
        };

        let slot = *question_slots.entry(question.id.clone()).or_insert_with(|| {
            questions.push((question.id.clone(), Vec::new()));
            questions.len() - 1
        });
        questions[slot].1.push(record.clone());
        for c in &question.concepts {
            concept_history
                .entry(c.clone())
                .or_default()
                .push(decision.correct);
        }
        *last_event = Some(timestamp);

        Ok(record)
    }
}

/// Timestamp of the most recent attempt on `question_id`
fn latest_attempt(
    questions: &[(QuestionId, Vec<Record>)],
    slots: &HashMap<QuestionId, usize>,
    question_id: &str,
) -> Option<DateTime<Utc>> {
    slots
        .get(question_id)
        .and_then(|&slot| questions[slot].1.iter().map(|r| r.timestamp).max())
}

/// Evidence for each linked concept; concepts without own history borrow
/// from correlated neighbours when transfer is enabled.
fn concept_evidence<'h>(
    graph: &ConceptGraph,
    transfer_enabled: bool,
    history: &'h HashMap<ConceptId, Vec<bool>>,
    concepts: &[ConceptId],
) -> Vec<ConceptEvidence<'h>> {
    concepts
        .iter()
        .map(|c| {
            let own = history.get(c).map(Vec::as_slice).unwrap_or(&[]);
            let transfer = if transfer_enabled && own.is_empty() {
                graph.transferred_score(c, |n| {
                    history
                        .get(n)
                        .filter(|h| !h.is_empty())
                        .map(|h| experience_score(h))
                })
            } else {
                None
            };
            ConceptEvidence {
                history: own,
                transfer,
            }
        })
        .collect()
}

// ==================== Main Implementation ====================

pub struct RecordStore<'a> {
    profiles: &'a [Profile],
    questions: &'a [Question],
    graph: ConceptGraph,
    simulator: AnswerSimulator,
    clock: Arc<dyn Clock>,
    parallel: bool,
    user_index: HashMap<UserId, usize>,
    shards: Vec<UserShard>,
}

impl<'a> RecordStore<'a> {
    pub fn new(
        profiles: &'a [Profile],
        concepts: &[ConceptId],
        questions: &'a [Question],
        options: StoreOptions,
    ) -> Self {
        let mut user_index = HashMap::with_capacity(profiles.len());
        for (i, p) in profiles.iter().enumerate() {
            user_index.entry(p.id().to_string()).or_insert(i);
        }
        let shards = (0..profiles.len())
            .map(|i| UserShard::new(i, options.seed))
            .collect();

        Self {
            profiles,
            questions,
            graph: ConceptGraph::new(concepts.iter().cloned()),
            simulator: AnswerSimulator::new(options.fusion),
            clock: options.clock,
            parallel: options.parallel,
            user_index,
            shards,
        }
    }

    /// Declare a symmetric correlation between two known concepts
    pub fn correlate(&mut self, a: &str, b: &str, weight: f64) -> Result<()> {
        self.graph.correlate(a, b, weight)
    }

    fn shard_index(&self, user_id: &str) -> Result<usize> {
        self.user_index
            .get(user_id)
            .copied()
            .ok_or_else(|| SimError::NotFound(format!("user profile {user_id}")))
    }

    /// Simulate one answering event for `user_id`
    pub fn generate_event(&mut self, user_id: &str) -> Result<Record> {
        let idx = self.shard_index(user_id)?;
        let ctx = EventContext {
            profiles: self.profiles,
            questions: self.questions,
            graph: &self.graph,
            simulator: &self.simulator,
            clock: self.clock.as_ref(),
        };
        ctx.generate(&mut self.shards[idx])
    }

    /// Simulate one event per entry of `user_ids`. All ids are validated
    /// before any state changes. Returns the number of events generated.
    pub fn generate_events<S: AsRef<str>>(&mut self, user_ids: &[S]) -> Result<usize> {
        let indices = user_ids
            .iter()
            .map(|id| self.shard_index(id.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let ctx = EventContext {
            profiles: self.profiles,
            questions: self.questions,
            graph: &self.graph,
            simulator: &self.simulator,
            clock: self.clock.as_ref(),
        };

        if self.parallel {
            let mut counts = vec![0usize; self.shards.len()];
            for &i in &indices {
                counts[i] += 1;
            }
            self.shards
                .par_iter_mut()
                .zip(counts.par_iter())
                .try_for_each(|(shard, &count)| {
                    for _ in 0..count {
                        ctx.generate(shard)?;
                    }
                    Ok::<(), SimError>(())
                })?;
        } else {
            for &i in &indices {
                ctx.generate(&mut self.shards[i])?;
            }
        }

        tracing::info!(
            events = indices.len(),
            parallel = self.parallel,
            "batch generation finished"
        );
        Ok(indices.len())
    }

    /// Records of one user, grouped per question in first-attempt order
    pub fn records_for(&self, user_id: &str) -> Result<impl Iterator<Item = &Record> + '_> {
        let idx = self.shard_index(user_id)?;
        Ok(self.shards[idx]
            .questions
            .iter()
            .flat_map(|(_, records)| records.iter()))
    }

    /// Outcome history of one user on one concept, oldest first
    pub fn concept_history(&self, user_id: &str, concept: &str) -> Result<&[bool]> {
        let idx = self.shard_index(user_id)?;
        Ok(self.shards[idx]
            .concept_history
            .get(concept)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn last_event(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        let idx = self.shard_index(user_id)?;
        Ok(self.shards[idx].last_event)
    }

    pub fn record_count(&self) -> usize {
        self.shards.iter().map(UserShard::record_count).sum()
    }

    /// Current correctness probability for `user_id` answering `question_id`
    /// now with the given luck bit, without mutating state.
    pub fn probe_probability(
        &self,
        user_id: &str,
        question_id: &str,
        at: DateTime<Utc>,
        luck: bool,
    ) -> Result<f64> {
        let idx = self.shard_index(user_id)?;
        let shard = &self.shards[idx];
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SimError::NotFound(format!("question {question_id}")))?;

        let repeat_gap = latest_attempt(&shard.questions, &shard.question_slots, question_id)
            .map(|prev| at - prev);
        let concepts = concept_evidence(
            &self.graph,
            self.simulator.config().concept_transfer,
            &shard.concept_history,
            &question.concepts,
        );
        let input = FusionInput {
            compound_index: self.profiles[shard.profile_index].compound_index(),
            repeat_gap,
            concepts,
        };
        Ok(self.simulator.correctness_probability(&input, luck).0)
    }

    /// Emit every record: users in population order, then questions in
    /// first-attempt order, then attempts in order.
    pub fn export<K: RecordSink + ?Sized>(&self, sink: &mut K) -> Result<usize> {
        let mut written = 0;
        for shard in &self.shards {
            for (_, records) in &shard.questions {
                for record in records {
                    sink.write_record(record)?;
                    written += 1;
                }
            }
        }
        sink.finish()?;
        Ok(written)
    }

    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mut sink = JsonLinesSink::create(path)?;
        let written = self.export(&mut sink)?;
        tracing::info!(path = %path.display(), records = written, "records exported");
        Ok(written)
    }
}
