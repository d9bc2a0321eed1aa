//! Population generation: learner profiles, concepts and questions.

use std::collections::BTreeMap;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SimError};
use crate::profile::{Profile, ProfileGenerator};
use crate::types::{
    ConceptId, DifficultyLevel, Question, MAX_LINKED_CONCEPTS, MIN_LINKED_CONCEPTS,
    QUESTION_OPTIONS,
};

/// Source of unique identifiers
pub trait IdGenerator {
    fn next_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String;
}

/// Random v4 UUIDs from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> String {
        Uuid::new_v4().to_string()
    }
}

/// v4 UUIDs built from the simulation RNG, so a seeded run is reproducible
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededIdGenerator;

impl IdGenerator for SeededIdGenerator {
    fn next_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let bytes: [u8; 16] = rng.gen();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    pub profiles: Vec<Profile>,
    pub concepts: Vec<ConceptId>,
    pub questions: Vec<Question>,
}

impl Population {
    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(Profile::id)
    }
}

pub struct PopulationGenerator<G: IdGenerator> {
    profiles: ProfileGenerator,
    ids: G,
}

impl<G: IdGenerator> PopulationGenerator<G> {
    pub fn new(profiles: ProfileGenerator, ids: G) -> Self {
        Self { profiles, ids }
    }

    pub fn generate_profiles<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) -> Vec<Profile> {
        (0..n)
            .map(|_| {
                let id = self.ids.next_id(rng);
                self.profiles.generate(rng, id)
            })
            .collect()
    }

    pub fn generate_concepts<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) -> Vec<ConceptId> {
        (0..n)
            .map(|_| format!("concept-{}", self.ids.next_id(rng)))
            .collect()
    }

    /// Questions linking 1-3 distinct concepts, with one random answer
    /// letter per difficulty tier.
    pub fn generate_questions<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        concepts: &[ConceptId],
        n: usize,
    ) -> Result<Vec<Question>> {
        if n > 0 && concepts.is_empty() {
            return Err(SimError::InvalidArgument(
                "questions need at least one concept".to_string(),
            ));
        }

        let mut questions = Vec::with_capacity(n);
        for _ in 0..n {
            let id = format!("question-{}", self.ids.next_id(rng));
            let k = rng
                .gen_range(MIN_LINKED_CONCEPTS..=MAX_LINKED_CONCEPTS)
                .min(concepts.len());
            let linked: Vec<ConceptId> = concepts.iter().cloned().choose_multiple(rng, k);
            let answers: BTreeMap<DifficultyLevel, char> = DifficultyLevel::ALL
                .iter()
                .map(|&level| {
                    let letter = QUESTION_OPTIONS.choose(rng).copied().unwrap_or('A');
                    (level, letter)
                })
                .collect();
            questions.push(Question::new(id, linked, answers));
        }
        Ok(questions)
    }

    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        users: usize,
        concepts: usize,
        questions: usize,
    ) -> Result<Population> {
        let profiles = self.generate_profiles(rng, users);
        let concept_ids = self.generate_concepts(rng, concepts);
        let questions = self.generate_questions(rng, &concept_ids, questions)?;

        tracing::info!(
            users = profiles.len(),
            concepts = concept_ids.len(),
            questions = questions.len(),
            "population generated"
        );

        Ok(Population {
            profiles,
            concepts: concept_ids,
            questions,
        })
    }
}
