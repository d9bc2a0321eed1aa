#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use anshist_sim::{
    DifficultyLevel, EducationTier, FixedClock, Population, PopulationGenerator, Profile,
    ProfileGenerator, Question, SeededIdGenerator, StoreOptions,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const FIXED_TIMESTAMP: i64 = 1_700_000_000;

pub fn fixed_options(seed: u64) -> StoreOptions {
    StoreOptions {
        seed,
        clock: Arc::new(FixedClock::from_unix(FIXED_TIMESTAMP)),
        ..StoreOptions::default()
    }
}

/// One learner, one concept, one question linked to it
pub fn minimal_population() -> Population {
    let answers = BTreeMap::from([
        (DifficultyLevel::Easy, 'B'),
        (DifficultyLevel::Medium, 'D'),
        (DifficultyLevel::Hard, 'A'),
    ]);
    Population {
        profiles: vec![Profile::new("user-1", 24, EducationTier::GradSchool, 104, 95)],
        concepts: vec!["concept-1".to_string()],
        questions: vec![Question::new(
            "question-1",
            vec!["concept-1".to_string()],
            answers,
        )],
    }
}

pub fn seeded_population(seed: u64, users: usize, concepts: usize, questions: usize) -> Population {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    PopulationGenerator::new(
        ProfileGenerator::with_defaults().expect("default profile params"),
        SeededIdGenerator,
    )
    .generate(&mut rng, users, concepts, questions)
    .expect("population")
}
