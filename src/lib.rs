//! # anshist-sim - synthetic answer-history generator
//!
//! Produces plausible longitudinal multiple-choice answer records for
//! simulated learners, as training/test data for knowledge-tracing research.
//!
//! - **Profile model** - latent learner attributes and the compound index
//! - **Experience model** - recency-weighted contribution of past attempts
//! - **Concept graph** - symmetric correlations between concepts
//! - **Answer simulator** - probability fusion and outcome sampling
//! - **Record store** - per-user state, simulated time, JSON-lines export
//!
//! ## Example
//!
//! ```rust
//! use anshist_sim::{
//!     PopulationGenerator, ProfileGenerator, RecordStore, SeededIdGenerator, StoreOptions,
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut gen = PopulationGenerator::new(ProfileGenerator::with_defaults()?, SeededIdGenerator);
//! let population = gen.generate(&mut rng, 3, 10, 20)?;
//!
//! let mut store = RecordStore::new(
//!     &population.profiles,
//!     &population.concepts,
//!     &population.questions,
//!     StoreOptions::with_seed(42),
//! );
//! let user = population.profiles[0].id();
//! let record = store.generate_event(user)?;
//! assert_eq!(record.user_id, user);
//! # Ok::<(), anshist_sim::SimError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod concept;
pub mod config;
pub mod curve;
pub mod error;
pub mod experience;
pub mod logging;
pub mod population;
pub mod profile;
pub mod record;
pub mod sanitize;
pub mod simulator;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use concept::ConceptGraph;
pub use curve::{simulate_learning_curve, LearningCurve};
pub use error::{Result, SimError};
pub use experience::{descending_weights, experience_score, learning_contributions, poisson_cdf};
pub use population::{
    IdGenerator, Population, PopulationGenerator, SeededIdGenerator, UuidIdGenerator,
};
pub use profile::{EducationTier, Profile, ProfileGenerator, ProfileParams};
pub use record::{
    Clock, CollectingSink, FixedClock, JsonLinesSink, Record, RecordSink, RecordStore,
    StoreOptions, SystemClock,
};
pub use simulator::{
    AnswerSimulator, ConceptEvidence, Decision, FusionConfig, FusionInput, FusionPolicy,
    ProbabilitySource,
};
pub use types::*;
