//! Learner profile model
//!
//! A profile holds the static latent attributes of one simulated learner and
//! derives a single bounded ability scalar, the compound index.
//!
//! Formulas:
//! - currentAbility      = baseAbility     * (1 - 0.003)^|age - 20|
//! - currentMemoryIndex  = baseMemoryIndex * (1 - 0.005)^|age - 20|
//! - compoundIndex       = tier * (currentAbility + currentMemoryIndex) / (3 * 300)
//!
//! Sampling:
//! - age ~ Beta(2, 5) rescaled to [15, 60]
//! - education tier ~ Categorical {1: 0.55, 2: 0.35, 3: 0.10}
//! - base ability ~ N(100, 15), base memory index ~ N(100, 20), truncated to integers

use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::sanitize::sanitize_probability;
use crate::types::UserId;

// ==================== Constants ====================

/// Age at which ability and memory peak
pub const PEAK_AGE: u32 = 20;

/// Yearly relative decay of ability away from the peak age
const ABILITY_DECAY_RATE: f64 = 0.003;

/// Yearly relative decay of memory index away from the peak age
const MEMORY_DECAY_RATE: f64 = 0.005;

/// Nominal ceiling of ability + memory index (150 + 150)
const COMPOUND_SCORE_CEILING: f64 = 300.0;

// ==================== Data Structures ====================

/// Education tier, ordinal 1..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EducationTier {
    College,
    GradSchool,
    Phd,
}

impl EducationTier {
    pub const ALL: [EducationTier; 3] = [Self::College, Self::GradSchool, Self::Phd];

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::College => 1.0,
            Self::GradSchool => 2.0,
            Self::Phd => 3.0,
        }
    }

    pub fn max_multiplier() -> f64 {
        Self::Phd.multiplier()
    }
}

/// Immutable learner profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    id: UserId,
    age: u32,
    education: EducationTier,
    base_ability: i32,
    base_memory_index: i32,
}

impl Profile {
    pub fn new(
        id: impl Into<UserId>,
        age: u32,
        education: EducationTier,
        base_ability: i32,
        base_memory_index: i32,
    ) -> Self {
        Self {
            id: id.into(),
            age,
            education,
            base_ability,
            base_memory_index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn education(&self) -> EducationTier {
        self.education
    }

    pub fn base_ability(&self) -> i32 {
        self.base_ability
    }

    pub fn base_memory_index(&self) -> i32 {
        self.base_memory_index
    }

    fn years_from_peak(&self) -> i32 {
        (self.age as i32 - PEAK_AGE as i32).abs()
    }

    /// Age-decayed ability
    pub fn current_ability(&self) -> f64 {
        self.base_ability as f64 * (1.0 - ABILITY_DECAY_RATE).powi(self.years_from_peak())
    }

    /// Age-decayed memory index
    pub fn current_memory_index(&self) -> f64 {
        self.base_memory_index as f64 * (1.0 - MEMORY_DECAY_RATE).powi(self.years_from_peak())
    }

    /// Normalized ability scalar in [0, 1]
    pub fn compound_index(&self) -> f64 {
        let total = self.education.multiplier() * (self.current_ability() + self.current_memory_index());
        let ceiling = EducationTier::max_multiplier() * COMPOUND_SCORE_CEILING;
        sanitize_probability(total / ceiling)
    }
}

// ==================== Generator ====================

/// Distribution parameters for profile sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileParams {
    pub age_min: u32,
    pub age_max: u32,
    pub age_alpha: f64,
    pub age_beta: f64,
    pub ability_mean: f64,
    pub ability_std: f64,
    pub memory_mean: f64,
    pub memory_std: f64,
    /// Weights for College, GradSchool, Phd
    pub tier_weights: [f64; 3],
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            age_min: 15,
            age_max: 60,
            age_alpha: 2.0,
            age_beta: 5.0,
            ability_mean: 100.0,
            ability_std: 15.0,
            memory_mean: 100.0,
            memory_std: 20.0,
            tier_weights: [0.55, 0.35, 0.10],
        }
    }
}

/// Samples profiles from the population distributions
#[derive(Debug, Clone)]
pub struct ProfileGenerator {
    age_min: u32,
    age_span: f64,
    age: Beta<f64>,
    tier: WeightedIndex<f64>,
    ability: Normal<f64>,
    memory: Normal<f64>,
}

impl ProfileGenerator {
    pub fn new(params: ProfileParams) -> Result<Self> {
        if params.age_max < params.age_min {
            return Err(SimError::InvalidArgument(format!(
                "age_max {} is below age_min {}",
                params.age_max, params.age_min
            )));
        }
        let age = Beta::new(params.age_alpha, params.age_beta)
            .map_err(|e| SimError::InvalidArgument(format!("age distribution: {e}")))?;
        let tier = WeightedIndex::new(params.tier_weights)
            .map_err(|e| SimError::InvalidArgument(format!("tier weights: {e}")))?;
        let ability = Normal::new(params.ability_mean, params.ability_std)
            .map_err(|e| SimError::InvalidArgument(format!("ability distribution: {e}")))?;
        let memory = Normal::new(params.memory_mean, params.memory_std)
            .map_err(|e| SimError::InvalidArgument(format!("memory distribution: {e}")))?;

        Ok(Self {
            age_min: params.age_min,
            age_span: (params.age_max - params.age_min) as f64,
            age,
            tier,
            ability,
            memory,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ProfileParams::default())
    }

    pub fn sample_age<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let v = self.age.sample(rng);
        (v * self.age_span) as u32 + self.age_min
    }

    pub fn sample_education<R: Rng + ?Sized>(&self, rng: &mut R) -> EducationTier {
        EducationTier::ALL[self.tier.sample(rng)]
    }

    pub fn sample_base_ability<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        self.ability.sample(rng) as i32
    }

    pub fn sample_base_memory_index<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        self.memory.sample(rng) as i32
    }

    /// Sample one profile with the given id
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, id: impl Into<UserId>) -> Profile {
        let age = self.sample_age(rng);
        let education = self.sample_education(rng);
        let base_ability = self.sample_base_ability(rng);
        let base_memory_index = self.sample_base_memory_index(rng);
        Profile::new(id, age, education, base_ability, base_memory_index)
    }
}
