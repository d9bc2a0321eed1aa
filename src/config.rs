use std::path::PathBuf;

use crate::simulator::{FusionConfig, FusionPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Population run exported as JSON lines
    Records,
    /// Learning-curve demo for independent learners
    Curve,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub users: usize,
    pub concepts: usize,
    pub questions: usize,
    pub events: usize,
    pub seed: u64,
    pub output: PathBuf,
    pub fusion: FusionConfig,
    pub parallel: bool,
    pub mode: RunMode,
    pub curve_trials: usize,
    pub curve_questions: usize,
    pub log_level: String,
    /// Directory for daily rolling log files; `None` logs to stderr only
    pub log_dir: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn file_log_dir(enabled: Option<bool>, dir: Option<String>) -> Option<PathBuf> {
    match enabled {
        Some(true) => Some(dir.map_or_else(|| PathBuf::from("./logs"), PathBuf::from)),
        _ => None,
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            users: 10,
            concepts: 1000,
            questions: 5000,
            events: 1000,
            seed: rand::random(),
            output: PathBuf::from("output.json"),
            fusion: FusionConfig::default(),
            parallel: false,
            mode: RunMode::Records,
            curve_trials: 10,
            curve_questions: 20,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let policy = std::env::var("SIM_POLICY")
            .ok()
            .and_then(|v| FusionPolicy::parse(&v))
            .unwrap_or(defaults.fusion.policy);

        let mode = match std::env::var("SIM_MODE").ok().as_deref().map(str::trim) {
            Some("curve") => RunMode::Curve,
            _ => RunMode::Records,
        };

        Self {
            users: env_parse("SIM_USERS").unwrap_or(defaults.users),
            concepts: env_parse("SIM_CONCEPTS").unwrap_or(defaults.concepts),
            questions: env_parse("SIM_QUESTIONS").unwrap_or(defaults.questions),
            events: env_parse("SIM_EVENTS").unwrap_or(defaults.events),
            seed: env_parse("SIM_SEED").unwrap_or(defaults.seed),
            output: std::env::var("SIM_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output),
            fusion: FusionConfig {
                policy,
                concept_transfer: env_flag("SIM_CONCEPT_TRANSFER")
                    .unwrap_or(defaults.fusion.concept_transfer),
            },
            parallel: env_flag("SIM_PARALLEL").unwrap_or(defaults.parallel),
            mode,
            curve_trials: env_parse("SIM_CURVE_TRIALS").unwrap_or(defaults.curve_trials),
            curve_questions: env_parse("SIM_CURVE_QUESTIONS").unwrap_or(defaults.curve_questions),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: file_log_dir(env_flag("ENABLE_FILE_LOGS"), std::env::var("LOG_DIR").ok())
                .or(defaults.log_dir),
        }
    }
}
