use std::process::ExitCode;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use anshist_sim::config::{RunMode, SimConfig};
use anshist_sim::logging::init_tracing;
use anshist_sim::{
    simulate_learning_curve, PopulationGenerator, ProfileGenerator, RecordStore, Result,
    SeededIdGenerator, StoreOptions, SystemClock,
};

fn run_records(config: &SimConfig) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut generator = PopulationGenerator::new(ProfileGenerator::with_defaults()?, SeededIdGenerator);
    let population = generator.generate(&mut rng, config.users, config.concepts, config.questions)?;

    let mut store = RecordStore::new(
        &population.profiles,
        &population.concepts,
        &population.questions,
        StoreOptions {
            seed: config.seed,
            fusion: config.fusion,
            clock: Arc::new(SystemClock),
            parallel: config.parallel,
        },
    );

    let user_ids: Vec<&str> = population.user_ids().collect();
    let plan: Vec<&str> = (0..config.events)
        .filter_map(|_| user_ids.choose(&mut rng).copied())
        .collect();
    store.generate_events(&plan)?;

    store.export_to_path(&config.output)?;
    Ok(())
}

fn run_curves(config: &SimConfig) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let generator = ProfileGenerator::with_defaults()?;

    for trial in 1..=config.curve_trials {
        let curve = simulate_learning_curve(
            &mut rng,
            &generator,
            &format!("trial-{trial}"),
            config.curve_questions,
        )?;
        tracing::info!(
            trial,
            age = curve.profile.age(),
            education = ?curve.profile.education(),
            compound_index = curve.profile.compound_index(),
            score = curve.accuracy(),
            score_first_half = curve.first_half_accuracy(),
            score_last_half = curve.last_half_accuracy(),
            "learning curve"
        );
        println!("{}", serde_json::to_string(&curve)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = SimConfig::from_env();
    let _log_guard = init_tracing(&config.log_level, config.log_dir.as_deref());

    tracing::info!(
        seed = config.seed,
        users = config.users,
        concepts = config.concepts,
        questions = config.questions,
        events = config.events,
        policy = ?config.fusion.policy,
        "simulation starting"
    );

    let result = match config.mode {
        RunMode::Records => run_records(&config),
        RunMode::Curve => run_curves(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
