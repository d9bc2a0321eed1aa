//! End-to-end tests for population generation, event simulation and export.

mod common;

use std::collections::HashSet;
use std::fs;

use anshist_sim::{
    CollectingSink, JsonLinesSink, Record, RecordStore, SimError, QUESTION_OPTIONS,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use common::{fixed_options, minimal_population, seeded_population, FIXED_TIMESTAMP};

fn drive(store: &mut RecordStore<'_>, user_ids: &[&str], events: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..events {
        let user = user_ids.choose(&mut rng).expect("non-empty population");
        store.generate_event(user).expect("known user");
    }
}

#[test]
fn test_single_event_minimal_population() {
    let pop = minimal_population();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(42));

    let record = store.generate_event("user-1").unwrap();

    assert_eq!(store.record_count(), 1);
    assert_eq!(record.user_id, "user-1");
    assert_eq!(record.question_id, "question-1");
    assert_eq!(record.concept_ids, pop.questions[0].concepts);
    assert!(QUESTION_OPTIONS.contains(&record.user_answer));
    assert_eq!(record.correct_answer, pop.questions[0].answer_for(record.difficulty));
    assert_eq!(record.timestamp.timestamp(), FIXED_TIMESTAMP);
    assert!((1..=15 * 60 + 59).contains(&record.time_spent));
}

#[test]
fn test_unknown_user_rejected() {
    let pop = minimal_population();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(42));
    let err = store.generate_event("user-404").unwrap_err();
    assert!(matches!(err, SimError::NotFound(_)));
    assert_eq!(store.record_count(), 0);
}

#[test]
fn test_unknown_concept_correlation_rejected() {
    let pop = minimal_population();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(42));
    assert!(matches!(
        store.correlate("concept-1", "concept-x", 0.5),
        Err(SimError::NotFound(_))
    ));
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let pop = seeded_population(7, 5, 30, 80);
    let ids: Vec<&str> = pop.user_ids().collect();

    let mut a = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(11));
    let mut b = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(11));
    drive(&mut a, &ids, 300, 5);
    drive(&mut b, &ids, 300, 5);

    let mut sa = CollectingSink::default();
    let mut sb = CollectingSink::default();
    assert_eq!(a.export(&mut sa).unwrap(), 300);
    b.export(&mut sb).unwrap();
    assert_eq!(sa.records, sb.records);
}

#[test]
fn test_timestamps_non_decreasing_per_user() {
    let pop = seeded_population(3, 4, 20, 40);
    let ids: Vec<&str> = pop.user_ids().collect();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(3));

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut last = std::collections::HashMap::new();
    for _ in 0..400 {
        let user = *ids.choose(&mut rng).unwrap();
        let record = store.generate_event(user).unwrap();
        if let Some(prev) = last.insert(user, record.timestamp) {
            assert!(record.timestamp >= prev);
        }
    }
}

#[test]
fn test_export_order_and_format() {
    let pop = seeded_population(5, 3, 10, 6);
    let ids: Vec<&str> = pop.user_ids().collect();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(5));
    drive(&mut store, &ids, 60, 9);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.jsonl");
    assert_eq!(store.export_to_path(&path).unwrap(), 60);

    let text = fs::read_to_string(&path).unwrap();
    let records: Vec<Record> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 60);

    // users appear in population order, each as one contiguous block
    let mut user_order: Vec<&str> = Vec::new();
    for r in &records {
        if user_order.last() != Some(&r.user_id.as_str()) {
            user_order.push(&r.user_id);
        }
    }
    let expected: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| user_order.contains(id))
        .collect();
    assert_eq!(user_order, expected);

    let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    for key in [
        "UserID",
        "QuestionID",
        "ConceptIDs",
        "DifficultyLevel",
        "CorrectAnswer",
        "UserAnswer",
        "TimeSpent",
        "TimeStamp",
    ] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert!(first["TimeStamp"].is_f64());
}

#[test]
fn test_export_twice_identical() {
    let pop = seeded_population(8, 3, 15, 30);
    let ids: Vec<&str> = pop.user_ids().collect();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(8));
    drive(&mut store, &ids, 100, 2);

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.jsonl");
    let b = dir.path().join("b.jsonl");
    store.export_to_path(&a).unwrap();
    store.export_to_path(&b).unwrap();

    let la: HashSet<String> = fs::read_to_string(&a).unwrap().lines().map(String::from).collect();
    let lb: HashSet<String> = fs::read_to_string(&b).unwrap().lines().map(String::from).collect();
    assert_eq!(la, lb);
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn test_json_lines_sink_counts() {
    let pop = minimal_population();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(1));
    for _ in 0..5 {
        store.generate_event("user-1").unwrap();
    }
    let mut buf = Vec::new();
    {
        let mut sink = JsonLinesSink::new(&mut buf);
        assert_eq!(store.export(&mut sink).unwrap(), 5);
        assert_eq!(sink.written(), 5);
    }
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.ends_with('\n'));
}

#[test]
fn test_repeat_within_day_probability() {
    let pop = minimal_population();
    let mut store = RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(4));
    let record = store.generate_event("user-1").unwrap();
    let soon = record.timestamp + chrono::Duration::hours(23);
    for luck in [false, true] {
        let p = store
            .probe_probability("user-1", "question-1", soon, luck)
            .unwrap();
        assert_eq!(p, 0.90);
    }
}

#[test]
fn test_parallel_batch_matches_sequential() {
    let pop = seeded_population(12, 6, 25, 50);
    let ids: Vec<&str> = pop.user_ids().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let plan: Vec<&str> = (0..500).map(|_| *ids.choose(&mut rng).unwrap()).collect();

    let mut sequential =
        RecordStore::new(&pop.profiles, &pop.concepts, &pop.questions, fixed_options(31));
    let mut parallel = RecordStore::new(
        &pop.profiles,
        &pop.concepts,
        &pop.questions,
        anshist_sim::StoreOptions {
            parallel: true,
            ..fixed_options(31)
        },
    );
    sequential.generate_events(&plan).unwrap();
    parallel.generate_events(&plan).unwrap();

    let mut a = CollectingSink::default();
    let mut b = CollectingSink::default();
    sequential.export(&mut a).unwrap();
    parallel.export(&mut b).unwrap();
    assert_eq!(a.records.len(), 500);
    assert_eq!(a.records, b.records);
}
