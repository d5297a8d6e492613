//! Save/load round trips through bytes and through files.

use phylo_runtime::prelude::*;

fn evaluate(network: &mut FeedForwardNetwork) -> f64 {
    let a = network.activate(&[0.0, 1.0]).map_or(0.0, |o| o[0]);
    let b = network.activate(&[1.0, 1.0]).map_or(0.0, |o| o[0]);
    a + (1.0 - b)
}

fn evolved(seed: u64, generations: u64) -> Population {
    let config = PopulationConfig {
        population_size: 40,
        ..PopulationConfig::with_shape(2, 1)
    };
    let mut population = Population::new(config, seed).expect("population");
    population
        .run(&evaluate, Termination::generations(generations))
        .expect("run");
    population
}

fn membership(population: &Population) -> Vec<(SpeciesId, Vec<GenomeId>)> {
    population
        .species()
        .iter()
        .map(|s| (s.id(), s.members().iter().map(|g| g.id()).collect()))
        .collect()
}

#[test]
fn bytes_round_trip_preserves_the_population() {
    let population = evolved(21, 6);
    let bytes = save(&population).expect("save");
    let restored = load(&bytes).expect("load");

    assert_eq!(restored.generation(), population.generation());
    assert_eq!(restored.champion(), population.champion());
    assert_eq!(
        restored.context().innovations().records(),
        population.context().innovations().records()
    );
    assert_eq!(
        restored.context().innovations().next_innovation(),
        population.context().innovations().next_innovation()
    );
    assert_eq!(restored.context().counters(), population.context().counters());
    assert_eq!(membership(&restored), membership(&population));
    assert_eq!(restored.history(), population.history());
    assert_eq!(restored.reports(), population.reports());
    for (a, b) in restored.species().iter().zip(population.species()) {
        assert_eq!(a.representative(), b.representative());
        assert_eq!(a.ancestors(), b.ancestors());
        assert_eq!(a.fitness_history(), b.fitness_history());
        assert_eq!(a.age(), b.age());
    }
}

#[test]
fn resumed_run_matches_an_uninterrupted_one() {
    let mut straight = evolved(33, 4);
    straight
        .run(&evaluate, Termination::generations(8))
        .expect("continue");

    let paused = evolved(33, 4);
    let mut resumed = load(&save(&paused).expect("save")).expect("load");
    resumed
        .run(&evaluate, Termination::generations(8))
        .expect("continue");

    assert_eq!(resumed.reports(), straight.reports());
    assert_eq!(resumed.champion(), straight.champion());
}

#[test]
fn file_round_trip_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("runs").join("xor").join("session.json");
    let population = evolved(5, 3);

    save_to_path(&population, &path).expect("save to path");
    assert!(path.exists());

    let restored = load_from_path(&path).expect("load from path");
    assert_eq!(restored.champion(), population.champion());
    assert_eq!(membership(&restored), membership(&population));

    let json = std::fs::read_to_string(&path).expect("read");
    let state: PopulationState = serde_json::from_str(&json).expect("parse");
    assert_eq!(state.metadata.generation, 3);
    assert_eq!(state.metadata.genome_count, population.len());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PhyloError::Io(_)));
}
