//! # Phylo
//!
//! Neuroevolution of augmenting topologies: network structure and weights
//! evolve together, starting from minimal networks and growing only where
//! growth pays off.
//!
//! ## Quick Start
//!
//! ```rust
//! use phylo::prelude::*;
//!
//! const XOR: [([f64; 2], f64); 4] = [
//!     ([0.0, 0.0], 0.0),
//!     ([0.0, 1.0], 1.0),
//!     ([1.0, 0.0], 1.0),
//!     ([1.0, 1.0], 0.0),
//! ];
//!
//! let mut config = PopulationConfig::with_shape(2, 1);
//! config.population_size = 50;
//! config.genome.initial_hidden_nodes = 2;
//!
//! let mut population = Population::new(config, 42).unwrap();
//! let fitness = |net: &mut FeedForwardNetwork| {
//!     4.0 - XOR
//!         .iter()
//!         .map(|(x, y)| (net.activate(x).map_or(1.0, |o| o[0]) - y).powi(2))
//!         .sum::<f64>()
//! };
//! let champion = population.run(&fitness, Termination::either(5, 3.99)).unwrap();
//! println!("champion: {:?}", champion.fitness());
//! ```
//!
//! ## Architecture
//!
//! Phylo is organized into several crates:
//!
//! - [`phylo_core`](crate::core) - Ids, the function library, the error taxonomy and the
//!   [`Phenotype`](phylo_core::phenotype::Phenotype) contract
//! - [`phylo_genome`](crate::genome) - Genes, genomes, mutation, crossover, innovation
//!   tracking and compatibility distance
//! - [`phylo_runtime`](crate::runtime) - Feed-forward networks, species, the population
//!   loop, sessions and statistics
//!
//! ## Key Concepts
//!
//! | Concept | What It Does |
//! |---------|--------------|
//! | Innovation number | Names an edge shape run-wide so crossover can align genes |
//! | Species | Groups similar genomes so new structure is not outcompeted at birth |
//! | Fitness sharing | Splits offspring between species by recent average fitness |
//! | Stagnation | Removes species that stopped improving |
//! | Evolution context | Holds the innovation table, id counters and the seeded RNG of one run |
//!
//! ## Session Persistence
//!
//! Save a population and resume it later on the same random stream:
//!
//! ```rust,ignore
//! use phylo::prelude::*;
//! use std::path::Path;
//!
//! save_to_path(&population, Path::new(".phylo/current.json")).unwrap();
//! let mut resumed = load_from_path(Path::new(".phylo/current.json")).unwrap();
//! resumed.run(&fitness, Termination::generations(100)).unwrap();
//! ```

// Re-export all subcrates
pub use phylo_core as core;
pub use phylo_genome as genome;
pub use phylo_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use phylo::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use phylo_core::types::{
        EdgeId, Generation, GenomeId, InnovationNumber, NodeId, NodeRole, SpeciesId,
        StructuralKey,
    };
    pub use phylo_core::functions::{Activation, Aggregation, FunctionRegistry};

    // Core traits
    pub use phylo_core::phenotype::Phenotype;

    // Error types
    pub use phylo_core::error::{PhyloError, Result};

    // Genome
    pub use phylo_genome::compatibility::{distance, CompatibilityConfig};
    pub use phylo_genome::config::{
        GenomeConfig, InitialTopology, MutationKind, MutationRates, ValueRange,
    };
    pub use phylo_genome::context::EvolutionContext;
    pub use phylo_genome::crossover::crossover;
    pub use phylo_genome::gene::{EdgeGene, NodeGene};
    pub use phylo_genome::genome::Genome;

    // Runtime
    pub use phylo_runtime::network::FeedForwardNetwork;
    pub use phylo_runtime::population::{
        GenerationReport, Population, PopulationConfig, Termination,
    };
    pub use phylo_runtime::species::Species;
    pub use phylo_runtime::session::{
        load, load_from_path, save, save_to_path, PopulationState, SessionMetadata,
    };
    pub use phylo_runtime::metrics::GenerationStats;
}
