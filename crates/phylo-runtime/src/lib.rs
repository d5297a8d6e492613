//! # Phylo Runtime
//!
//! Phenotype evaluation, speciation and the generational loop.
//!
//! The runtime turns genomes into executable networks, scores them with a
//! caller-supplied evaluation function, groups them into species, and
//! breeds the next generation. Populations can be saved and resumed, and
//! the per-generation fitness history feeds the statistics in [`metrics`].
//!
//! ## Quick Start
//!
//! ```rust
//! use phylo_runtime::prelude::*;
//!
//! let config = PopulationConfig {
//!     population_size: 20,
//!     ..PopulationConfig::with_shape(2, 1)
//! };
//! let mut population = Population::new(config, 7).unwrap();
//!
//! // Reward a high output for the input (1, 1).
//! let evaluate = |net: &mut FeedForwardNetwork| {
//!     net.activate(&[1.0, 1.0]).map(|out| out[0]).unwrap_or(0.0)
//! };
//! let champion = population.run(&evaluate, Termination::generations(3)).unwrap();
//! assert!(champion.fitness().is_some());
//! ```

pub mod metrics;
pub mod network;
pub mod population;
pub mod prelude;
pub mod session;
pub mod species;
