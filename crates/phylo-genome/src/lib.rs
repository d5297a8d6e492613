//! # Phylo Genome
//!
//! The genetic encoding of the Phylo neuroevolution engine.
//!
//! A [`Genome`](genome::Genome) is a set of node genes and edge genes. Each
//! edge carries an innovation number handed out by the run's
//! [`InnovationTracker`](innovation::InnovationTracker), which lets
//! [`crossover`](crossover::crossover) align two independently mutated
//! graphs without comparing their shapes.
//!
//! All run-wide state (innovation table, id counters, random source) lives
//! in one [`EvolutionContext`](context::EvolutionContext) passed explicitly
//! to every operation that needs it.
//!
//! ## Quick Start
//!
//! ```rust
//! use phylo_genome::prelude::*;
//!
//! let config = GenomeConfig::with_shape(2, 1);
//! let mut ctx = EvolutionContext::new(&config, 42);
//! let mut genome = Genome::initial(&config, &mut ctx).unwrap();
//!
//! assert!(genome.mutate_add_node(&config, &mut ctx));
//! assert!(!genome.has_cycle());
//! ```

pub mod compatibility;
pub mod config;
pub mod context;
pub mod crossover;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod mutation;
pub mod prelude;
