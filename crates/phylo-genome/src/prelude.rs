//! Phylo Genome Prelude — convenient imports for common usage.
//!
//! ```rust
//! use phylo_genome::prelude::*;
//! ```

pub use crate::compatibility::{distance, CompatibilityConfig};
pub use crate::config::{GenomeConfig, InitialTopology, MutationKind, MutationRates, ValueRange};
pub use crate::context::{Counters, EvolutionContext};
pub use crate::crossover::crossover;
pub use crate::gene::{EdgeGene, NodeGene};
pub use crate::genome::Genome;
pub use crate::innovation::{InnovationRecord, InnovationTracker};

pub use phylo_core::prelude::*;
