//! Phylo Runtime Prelude — convenient imports for common usage.
//!
//! ```rust
//! use phylo_runtime::prelude::*;
//! ```

// Re-export phenotype
pub use crate::network::FeedForwardNetwork;

// Re-export population
pub use crate::population::{
    GenerationPhase, GenerationReport, Population, PopulationConfig, Termination,
};
pub use crate::species::Species;

// Re-export session
pub use crate::session::{
    load, load_from_path, save, save_to_path, ContextState, PopulationState, SerializedGenome,
    SerializedSpecies, SessionMetadata,
};

// Re-export metrics
pub use crate::metrics::GenerationStats;

pub use phylo_genome::prelude::*;
