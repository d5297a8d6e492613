//! Phylo Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use phylo_core::prelude::*;
//! ```

pub use crate::types::{
    EdgeId, GenomeId, Generation, InnovationNumber, NodeId, NodeRole, SpeciesId, StructuralKey,
};

pub use crate::functions::{Activation, Aggregation, FunctionRegistry};

pub use crate::phenotype::Phenotype;

pub use crate::error::{
    ConfigError, EvaluationError, EvolutionError, GenomeError, NetworkError, PhyloError, Result,
};
