//! # Phylo Core
//!
//! Shared vocabulary for the Phylo neuroevolution engine:
//!
//! - **Identifiers** — node, edge, innovation, genome and species ids
//! - **Function library** — the closed set of aggregation and activation
//!   functions a node can carry, resolved by name through [`functions::FunctionRegistry`]
//! - **Errors** — the typed error taxonomy shared by every crate
//! - **Phenotype** — the activation contract evaluation callbacks rely on
//!
//! ## Quick Start
//!
//! ```rust
//! use phylo_core::prelude::*;
//!
//! let act = FunctionRegistry::resolve_activation("sigmoid").unwrap();
//! assert_eq!(act.apply(0.0), 0.5);
//!
//! let key = StructuralKey::new(NodeId(0), NodeId(2));
//! assert_eq!(key.to_string(), "n0->n2");
//! ```

pub mod error;
pub mod functions;
pub mod phenotype;
pub mod prelude;
pub mod types;
