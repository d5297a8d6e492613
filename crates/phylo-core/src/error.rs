//! Error types for Phylo operations.
//!
//! Ordinary unavailability (nothing to mutate, too few parents) is never an
//! error: those operations report a `bool` or an empty result. The variants
//! here cover caller bugs that must fail fast, and degenerate runtime values
//! that would otherwise poison ranking.

use crate::types::{EdgeId, GenomeId, InnovationNumber, NodeId, NodeRole};
use thiserror::Error;

/// Result type for Phylo operations.
pub type Result<T> = std::result::Result<T, PhyloError>;

/// Errors that can occur during Phylo operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhyloError {
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Evolution error: {0}")]
    Evolution(#[from] EvolutionError),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for PhyloError {
    fn from(e: std::io::Error) -> Self {
        PhyloError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PhyloError {
    fn from(e: serde_json::Error) -> Self {
        PhyloError::Serialization(e.to_string())
    }
}

/// Genome construction and validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenomeError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    #[error("duplicate edge id {0}")]
    DuplicateEdge(EdgeId),
    #[error("edge {edge} loops on node {node}")]
    SelfLoop { edge: EdgeId, node: NodeId },
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },
    #[error("edge {edge} targets input node {node}")]
    EdgeIntoInput { edge: EdgeId, node: NodeId },
    #[error("edge {edge} leaves output node {node}")]
    EdgeFromOutput { edge: EdgeId, node: NodeId },
    #[error("enabled edge {edge} touches disabled node {node}")]
    DisabledEndpoint { edge: EdgeId, node: NodeId },
    #[error("structural key {input}->{output} has more than one enabled edge")]
    DuplicateStructuralKey { input: NodeId, output: NodeId },
    #[error("innovation {0} appears on more than one edge")]
    DuplicateInnovation(InnovationNumber),
    #[error("edge {edge} weight {weight} outside [{min}, {max}]")]
    WeightOutOfRange { edge: EdgeId, weight: f64, min: f64, max: f64 },
    #[error("node {node} bias {bias} outside [{min}, {max}]")]
    BiasOutOfRange { node: NodeId, bias: f64, min: f64, max: f64 },
    #[error("input node {0} carries a bias")]
    InputBias(NodeId),
    #[error("expected {expected} {role} nodes, found {found}")]
    RoleCount { role: NodeRole, expected: usize, found: usize },
    #[error("enabled edges form a cycle through node {0}")]
    Cycle(NodeId),
    #[error("{0} has no fitness value")]
    MissingFitness(GenomeId),
    #[error("parents have different shapes: {a_inputs}x{a_outputs} vs {b_inputs}x{b_outputs}")]
    IncompatibleParents {
        a_inputs: usize,
        a_outputs: usize,
        b_inputs: usize,
        b_outputs: usize,
    },
    #[error("unknown aggregation function '{0}'")]
    UnknownAggregation(String),
    #[error("unknown activation function '{0}'")]
    UnknownActivation(String),
}

/// Phenotype construction and activation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("expected {expected} inputs, got {found}")]
    InvalidInputArity { expected: usize, found: usize },
    #[error("topological sort stalled with {unprocessed} nodes left, starting at {first}")]
    CycleDetected { unprocessed: usize, first: NodeId },
}

/// Fitness evaluation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("{genome} was scored {value}, fitness must be finite")]
    NonFiniteFitness { genome: GenomeId, value: f64 },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("{field} range is inverted: [{min}, {max}]")]
    InvertedRange { field: String, min: f64, max: f64 },
    #[error("{0} must list at least one function")]
    EmptyFunctionPool(String),
}

/// Run-level errors of the generational loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("no generation has been evaluated yet")]
    NoChampion,
    #[error("population is empty and there is no champion to reseed from")]
    PopulationExhausted,
}

// Convenience constructors
impl PhyloError {
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PhyloError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        })
    }

    pub fn inverted_range(field: impl Into<String>, min: f64, max: f64) -> Self {
        PhyloError::Config(ConfigError::InvertedRange {
            field: field.into(),
            min,
            max,
        })
    }

    pub fn input_arity(expected: usize, found: usize) -> Self {
        PhyloError::Network(NetworkError::InvalidInputArity { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_render_with_context() {
        let err: PhyloError = GenomeError::SelfLoop {
            edge: EdgeId(3),
            node: NodeId(7),
        }
        .into();
        assert_eq!(err.to_string(), "Genome error: edge e3 loops on node n7");

        let err = PhyloError::input_arity(2, 3);
        assert_eq!(err.to_string(), "Network error: expected 2 inputs, got 3");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PhyloError = io.into();
        assert!(matches!(err, PhyloError::Io(ref msg) if msg.contains("gone")));
    }
}
