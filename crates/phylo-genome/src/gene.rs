//! Node and edge genes.
//!
//! Genes are never physically removed from a genome. "Removing" a node or
//! an edge flips its `enabled` flag, so the gene keeps its id and
//! innovation number and stays alignable during crossover.

use phylo_core::functions::{Activation, Aggregation};
use phylo_core::types::{EdgeId, InnovationNumber, NodeId, NodeRole, StructuralKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A neuron of the encoded network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    pub id: NodeId,
    pub role: NodeRole,
    pub aggregation: Aggregation,
    pub activation: Activation,
    /// Always `None` for input nodes.
    pub bias: Option<f64>,
    pub enabled: bool,
}

impl NodeGene {
    /// An input node. Input nodes never carry a bias.
    pub fn input(id: NodeId, aggregation: Aggregation, activation: Activation) -> Self {
        Self {
            id,
            role: NodeRole::Input,
            aggregation,
            activation,
            bias: None,
            enabled: true,
        }
    }

    pub fn hidden(id: NodeId, aggregation: Aggregation, activation: Activation, bias: f64) -> Self {
        Self {
            id,
            role: NodeRole::Hidden,
            aggregation,
            activation,
            bias: Some(bias),
            enabled: true,
        }
    }

    pub fn output(id: NodeId, aggregation: Aggregation, activation: Activation, bias: f64) -> Self {
        Self {
            id,
            role: NodeRole::Output,
            aggregation,
            activation,
            bias: Some(bias),
            enabled: true,
        }
    }

    pub fn is_input(&self) -> bool {
        self.role == NodeRole::Input
    }

    pub fn is_hidden(&self) -> bool {
        self.role == NodeRole::Hidden
    }

    pub fn is_output(&self) -> bool {
        self.role == NodeRole::Output
    }
}

/// A weighted connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeGene {
    /// Local id, unique within the owning genome.
    pub id: EdgeId,
    /// Run-wide historical marking shared by every edge with the same key.
    pub innovation: InnovationNumber,
    pub input: NodeId,
    pub output: NodeId,
    pub weight: f64,
    pub enabled: bool,
}

impl EdgeGene {
    pub fn new(
        id: EdgeId,
        innovation: InnovationNumber,
        input: NodeId,
        output: NodeId,
        weight: f64,
    ) -> Self {
        Self {
            id,
            innovation,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// The `(input, output)` pair this edge connects.
    pub fn key(&self) -> StructuralKey {
        StructuralKey::new(self.input, self.output)
    }

    /// Whether the edge starts or ends at `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.input == node || self.output == node
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}/{}", self.id, self.role, self.aggregation, self.activation)?;
        if let Some(bias) = self.bias {
            write!(f, " bias={:.4}", bias)?;
        }
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}

impl fmt::Display for EdgeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} w={:.4}",
            self.id,
            self.innovation,
            self.key(),
            self.weight
        )?;
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}
