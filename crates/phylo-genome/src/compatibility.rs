//! Compatibility distance between two genomes.
//!
//! The distance compares the *expressed* structure of two genomes: enabled
//! node ids, enabled edges aligned by innovation number, and the parameter
//! difference on what they share. Each term is normalised by the larger
//! genome, and the weighted mean of the three terms lies in `[0, 1]`.

use crate::config::GenomeConfig;
use crate::genome::Genome;
use phylo_core::error::{PhyloError, Result};
use phylo_core::types::{InnovationNumber, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coefficients of the distance terms and the speciation threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityConfig {
    /// Weight of the unshared-node fraction.
    pub node_coefficient: f64,
    /// Weight of the unshared-edge fraction.
    pub edge_coefficient: f64,
    /// Weight of the mean parameter difference on shared genes.
    pub parameter_coefficient: f64,
    /// Genomes closer than this to a representative join its species.
    pub threshold: f64,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            node_coefficient: 0.6,
            edge_coefficient: 0.9,
            parameter_coefficient: 0.2,
            threshold: 0.15,
        }
    }
}

impl CompatibilityConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("node_coefficient", self.node_coefficient),
            ("edge_coefficient", self.edge_coefficient),
            ("parameter_coefficient", self.parameter_coefficient),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhyloError::invalid_config(
                    field,
                    value,
                    "must be finite and non-negative",
                ));
            }
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(PhyloError::invalid_config(
                "threshold",
                self.threshold,
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Distance between `a` and `b` (see [`distance`]).
    pub fn distance(&self, a: &Genome, b: &Genome, genome: &GenomeConfig) -> f64 {
        distance(a, b, self, genome)
    }

    pub fn is_compatible(&self, a: &Genome, b: &Genome, genome: &GenomeConfig) -> bool {
        self.distance(a, b, genome) < self.threshold
    }
}

/// Symmetric compatibility distance with `distance(g, g) == 0`.
///
/// - node term: `1 - shared / max(|a|, |b|)` over enabled node ids
/// - edge term: the same over enabled edges keyed by innovation
/// - parameter term: mean of `|w_a - w_b| / width(weight_range)` over
///   shared edges and `|b_a - b_b| / width(bias_range)` over shared biased
///   nodes
pub fn distance(
    a: &Genome,
    b: &Genome,
    compat: &CompatibilityConfig,
    genome: &GenomeConfig,
) -> f64 {
    let nodes_a: BTreeMap<NodeId, Option<f64>> =
        a.enabled_nodes().map(|n| (n.id, n.bias)).collect();
    let nodes_b: BTreeMap<NodeId, Option<f64>> =
        b.enabled_nodes().map(|n| (n.id, n.bias)).collect();
    let edges_a: BTreeMap<InnovationNumber, f64> =
        a.enabled_edges().map(|e| (e.innovation, e.weight)).collect();
    let edges_b: BTreeMap<InnovationNumber, f64> =
        b.enabled_edges().map(|e| (e.innovation, e.weight)).collect();

    let weight_width = genome.weight_range.width();
    let bias_width = genome.bias_range.width();
    let mut differences = Vec::new();

    let mut shared_nodes = 0usize;
    for (id, bias_a) in &nodes_a {
        if let Some(bias_b) = nodes_b.get(id) {
            shared_nodes += 1;
            if let (Some(x), Some(y), true) = (bias_a, bias_b, bias_width > 0.0) {
                differences.push((x - y).abs() / bias_width);
            }
        }
    }
    let mut shared_edges = 0usize;
    for (innovation, weight_a) in &edges_a {
        if let Some(weight_b) = edges_b.get(innovation) {
            shared_edges += 1;
            if weight_width > 0.0 {
                differences.push((weight_a - weight_b).abs() / weight_width);
            }
        }
    }

    let node_term = unshared_fraction(shared_nodes, nodes_a.len().max(nodes_b.len()));
    let edge_term = unshared_fraction(shared_edges, edges_a.len().max(edges_b.len()));
    let parameter_term = if differences.is_empty() {
        0.0
    } else {
        differences.iter().sum::<f64>() / differences.len() as f64
    };

    let total = compat.node_coefficient + compat.edge_coefficient + compat.parameter_coefficient;
    if total <= 0.0 {
        return 0.0;
    }
    (compat.node_coefficient * node_term
        + compat.edge_coefficient * edge_term
        + compat.parameter_coefficient * parameter_term)
        / total
}

fn unshared_fraction(shared: usize, larger: usize) -> f64 {
    if larger == 0 {
        0.0
    } else {
        1.0 - shared as f64 / larger as f64
    }
}
