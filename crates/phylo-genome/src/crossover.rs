//! Crossover — combine two evaluated parents into one child.
//!
//! Edges are aligned by innovation number, never by graph shape:
//! - matching genes (in both parents): a uniformly random parent's copy,
//!   weight and enabled flag together
//! - genes only in the fitter parent: inherited as they are
//! - genes only in the less fit parent: dropped
//!
//! The child must stay acyclic even when enabled flags are mixed from two
//! lineages. Edges enabled on the fitter side are placed first; any other
//! enabled copy that would close a cycle is inherited disabled.

use crate::config::GenomeConfig;
use crate::context::EvolutionContext;
use crate::gene::EdgeGene;
use crate::genome::Genome;
use phylo_core::error::{GenomeError, Result};
use phylo_core::types::{EdgeId, InnovationNumber, NodeId};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Produce a child of `a` and `b`.
///
/// Both parents need a fitness. The parent with the higher fitness is the
/// fitter one; on a tie `a` wins. The child has a new id, no fitness, and
/// passes full validation against `config`.
pub fn crossover(
    a: &Genome,
    b: &Genome,
    config: &GenomeConfig,
    ctx: &mut EvolutionContext,
) -> Result<Genome> {
    let fitness_a = a.require_fitness()?;
    let fitness_b = b.require_fitness()?;
    if a.num_inputs() != b.num_inputs() || a.num_outputs() != b.num_outputs() {
        return Err(GenomeError::IncompatibleParents {
            a_inputs: a.num_inputs(),
            a_outputs: a.num_outputs(),
            b_inputs: b.num_inputs(),
            b_outputs: b.num_outputs(),
        }
        .into());
    }
    let (fitter, other) = if fitness_b > fitness_a { (b, a) } else { (a, b) };

    let other_by_innovation: BTreeMap<InnovationNumber, &EdgeGene> =
        other.edges().map(|e| (e.innovation, e)).collect();
    let mut fitter_edges: Vec<&EdgeGene> = fitter.edges().collect();
    fitter_edges.sort_by_key(|e| e.innovation);

    // (inherited copy, enabled in the fitter parent)
    let mut inherited: Vec<(EdgeGene, bool)> = Vec::with_capacity(fitter_edges.len());
    for edge in fitter_edges {
        let copy = match other_by_innovation.get(&edge.innovation) {
            Some(theirs) if !ctx.rng().gen_bool(0.5) => (*theirs).clone(),
            _ => edge.clone(),
        };
        inherited.push((copy, edge.enabled));
    }

    let mut node_ids: BTreeSet<NodeId> = fitter
        .nodes()
        .filter(|n| !n.is_hidden())
        .map(|n| n.id)
        .collect();
    for (edge, _) in &inherited {
        node_ids.insert(edge.input);
        node_ids.insert(edge.output);
    }

    let mut child = Genome {
        id: ctx.next_genome_id(),
        nodes: BTreeMap::new(),
        edges: BTreeMap::new(),
        next_edge_id: 0,
        fitness: None,
    };
    for id in node_ids {
        if let Some(node) = fitter.node(id) {
            child.push_node(node.clone());
        }
    }

    let (first, rest): (Vec<_>, Vec<_>) = inherited
        .into_iter()
        .partition(|(edge, fitter_enabled)| edge.enabled && *fitter_enabled);
    let mut placed = Vec::new();
    for (mut edge, _) in first.into_iter().chain(rest) {
        if edge.enabled && child.would_create_cycle(edge.input, edge.output) {
            edge.enabled = false;
        }
        if edge.enabled && !enable_endpoints(&mut child, other, &edge) {
            edge.enabled = false;
        }
        let id = EdgeId(placed.len() as u64);
        edge.id = id;
        child.edges.insert(id, edge.clone());
        placed.push(edge);
    }

    // Renumber local ids in innovation order.
    placed.sort_by_key(|e| e.innovation);
    child.edges = placed
        .into_iter()
        .enumerate()
        .map(|(index, mut edge)| {
            edge.id = EdgeId(index as u64);
            (edge.id, edge)
        })
        .collect();
    child.next_edge_id = child.edges.len() as u64;

    child.validate(config)?;
    Ok(child)
}

/// Make sure both endpoints of an enabled edge are enabled in the child,
/// swapping in the other parent's enabled copy of a node where needed.
fn enable_endpoints(child: &mut Genome, other: &Genome, edge: &EdgeGene) -> bool {
    for id in [edge.input, edge.output] {
        let enabled = child.node(id).map(|n| n.enabled).unwrap_or(false);
        if enabled {
            continue;
        }
        match other.node(id) {
            Some(theirs) if theirs.enabled => child.push_node(theirs.clone()),
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::NodeGene;
    use phylo_core::error::PhyloError;
    use phylo_core::functions::{Activation, Aggregation};
    use phylo_core::types::GenomeId;

    fn parents(seed: u64) -> (GenomeConfig, EvolutionContext, Genome, Genome) {
        let config = GenomeConfig::with_shape(2, 1);
        let mut ctx = EvolutionContext::new(&config, seed);
        let a = Genome::initial(&config, &mut ctx).unwrap();
        let b = Genome::initial(&config, &mut ctx).unwrap();
        (config, ctx, a, b)
    }

    #[test]
    fn requires_fitness() {
        let (config, mut ctx, a, mut b) = parents(1);
        b.set_fitness(1.0);
        let err = crossover(&a, &b, &config, &mut ctx).unwrap_err();
        assert_eq!(err, PhyloError::Genome(GenomeError::MissingFitness(a.id())));
    }

    #[test]
    fn excess_genes_come_from_the_fitter_parent_only() {
        let (config, mut ctx, mut a, mut b) = parents(2);
        a.mutate_add_node(&config, &mut ctx);
        b.mutate_add_node(&config, &mut ctx);
        b.mutate_add_node(&config, &mut ctx);
        a.set_fitness(3.0);
        b.set_fitness(1.0);

        let child = crossover(&a, &b, &config, &mut ctx).unwrap();
        let child_innovations: BTreeSet<_> = child.edges().map(|e| e.innovation).collect();
        let fitter_innovations: BTreeSet<_> = a.edges().map(|e| e.innovation).collect();
        assert_eq!(child_innovations, fitter_innovations);
        assert_eq!(child.hidden_count(), a.hidden_count());
        assert!(child.fitness().is_none());
        assert_ne!(child.id(), a.id());
    }

    #[test]
    fn ties_favour_the_first_argument() {
        let (config, mut ctx, mut a, mut b) = parents(3);
        b.mutate_add_node(&config, &mut ctx);
        a.set_fitness(2.0);
        b.set_fitness(2.0);
        let child = crossover(&a, &b, &config, &mut ctx).unwrap();
        assert_eq!(child.edge_count(), a.edge_count());
        assert_eq!(child.hidden_count(), 0);
    }

    #[test]
    fn matching_genes_mix_both_parents() {
        let (config, mut ctx, mut a, mut b) = parents(4);
        a.set_fitness(1.0);
        b.set_fitness(1.0);
        let mut from_b = 0;
        for _ in 0..64 {
            let child = crossover(&a, &b, &config, &mut ctx).unwrap();
            for edge in child.edges() {
                let theirs = b.edges().find(|e| e.innovation == edge.innovation).unwrap();
                if edge.weight == theirs.weight {
                    from_b += 1;
                }
            }
        }
        assert!(from_b > 0 && from_b < 128);
    }

    #[test]
    fn child_edges_are_renumbered_in_innovation_order() {
        let (config, mut ctx, mut a, mut b) = parents(5);
        for _ in 0..4 {
            a.mutate_add_node(&config, &mut ctx);
            a.mutate_add_edge(&config, &mut ctx);
        }
        a.set_fitness(2.0);
        b.set_fitness(1.0);
        let child = crossover(&a, &b, &config, &mut ctx).unwrap();
        let ids: Vec<u64> = child.edges().map(|e| e.id.0).collect();
        assert_eq!(ids, (0..child.edge_count() as u64).collect::<Vec<_>>());
        let innovations: Vec<_> = child.edges().map(|e| e.innovation).collect();
        let mut sorted = innovations.clone();
        sorted.sort();
        assert_eq!(innovations, sorted);
    }

    #[test]
    fn disabled_fitter_node_is_swapped_for_an_enabled_copy() {
        let config = GenomeConfig::with_shape(1, 1);
        let io = || {
            vec![
                NodeGene::input(NodeId(0), Aggregation::Sum, Activation::Identity),
                NodeGene::output(NodeId(1), Aggregation::Sum, Activation::Sigmoid, 0.0),
            ]
        };
        let hidden = NodeGene::hidden(NodeId(2), Aggregation::Sum, Activation::Tanh, 0.0);
        let mut dead = hidden.clone();
        dead.enabled = false;
        let edges = |enabled: bool| {
            let mut into = EdgeGene::new(EdgeId(0), InnovationNumber(0), NodeId(0), NodeId(2), 1.0);
            let mut out = EdgeGene::new(EdgeId(1), InnovationNumber(1), NodeId(2), NodeId(1), 1.0);
            into.enabled = enabled;
            out.enabled = enabled;
            vec![into, out]
        };

        let mut fitter_nodes = io();
        fitter_nodes.push(dead);
        let mut fitter = Genome::new(GenomeId(0), fitter_nodes, edges(false), &config).unwrap();
        let mut other_nodes = io();
        other_nodes.push(hidden);
        let mut other = Genome::new(GenomeId(1), other_nodes, edges(true), &config).unwrap();
        fitter.set_fitness(2.0);
        other.set_fitness(1.0);

        let mut ctx = EvolutionContext::new(&config, 9);
        let mut saw_enabled = false;
        for _ in 0..32 {
            let child = crossover(&fitter, &other, &config, &mut ctx).unwrap();
            let hidden_enabled = child.node(NodeId(2)).unwrap().enabled;
            if child.enabled_edges().count() > 0 {
                assert!(hidden_enabled);
                saw_enabled = true;
            }
        }
        assert!(saw_enabled);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let (config, mut ctx, mut a, _) = parents(6);
        let wide = GenomeConfig::with_shape(3, 1);
        let mut wide_ctx = EvolutionContext::new(&wide, 6);
        let mut b = Genome::initial(&wide, &mut wide_ctx).unwrap();
        a.set_fitness(1.0);
        b.set_fitness(1.0);
        let err = crossover(&a, &b, &config, &mut ctx).unwrap_err();
        assert!(matches!(err, PhyloError::Genome(GenomeError::IncompatibleParents { .. })));
    }
}
