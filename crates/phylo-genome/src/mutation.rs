//! Mutation operators.
//!
//! Every operator returns `true` if it changed the genome and `false` when
//! its precondition is unmet (no edge to split, hidden-node cap reached,
//! genome fully connected, ...). An unmet precondition is never an error.
//!
//! Structural operators only ever disable genes; nothing is deleted.

use crate::config::{GenomeConfig, MutationKind};
use crate::context::EvolutionContext;
use crate::gene::{EdgeGene, NodeGene};
use crate::genome::Genome;
use phylo_core::types::{EdgeId, NodeId, StructuralKey};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

impl Genome {
    /// Split a random enabled edge `a -> b` into `a -> new -> b`.
    ///
    /// The old edge is disabled. The incoming edge gets weight 1 and the
    /// outgoing edge inherits the old weight, so the new path starts close
    /// to the connection it replaces.
    pub fn mutate_add_node(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        if self.hidden_count() >= config.max_hidden_nodes {
            return false;
        }
        let candidates: Vec<EdgeId> = self.enabled_edges().map(|e| e.id).collect();
        let Some(&split) = candidates.choose(ctx.rng()) else {
            return false;
        };
        let Some(old) = self.edges.get_mut(&split) else {
            return false;
        };
        old.enabled = false;
        let (input, output, weight) = (old.input, old.output, old.weight);

        let node = ctx.next_node_id();
        self.push_node(NodeGene::hidden(
            node,
            config.hidden_aggregation,
            config.hidden_activation,
            0.0,
        ));
        let first = ctx.innovation(input, node);
        let second = ctx.innovation(node, output);
        self.push_edge(EdgeGene::new(
            EdgeId(0),
            first,
            input,
            node,
            config.weight_range.clamp(1.0),
        ));
        self.push_edge(EdgeGene::new(EdgeId(0), second, node, output, weight));
        trace!(genome = %self.id, %node, split = %split, "add node");
        true
    }

    /// Disable a random enabled hidden node and every edge touching it.
    pub fn mutate_remove_node(&mut self, ctx: &mut EvolutionContext) -> bool {
        let candidates: Vec<NodeId> = self
            .enabled_nodes()
            .filter(|n| n.is_hidden())
            .map(|n| n.id)
            .collect();
        match candidates.choose(ctx.rng()) {
            Some(&node) => self.disable_node(node),
            None => false,
        }
    }

    /// Connect a random unconnected pair of nodes.
    ///
    /// Candidate pairs are shuffled and tried in turn. A pair is rejected
    /// when it already has an enabled edge or when the target is a
    /// predecessor of the source (the edge would close a cycle). If the
    /// pair's key exists as a disabled gene, that gene is re-enabled with a
    /// fresh weight instead of duplicating the innovation.
    pub fn mutate_add_edge(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        let sources: Vec<NodeId> = self
            .enabled_nodes()
            .filter(|n| !n.is_output())
            .map(|n| n.id)
            .collect();
        let targets: Vec<NodeId> = self
            .enabled_nodes()
            .filter(|n| !n.is_input())
            .map(|n| n.id)
            .collect();
        let mut pairs: Vec<(NodeId, NodeId)> = sources
            .iter()
            .flat_map(|&s| targets.iter().map(move |&t| (s, t)))
            .filter(|(s, t)| s != t)
            .collect();
        pairs.shuffle(ctx.rng());

        for (input, output) in pairs {
            let key = StructuralKey::new(input, output);
            let existing = self.edge_by_key(key).map(|e| (e.id, e.enabled));
            if matches!(existing, Some((_, true))) {
                continue;
            }
            if self.would_create_cycle(input, output) {
                continue;
            }
            let weight = config.initial_weight_range.sample(ctx.rng());
            match existing {
                Some((id, _)) => {
                    if let Some(edge) = self.edges.get_mut(&id) {
                        edge.enabled = true;
                        edge.weight = weight;
                    }
                }
                None => {
                    let innovation = ctx.innovation(input, output);
                    self.push_edge(EdgeGene::new(EdgeId(0), innovation, input, output, weight));
                }
            }
            trace!(genome = %self.id, %key, "add edge");
            return true;
        }
        false
    }

    /// Disable a random enabled edge.
    pub fn mutate_remove_edge(&mut self, ctx: &mut EvolutionContext) -> bool {
        match self.random_enabled_edge(ctx) {
            Some(id) => self.disable_edge(id),
            None => false,
        }
    }

    /// Replace a random expressed weight with a fresh draw from the initial range.
    pub fn mutate_reset_weight(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        let Some(id) = self.random_enabled_edge(ctx) else {
            return false;
        };
        let weight = config.initial_weight_range.sample(ctx.rng());
        self.set_weight(id, weight, config)
    }

    /// Multiply a random expressed weight by a factor from the scale range.
    pub fn mutate_scale_weight(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        let Some(id) = self.random_enabled_edge(ctx) else {
            return false;
        };
        let factor = config.weight_scale_range.sample(ctx.rng());
        let weight = self.edges.get(&id).map(|e| e.weight * factor).unwrap_or_default();
        self.set_weight(id, weight, config)
    }

    /// Add uniform noise to a random expressed weight.
    pub fn mutate_perturb_weight(
        &mut self,
        config: &GenomeConfig,
        ctx: &mut EvolutionContext,
    ) -> bool {
        let Some(id) = self.random_enabled_edge(ctx) else {
            return false;
        };
        let power = config.weight_perturb_power;
        let delta = if power > 0.0 {
            ctx.rng().gen_range(-power..=power)
        } else {
            0.0
        };
        let weight = self.edges.get(&id).map(|e| e.weight + delta).unwrap_or_default();
        self.set_weight(id, weight, config)
    }

    /// Replace the bias of a random enabled hidden or output node.
    pub fn mutate_set_bias(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        let Some(id) = self.random_biased_node(ctx) else {
            return false;
        };
        let bias = config.bias_range.sample(ctx.rng());
        self.set_bias(id, bias, config)
    }

    /// Add uniform noise to the bias of a random enabled hidden or output node.
    pub fn mutate_perturb_bias(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> bool {
        let Some(id) = self.random_biased_node(ctx) else {
            return false;
        };
        let power = config.bias_perturb_power;
        let delta = if power > 0.0 {
            ctx.rng().gen_range(-power..=power)
        } else {
            0.0
        };
        let bias = self
            .nodes
            .get(&id)
            .and_then(|n| n.bias)
            .unwrap_or_default()
            + delta;
        self.set_bias(id, bias, config)
    }

    /// Give a random enabled hidden node a different aggregation function.
    pub fn mutate_change_aggregation(
        &mut self,
        config: &GenomeConfig,
        ctx: &mut EvolutionContext,
    ) -> bool {
        let Some(id) = self.random_hidden_node(ctx) else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let options: Vec<_> = config
            .aggregation_pool
            .iter()
            .filter(|a| **a != node.aggregation)
            .copied()
            .collect();
        match options.choose(ctx.rng()) {
            Some(&aggregation) => {
                node.aggregation = aggregation;
                true
            }
            None => false,
        }
    }

    /// Give a random enabled hidden node a different activation function.
    pub fn mutate_change_activation(
        &mut self,
        config: &GenomeConfig,
        ctx: &mut EvolutionContext,
    ) -> bool {
        let Some(id) = self.random_hidden_node(ctx) else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let options: Vec<_> = config
            .activation_pool
            .iter()
            .filter(|a| **a != node.activation)
            .copied()
            .collect();
        match options.choose(ctx.rng()) {
            Some(&activation) => {
                node.activation = activation;
                true
            }
            None => false,
        }
    }

    /// Apply one mutation of the given kind.
    pub fn mutate(
        &mut self,
        kind: MutationKind,
        config: &GenomeConfig,
        ctx: &mut EvolutionContext,
    ) -> bool {
        match kind {
            MutationKind::AddNode => self.mutate_add_node(config, ctx),
            MutationKind::RemoveNode => self.mutate_remove_node(ctx),
            MutationKind::AddEdge => self.mutate_add_edge(config, ctx),
            MutationKind::RemoveEdge => self.mutate_remove_edge(ctx),
            MutationKind::ResetWeight => self.mutate_reset_weight(config, ctx),
            MutationKind::ScaleWeight => self.mutate_scale_weight(config, ctx),
            MutationKind::PerturbWeight => self.mutate_perturb_weight(config, ctx),
            MutationKind::SetBias => self.mutate_set_bias(config, ctx),
            MutationKind::PerturbBias => self.mutate_perturb_bias(config, ctx),
            MutationKind::ChangeAggregation => self.mutate_change_aggregation(config, ctx),
            MutationKind::ChangeActivation => self.mutate_change_activation(config, ctx),
        }
    }

    /// Roll the probability table `mutation_rolls` times and apply whatever
    /// each roll selects. Inapplicable draws are skipped. Returns the number
    /// of mutations that changed the genome.
    pub fn random_mutation(&mut self, config: &GenomeConfig, ctx: &mut EvolutionContext) -> usize {
        let span = config.mutation_rates.total().max(1.0);
        let mut applied = 0;
        for _ in 0..config.mutation_rolls {
            let point = ctx.rng().gen::<f64>() * span;
            if let Some(kind) = config.mutation_rates.select(point) {
                if self.mutate(kind, config, ctx) {
                    applied += 1;
                }
            }
        }
        applied
    }

    fn random_enabled_edge(&self, ctx: &mut EvolutionContext) -> Option<EdgeId> {
        let candidates: Vec<EdgeId> = self.enabled_edges().map(|e| e.id).collect();
        candidates.choose(ctx.rng()).copied()
    }

    fn random_biased_node(&self, ctx: &mut EvolutionContext) -> Option<NodeId> {
        let candidates: Vec<NodeId> = self
            .enabled_nodes()
            .filter(|n| !n.is_input())
            .map(|n| n.id)
            .collect();
        candidates.choose(ctx.rng()).copied()
    }

    fn random_hidden_node(&self, ctx: &mut EvolutionContext) -> Option<NodeId> {
        let candidates: Vec<NodeId> = self
            .enabled_nodes()
            .filter(|n| n.is_hidden())
            .map(|n| n.id)
            .collect();
        candidates.choose(ctx.rng()).copied()
    }

    fn set_weight(&mut self, id: EdgeId, weight: f64, config: &GenomeConfig) -> bool {
        match self.edges.get_mut(&id) {
            Some(edge) => {
                edge.weight = config.weight_range.clamp(weight);
                true
            }
            None => false,
        }
    }

    fn set_bias(&mut self, id: NodeId, bias: f64, config: &GenomeConfig) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if !node.is_input() => {
                node.bias = Some(config.bias_range.clamp(bias));
                true
            }
            _ => false,
        }
    }
}
