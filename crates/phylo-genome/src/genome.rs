//! Genome — the genetic encoding of one candidate network.
//!
//! Node and edge genes live in id-keyed ordered maps owned by the genome.
//! Ordered maps keep iteration (and therefore every random choice made
//! over them) deterministic for a given seed.
//!
//! Invariants, checked by [`Genome::new`] and maintained by every mutation
//! and by crossover:
//! - exactly the configured number of enabled input and output nodes
//! - no self-loops, no dangling edges, no edge into an input node or out of
//!   an output node
//! - every enabled edge joins two enabled nodes
//! - at most one enabled edge per structural key, one edge per innovation
//! - the enabled subgraph is acyclic

use crate::config::{GenomeConfig, InitialTopology};
use crate::context::EvolutionContext;
use crate::gene::{EdgeGene, NodeGene};
use phylo_core::error::{GenomeError, PhyloError, Result};
use phylo_core::types::{EdgeId, GenomeId, NodeId, NodeRole, StructuralKey};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// One candidate network: node genes, edge genes and an optional fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    pub(crate) id: GenomeId,
    pub(crate) nodes: BTreeMap<NodeId, NodeGene>,
    pub(crate) edges: BTreeMap<EdgeId, EdgeGene>,
    pub(crate) next_edge_id: u64,
    pub(crate) fitness: Option<f64>,
}

impl Genome {
    /// Build a genome from explicit genes, validating every invariant.
    pub fn new(
        id: GenomeId,
        nodes: Vec<NodeGene>,
        edges: Vec<EdgeGene>,
        config: &GenomeConfig,
    ) -> Result<Self> {
        let mut node_map = BTreeMap::new();
        for node in nodes {
            let node_id = node.id;
            if node_map.insert(node_id, node).is_some() {
                return Err(GenomeError::DuplicateNode(node_id).into());
            }
        }
        let mut edge_map = BTreeMap::new();
        for edge in edges {
            let edge_id = edge.id;
            if edge_map.insert(edge_id, edge).is_some() {
                return Err(GenomeError::DuplicateEdge(edge_id).into());
            }
        }
        let next_edge_id = edge_map.keys().next_back().map(|id| id.0 + 1).unwrap_or(0);

        let genome = Self {
            id,
            nodes: node_map,
            edges: edge_map,
            next_edge_id,
            fitness: None,
        };
        genome.validate(config)?;
        Ok(genome)
    }

    /// A first-generation genome shaped by `config`.
    ///
    /// All genomes built this way share node ids and innovation numbers, so
    /// the whole first generation aligns gene for gene.
    pub fn initial(config: &GenomeConfig, ctx: &mut EvolutionContext) -> Result<Self> {
        config.validate()?;
        let id = ctx.next_genome_id();
        let num_inputs = config.num_inputs as u64;
        let num_outputs = config.num_outputs as u64;
        let num_hidden = config.initial_hidden_nodes as u64;

        let inputs: Vec<NodeId> = (0..num_inputs).map(NodeId).collect();
        let outputs: Vec<NodeId> = (num_inputs..num_inputs + num_outputs).map(NodeId).collect();
        let hidden: Vec<NodeId> = (num_inputs + num_outputs..num_inputs + num_outputs + num_hidden)
            .map(NodeId)
            .collect();

        let mut nodes = Vec::with_capacity(inputs.len() + outputs.len() + hidden.len());
        for &node in &inputs {
            nodes.push(NodeGene::input(node, config.input_aggregation, config.input_activation));
        }
        for &node in &outputs {
            nodes.push(NodeGene::output(
                node,
                config.output_aggregation,
                config.output_activation,
                0.0,
            ));
        }
        for &node in &hidden {
            nodes.push(NodeGene::hidden(
                node,
                config.hidden_aggregation,
                config.hidden_activation,
                0.0,
            ));
        }

        let mut pairs = Vec::new();
        if config.initial_topology == InitialTopology::FullyConnected {
            if hidden.is_empty() {
                for &i in &inputs {
                    for &o in &outputs {
                        pairs.push((i, o));
                    }
                }
            } else {
                for &i in &inputs {
                    for &h in &hidden {
                        pairs.push((i, h));
                    }
                }
                for &h in &hidden {
                    for &o in &outputs {
                        pairs.push((h, o));
                    }
                }
            }
        }

        let mut edges = Vec::with_capacity(pairs.len());
        for (index, (input, output)) in pairs.into_iter().enumerate() {
            let innovation = ctx.innovation(input, output);
            let weight = config.initial_weight_range.sample(ctx.rng());
            edges.push(EdgeGene::new(EdgeId(index as u64), innovation, input, output, weight));
        }

        Self::new(id, nodes, edges, config)
    }

    /// Check every structural invariant against `config`.
    pub fn validate(&self, config: &GenomeConfig) -> Result<()> {
        let mut enabled_inputs = 0;
        let mut enabled_outputs = 0;
        for node in self.nodes.values() {
            match node.role {
                NodeRole::Input => {
                    if node.bias.is_some() {
                        return Err(GenomeError::InputBias(node.id).into());
                    }
                    if node.enabled {
                        enabled_inputs += 1;
                    }
                }
                NodeRole::Output => {
                    if node.enabled {
                        enabled_outputs += 1;
                    }
                }
                NodeRole::Hidden => {}
            }
            if let Some(bias) = node.bias {
                if !config.bias_range.contains(bias) {
                    return Err(GenomeError::BiasOutOfRange {
                        node: node.id,
                        bias,
                        min: config.bias_range.min,
                        max: config.bias_range.max,
                    }
                    .into());
                }
            }
        }
        if enabled_inputs != config.num_inputs {
            return Err(GenomeError::RoleCount {
                role: NodeRole::Input,
                expected: config.num_inputs,
                found: enabled_inputs,
            }
            .into());
        }
        if enabled_outputs != config.num_outputs {
            return Err(GenomeError::RoleCount {
                role: NodeRole::Output,
                expected: config.num_outputs,
                found: enabled_outputs,
            }
            .into());
        }

        let mut innovations = BTreeSet::new();
        let mut enabled_keys = BTreeSet::new();
        for edge in self.edges.values() {
            if edge.input == edge.output {
                return Err(GenomeError::SelfLoop {
                    edge: edge.id,
                    node: edge.input,
                }
                .into());
            }
            let source = self.nodes.get(&edge.input).ok_or(GenomeError::DanglingEdge {
                edge: edge.id,
                node: edge.input,
            })?;
            let target = self.nodes.get(&edge.output).ok_or(GenomeError::DanglingEdge {
                edge: edge.id,
                node: edge.output,
            })?;
            if target.is_input() {
                return Err(GenomeError::EdgeIntoInput {
                    edge: edge.id,
                    node: target.id,
                }
                .into());
            }
            if source.is_output() {
                return Err(GenomeError::EdgeFromOutput {
                    edge: edge.id,
                    node: source.id,
                }
                .into());
            }
            if !config.weight_range.contains(edge.weight) {
                return Err(GenomeError::WeightOutOfRange {
                    edge: edge.id,
                    weight: edge.weight,
                    min: config.weight_range.min,
                    max: config.weight_range.max,
                }
                .into());
            }
            if !innovations.insert(edge.innovation) {
                return Err(GenomeError::DuplicateInnovation(edge.innovation).into());
            }
            if edge.enabled {
                for node in [source, target] {
                    if !node.enabled {
                        return Err(GenomeError::DisabledEndpoint {
                            edge: edge.id,
                            node: node.id,
                        }
                        .into());
                    }
                }
                if !enabled_keys.insert(edge.key()) {
                    return Err(GenomeError::DuplicateStructuralKey {
                        input: edge.input,
                        output: edge.output,
                    }
                    .into());
                }
            }
        }

        if let Some(node) = self.find_cycle() {
            return Err(GenomeError::Cycle(node).into());
        }
        Ok(())
    }

    pub fn id(&self) -> GenomeId {
        self.id
    }

    /// Fitness of the last evaluation, `None` before the first.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Fitness, or `MissingFitness` when the genome has not been evaluated.
    pub fn require_fitness(&self) -> Result<f64> {
        self.fitness
            .ok_or_else(|| PhyloError::Genome(GenomeError::MissingFitness(self.id)))
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&EdgeGene> {
        self.edges.get(&id)
    }

    /// All node genes in id order, disabled ones included.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// All edge genes in id order, disabled ones included.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeGene> {
        self.edges.values()
    }

    pub fn enabled_nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values().filter(|n| n.enabled)
    }

    pub fn enabled_edges(&self) -> impl Iterator<Item = &EdgeGene> {
        self.edges.values().filter(|e| e.enabled)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Input node ids in ascending order.
    pub fn input_ids(&self) -> Vec<NodeId> {
        self.role_ids(NodeRole::Input)
    }

    /// Output node ids in ascending order.
    pub fn output_ids(&self) -> Vec<NodeId> {
        self.role_ids(NodeRole::Output)
    }

    pub fn num_inputs(&self) -> usize {
        self.enabled_nodes().filter(|n| n.is_input()).count()
    }

    pub fn num_outputs(&self) -> usize {
        self.enabled_nodes().filter(|n| n.is_output()).count()
    }

    pub fn hidden_count(&self) -> usize {
        self.enabled_nodes().filter(|n| n.is_hidden()).count()
    }

    fn role_ids(&self, role: NodeRole) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.role == role && n.enabled)
            .map(|n| n.id)
            .collect()
    }

    /// Any edge gene carrying this structural key, preferring an enabled one.
    pub fn edge_by_key(&self, key: StructuralKey) -> Option<&EdgeGene> {
        let mut found = None;
        for edge in self.edges.values() {
            if edge.key() == key {
                if edge.enabled {
                    return Some(edge);
                }
                found.get_or_insert(edge);
            }
        }
        found
    }

    /// Every node with an enabled path into `node`, found by a backward
    /// breadth-first walk along enabled edges. `node` itself is excluded
    /// unless it lies on a cycle.
    pub fn predecessors(&self, node: NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.values() {
                if edge.enabled && edge.output == current && seen.insert(edge.input) {
                    queue.push_back(edge.input);
                }
            }
        }
        seen
    }

    /// Whether an enabled edge `input -> output` would close a cycle.
    pub fn would_create_cycle(&self, input: NodeId, output: NodeId) -> bool {
        input == output || self.predecessors(input).contains(&output)
    }

    /// Whether the enabled subgraph contains a directed cycle.
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Kahn's algorithm over enabled edges; returns a node left with
    /// unresolved in-degree when the graph is cyclic.
    fn find_cycle(&self) -> Option<NodeId> {
        let mut in_degree: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for edge in self.enabled_edges() {
            *in_degree.entry(edge.output).or_insert(0) += 1;
            in_degree.entry(edge.input).or_insert(0);
            successors.entry(edge.input).or_default().push(edge.output);
        }
        let mut ready: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut visited = 0;
        while let Some(node) = ready.pop_front() {
            visited += 1;
            if let Some(next) = successors.get(&node) {
                for target in next {
                    if let Some(d) = in_degree.get_mut(target) {
                        *d -= 1;
                        if *d == 0 {
                            ready.push_back(*target);
                        }
                    }
                }
            }
        }
        if visited == in_degree.len() {
            None
        } else {
            in_degree.into_iter().find(|(_, d)| *d > 0).map(|(n, _)| n)
        }
    }

    /// Disable an edge. Returns `true` only if the edge was enabled before;
    /// disabling twice changes nothing.
    pub fn disable_edge(&mut self, id: EdgeId) -> bool {
        match self.edges.get_mut(&id) {
            Some(edge) if edge.enabled => {
                edge.enabled = false;
                true
            }
            _ => false,
        }
    }

    /// Disable a hidden node and every edge touching it. Input and output
    /// nodes cannot be disabled. Returns `true` only if the node was enabled.
    pub fn disable_node(&mut self, id: NodeId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.enabled && node.is_hidden() => node.enabled = false,
            _ => return false,
        }
        for edge in self.edges.values_mut() {
            if edge.touches(id) {
                edge.enabled = false;
            }
        }
        true
    }

    /// Add a fresh edge gene with the next local edge id.
    pub(crate) fn push_edge(&mut self, mut edge: EdgeGene) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        edge.id = id;
        self.edges.insert(id, edge);
        id
    }

    pub(crate) fn push_node(&mut self, node: NodeGene) {
        self.nodes.insert(node.id, node);
    }

    /// Explicit deep copy, used when a genome is frozen as an ancestor or
    /// captured as a champion.
    pub fn snapshot(&self) -> Genome {
        self.clone()
    }

    /// Copy of this genome under a new id with its fitness cleared, ready
    /// to be evaluated as a member of the next generation.
    pub fn offspring_copy(&self, id: GenomeId) -> Genome {
        let mut child = self.clone();
        child.id = id;
        child.clear_fitness();
        child
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        match self.fitness {
            Some(fitness) => writeln!(f, " fitness={:.4}", fitness)?,
            None => writeln!(f, " (unevaluated)")?,
        }
        writeln!(f, "  nodes:")?;
        for node in self.nodes.values() {
            writeln!(f, "    {}", node)?;
        }
        writeln!(f, "  edges:")?;
        for edge in self.edges.values() {
            writeln!(f, "    {}", edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phylo_core::functions::{Activation, Aggregation};
    use phylo_core::types::InnovationNumber;

    fn config() -> GenomeConfig {
        GenomeConfig::with_shape(2, 1)
    }

    fn io_nodes() -> Vec<NodeGene> {
        vec![
            NodeGene::input(NodeId(0), Aggregation::Sum, Activation::Identity),
            NodeGene::input(NodeId(1), Aggregation::Sum, Activation::Identity),
            NodeGene::output(NodeId(2), Aggregation::Sum, Activation::Sigmoid, 0.0),
        ]
    }

    fn edge(id: u64, innovation: u64, input: u64, output: u64) -> EdgeGene {
        EdgeGene::new(
            EdgeId(id),
            InnovationNumber(innovation),
            NodeId(input),
            NodeId(output),
            0.5,
        )
    }

    #[test]
    fn initial_genomes_share_ids_and_innovations() {
        let config = config();
        let mut ctx = EvolutionContext::new(&config, 1);
        let a = Genome::initial(&config, &mut ctx).unwrap();
        let b = Genome::initial(&config, &mut ctx).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.edge_count(), 2);
        let ia: Vec<_> = a.edges().map(|e| e.innovation).collect();
        let ib: Vec<_> = b.edges().map(|e| e.innovation).collect();
        assert_eq!(ia, ib);
        assert_eq!(a.input_ids(), vec![NodeId(0), NodeId(1)]);
        assert_eq!(a.output_ids(), vec![NodeId(2)]);
        assert!(a.fitness().is_none());
    }

    #[test]
    fn initial_hidden_layer_is_wired_through() {
        let config = GenomeConfig {
            initial_hidden_nodes: 2,
            ..config()
        };
        let mut ctx = EvolutionContext::new(&config, 1);
        let genome = Genome::initial(&config, &mut ctx).unwrap();
        assert_eq!(genome.hidden_count(), 2);
        // 2 inputs x 2 hidden + 2 hidden x 1 output
        assert_eq!(genome.edge_count(), 6);
        assert!(genome.edge_by_key(StructuralKey::new(NodeId(0), NodeId(2))).is_none());
        assert_eq!(ctx.next_node_id(), NodeId(5));
    }

    #[test]
    fn unconnected_topology_has_no_edges() {
        let config = GenomeConfig {
            initial_topology: InitialTopology::Unconnected,
            ..config()
        };
        let mut ctx = EvolutionContext::new(&config, 1);
        let genome = Genome::initial(&config, &mut ctx).unwrap();
        assert_eq!(genome.edge_count(), 0);
        assert!(ctx.innovations().is_empty());
    }

    #[test]
    fn construction_rejects_invariant_violations() {
        let config = config();
        let cases: Vec<(Vec<NodeGene>, Vec<EdgeGene>)> = vec![
            // self-loop
            (io_nodes(), vec![edge(0, 0, 2, 2)]),
            // dangling
            (io_nodes(), vec![edge(0, 0, 0, 9)]),
            // into input
            (io_nodes(), vec![edge(0, 0, 2, 0)]),
            // duplicate innovation
            (io_nodes(), vec![edge(0, 0, 0, 2), edge(1, 0, 1, 2)]),
            // duplicate edge id
            (io_nodes(), vec![edge(0, 0, 0, 2), edge(0, 1, 1, 2)]),
            // missing output
            (io_nodes()[..2].to_vec(), vec![]),
        ];
        for (nodes, edges) in cases {
            assert!(Genome::new(GenomeId(0), nodes, edges, &config).is_err());
        }

        let mut nodes = io_nodes();
        nodes.push(NodeGene::input(NodeId(0), Aggregation::Sum, Activation::Identity));
        let err = Genome::new(GenomeId(0), nodes, vec![], &config).unwrap_err();
        assert_eq!(err, PhyloError::Genome(GenomeError::DuplicateNode(NodeId(0))));

        let mut heavy = edge(0, 0, 0, 2);
        heavy.weight = 31.0;
        let err = Genome::new(GenomeId(0), io_nodes(), vec![heavy], &config).unwrap_err();
        assert!(matches!(err, PhyloError::Genome(GenomeError::WeightOutOfRange { .. })));

        let mut nodes = io_nodes();
        nodes[0].bias = Some(0.1);
        let err = Genome::new(GenomeId(0), nodes, vec![], &config).unwrap_err();
        assert_eq!(err, PhyloError::Genome(GenomeError::InputBias(NodeId(0))));
    }

    #[test]
    fn construction_rejects_cycles() {
        let config = config();
        let mut nodes = io_nodes();
        nodes.push(NodeGene::hidden(NodeId(3), Aggregation::Sum, Activation::Sigmoid, 0.0));
        nodes.push(NodeGene::hidden(NodeId(4), Aggregation::Sum, Activation::Sigmoid, 0.0));
        let edges = vec![edge(0, 0, 3, 4), edge(1, 1, 4, 3), edge(2, 2, 0, 3)];
        let err = Genome::new(GenomeId(0), nodes.clone(), edges, &config).unwrap_err();
        assert!(matches!(err, PhyloError::Genome(GenomeError::Cycle(_))));

        // The same loop is fine while one half is disabled.
        let mut back = edge(1, 1, 4, 3);
        back.enabled = false;
        let genome =
            Genome::new(GenomeId(0), nodes, vec![edge(0, 0, 3, 4), back, edge(2, 2, 0, 3)], &config)
                .unwrap();
        assert!(!genome.has_cycle());
        assert!(genome.would_create_cycle(NodeId(4), NodeId(3)));
        assert!(!genome.would_create_cycle(NodeId(3), NodeId(2)));
    }

    #[test]
    fn enabled_edges_need_enabled_endpoints() {
        let config = config();
        let mut nodes = io_nodes();
        let mut hidden = NodeGene::hidden(NodeId(3), Aggregation::Sum, Activation::Sigmoid, 0.0);
        hidden.enabled = false;
        nodes.push(hidden);
        let err = Genome::new(GenomeId(0), nodes, vec![edge(0, 0, 0, 3)], &config).unwrap_err();
        assert!(matches!(err, PhyloError::Genome(GenomeError::DisabledEndpoint { .. })));
    }

    #[test]
    fn disable_is_idempotent() {
        let config = GenomeConfig {
            initial_hidden_nodes: 1,
            ..config()
        };
        let mut ctx = EvolutionContext::new(&config, 5);
        let mut genome = Genome::initial(&config, &mut ctx).unwrap();
        let before = genome.enabled_edges().count();

        assert!(genome.disable_edge(EdgeId(0)));
        assert!(!genome.disable_edge(EdgeId(0)));
        assert_eq!(genome.enabled_edges().count(), before - 1);

        assert!(genome.disable_node(NodeId(3)));
        let nodes_after = genome.enabled_nodes().count();
        assert!(!genome.disable_node(NodeId(3)));
        assert_eq!(genome.enabled_nodes().count(), nodes_after);
        assert_eq!(genome.enabled_edges().count(), 0);

        // inputs and outputs stay
        assert!(!genome.disable_node(NodeId(0)));
        assert!(!genome.disable_node(NodeId(2)));
        genome.validate(&config).unwrap();
    }

    #[test]
    fn predecessors_follow_enabled_edges_only() {
        let config = GenomeConfig {
            initial_hidden_nodes: 1,
            ..config()
        };
        let mut ctx = EvolutionContext::new(&config, 5);
        let mut genome = Genome::initial(&config, &mut ctx).unwrap();
        let preds = genome.predecessors(NodeId(2));
        assert_eq!(preds, BTreeSet::from([NodeId(0), NodeId(1), NodeId(3)]));

        let hidden_to_output = genome
            .edge_by_key(StructuralKey::new(NodeId(3), NodeId(2)))
            .map(|e| e.id)
            .unwrap();
        genome.disable_edge(hidden_to_output);
        assert!(genome.predecessors(NodeId(2)).is_empty());
    }

    #[test]
    fn offspring_copy_clears_fitness() {
        let config = config();
        let mut ctx = EvolutionContext::new(&config, 5);
        let mut genome = Genome::initial(&config, &mut ctx).unwrap();
        genome.set_fitness(2.5);
        assert_eq!(genome.snapshot().fitness(), Some(2.5));
        let child = genome.offspring_copy(GenomeId(99));
        assert_eq!(child.id(), GenomeId(99));
        assert!(child.fitness().is_none());
        assert!(child.require_fitness().is_err());
        assert!(genome.to_string().contains("fitness=2.5000"));
        genome.clear_fitness();
        assert!(genome.fitness().is_none());
    }
}
