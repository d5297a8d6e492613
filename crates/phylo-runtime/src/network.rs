//! Feed-forward phenotype compiled from a genome.
//!
//! Construction copies the enabled part of a genome into a petgraph
//! `DiGraph`, orders it with Kahn's algorithm and assigns each node a layer:
//!
//! 1. forward pass in topological order: inputs sit on layer 0, a node
//!    reachable from an input sits one layer above its highest reachable
//!    predecessor
//! 2. outputs no input reaches are placed one layer above everything else
//! 3. backward pass in reverse topological order: a node still without a
//!    layer sits one layer below its lowest layered successor
//!
//! Nodes left without a layer are connected to nothing that matters and
//! are dropped. Evaluation visits nodes in `(layer, id)` order.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use phylo_core::error::{NetworkError, PhyloError, Result};
use phylo_core::functions::{Activation, Aggregation};
use phylo_core::phenotype::Phenotype;
use phylo_core::types::{GenomeId, NodeId, NodeRole};
use phylo_genome::genome::Genome;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// One node of the compiled network, with its transient buffers.
#[derive(Debug, Clone)]
struct NetworkNode {
    id: NodeId,
    role: NodeRole,
    aggregation: Aggregation,
    activation: Activation,
    bias: Option<f64>,
    layer: i64,
    /// `(position in evaluation order, weight)`
    outgoing: Vec<(usize, f64)>,
    received: Vec<f64>,
    value: f64,
}

/// Executable network derived from a genome.
///
/// Disposable: build it, activate it, drop it. The only mutable state is
/// the per-activation buffers.
#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    genome_id: GenomeId,
    nodes: Vec<NetworkNode>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    edge_count: usize,
}

impl FeedForwardNetwork {
    /// Compile `genome`. Fails with `NetworkError::CycleDetected` if the
    /// enabled subgraph is cyclic, which a validated genome never is.
    pub fn from_genome(genome: &Genome) -> Result<Self> {
        let mut graph: DiGraph<NodeId, f64> = DiGraph::new();
        let mut index: BTreeMap<NodeId, NodeIndex> = BTreeMap::new();
        for node in genome.enabled_nodes() {
            index.insert(node.id, graph.add_node(node.id));
        }
        for edge in genome.enabled_edges() {
            if let (Some(&from), Some(&to)) = (index.get(&edge.input), index.get(&edge.output)) {
                graph.add_edge(from, to, edge.weight);
            }
        }

        let order = topological_order(&graph)?;

        let mut layers: BTreeMap<NodeIndex, i64> = BTreeMap::new();
        for &ix in &order {
            let role = genome.node(graph[ix]).map(|n| n.role);
            if role == Some(NodeRole::Input) {
                layers.insert(ix, 0);
                continue;
            }
            let highest = graph
                .neighbors_directed(ix, Direction::Incoming)
                .filter_map(|p| layers.get(&p).copied())
                .max();
            if let Some(layer) = highest {
                layers.insert(ix, layer + 1);
            }
        }

        let top = layers.values().copied().max().unwrap_or(0);
        for &ix in &order {
            let is_output = genome.node(graph[ix]).map(|n| n.is_output()).unwrap_or(false);
            if is_output && !layers.contains_key(&ix) {
                layers.insert(ix, top + 1);
            }
        }

        for &ix in order.iter().rev() {
            if layers.contains_key(&ix) {
                continue;
            }
            let lowest = graph
                .neighbors_directed(ix, Direction::Outgoing)
                .filter_map(|s| layers.get(&s).copied())
                .min();
            if let Some(layer) = lowest {
                layers.insert(ix, layer - 1);
            }
        }

        let mut active: Vec<(i64, NodeId, NodeIndex)> = layers
            .iter()
            .map(|(&ix, &layer)| (layer, graph[ix], ix))
            .collect();
        active.sort();
        let position: BTreeMap<NodeIndex, usize> = active
            .iter()
            .enumerate()
            .map(|(pos, (_, _, ix))| (*ix, pos))
            .collect();

        let mut edge_count = 0;
        let mut nodes = Vec::with_capacity(active.len());
        for &(layer, id, ix) in &active {
            let Some(gene) = genome.node(id) else {
                continue;
            };
            let mut outgoing: Vec<(usize, f64)> = graph
                .edges_directed(ix, Direction::Outgoing)
                .filter_map(|e| position.get(&e.target()).map(|&pos| (pos, *e.weight())))
                .collect();
            outgoing.sort_by_key(|(pos, _)| *pos);
            edge_count += outgoing.len();
            nodes.push(NetworkNode {
                id,
                role: gene.role,
                aggregation: gene.aggregation,
                activation: gene.activation,
                bias: gene.bias,
                layer,
                outgoing,
                received: Vec::new(),
                value: 0.0,
            });
        }

        let mut inputs: Vec<(NodeId, usize)> = Vec::new();
        let mut outputs: Vec<(NodeId, usize)> = Vec::new();
        for (pos, node) in nodes.iter().enumerate() {
            match node.role {
                NodeRole::Input => inputs.push((node.id, pos)),
                NodeRole::Output => outputs.push((node.id, pos)),
                NodeRole::Hidden => {}
            }
        }
        inputs.sort();
        outputs.sort();

        Ok(Self {
            genome_id: genome.id(),
            nodes,
            inputs: inputs.into_iter().map(|(_, pos)| pos).collect(),
            outputs: outputs.into_iter().map(|(_, pos)| pos).collect(),
            edge_count,
        })
    }

    pub fn genome_id(&self) -> GenomeId {
        self.genome_id
    }

    /// Node ids grouped by layer, lowest layer first.
    pub fn layers(&self) -> Vec<Vec<NodeId>> {
        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        let mut current = None;
        for node in &self.nodes {
            if current != Some(node.layer) {
                layers.push(Vec::new());
                current = Some(node.layer);
            }
            if let Some(layer) = layers.last_mut() {
                layer.push(node.id);
            }
        }
        layers
    }

    /// Layer of a node, `None` if it was excluded from evaluation.
    pub fn layer_of(&self, id: NodeId) -> Option<i64> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.layer)
    }

    /// Ids of the nodes that take part in evaluation, in evaluation order.
    pub fn evaluation_order(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Kahn's algorithm with an explicit in-degree worklist. Ties are broken
/// by node id so the order is a pure function of the graph.
fn topological_order(graph: &DiGraph<NodeId, f64>) -> Result<Vec<NodeIndex>> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|ix| graph.neighbors_directed(ix, Direction::Incoming).count())
        .collect();
    let mut ready: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|ix| in_degree[ix.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(ix) = ready.pop_front() {
        order.push(ix);
        let mut successors: Vec<NodeIndex> =
            graph.neighbors_directed(ix, Direction::Outgoing).collect();
        successors.sort_by_key(|s| graph[*s]);
        for succ in successors {
            let degree = &mut in_degree[succ.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(succ);
            }
        }
    }

    if order.len() < graph.node_count() {
        let first = graph
            .node_indices()
            .filter(|ix| in_degree[ix.index()] > 0)
            .map(|ix| graph[ix])
            .min()
            .unwrap_or(NodeId(0));
        return Err(PhyloError::Network(NetworkError::CycleDetected {
            unprocessed: graph.node_count() - order.len(),
            first,
        }));
    }
    Ok(order)
}

impl Phenotype for FeedForwardNetwork {
    fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.inputs.len() {
            return Err(PhyloError::input_arity(self.inputs.len(), inputs.len()));
        }
        for node in &mut self.nodes {
            node.received.clear();
            node.value = 0.0;
        }
        for (&pos, &value) in self.inputs.iter().zip(inputs) {
            self.nodes[pos].received.push(value);
        }

        for pos in 0..self.nodes.len() {
            let node = &mut self.nodes[pos];
            if let Some(bias) = node.bias {
                node.received.push(bias);
            }
            let value = node.activation.apply(node.aggregation.apply(&node.received));
            node.value = value;
            // Targets always come later in evaluation order.
            let outgoing = std::mem::take(&mut node.outgoing);
            for &(target, weight) in &outgoing {
                self.nodes[target].received.push(value * weight);
            }
            self.nodes[pos].outgoing = outgoing;
        }

        Ok(self.outputs.iter().map(|&pos| self.nodes[pos].value).collect())
    }

    fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    fn num_outputs(&self) -> usize {
        self.outputs.len()
    }
}

impl fmt::Display for FeedForwardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers = self.layers();
        writeln!(
            f,
            "network for {}: {} layers, {} nodes, {} edges",
            self.genome_id,
            layers.len(),
            self.node_count(),
            self.edge_count
        )?;
        for (depth, layer) in layers.iter().enumerate() {
            let ids: Vec<String> = layer.iter().map(|id| id.to_string()).collect();
            writeln!(f, "  layer {}: {}", depth, ids.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phylo_core::types::{EdgeId, InnovationNumber};
    use phylo_genome::config::GenomeConfig;
    use phylo_genome::gene::{EdgeGene, NodeGene};

    fn io(num_inputs: u64, num_outputs: u64) -> Vec<NodeGene> {
        let mut nodes = Vec::new();
        for i in 0..num_inputs {
            nodes.push(NodeGene::input(NodeId(i), Aggregation::Sum, Activation::Identity));
        }
        for o in num_inputs..num_inputs + num_outputs {
            nodes.push(NodeGene::output(NodeId(o), Aggregation::Sum, Activation::Identity, 0.0));
        }
        nodes
    }

    fn hidden(id: u64) -> NodeGene {
        NodeGene::hidden(NodeId(id), Aggregation::Sum, Activation::Identity, 0.0)
    }

    fn edge(id: u64, input: u64, output: u64, weight: f64) -> EdgeGene {
        EdgeGene::new(EdgeId(id), InnovationNumber(id), NodeId(input), NodeId(output), weight)
    }

    fn identity_config(num_inputs: usize, num_outputs: usize) -> GenomeConfig {
        GenomeConfig::with_shape(num_inputs, num_outputs)
    }

    #[test]
    fn evaluates_a_hidden_chain() {
        let config = identity_config(2, 1);
        let mut nodes = io(2, 1);
        nodes.push(hidden(3));
        let edges = vec![edge(0, 0, 3, 2.0), edge(1, 1, 3, 3.0), edge(2, 3, 2, 0.5)];
        let genome = Genome::new(GenomeId(1), nodes, edges, &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();

        // (2*1 + 3*2) * 0.5
        assert_eq!(net.activate(&[1.0, 2.0]).unwrap(), vec![4.0]);
        assert_eq!(net.layers(), vec![vec![NodeId(0), NodeId(1)], vec![NodeId(3)], vec![NodeId(2)]]);
        assert_eq!(net.edge_count(), 3);
        assert_eq!(net.evaluation_order(), vec![NodeId(0), NodeId(1), NodeId(3), NodeId(2)]);
        // buffers reset between activations
        assert_eq!(net.activate(&[1.0, 2.0]).unwrap(), vec![4.0]);
    }

    #[test]
    fn bias_joins_the_aggregation() {
        let config = identity_config(1, 1);
        let mut nodes = io(1, 1);
        nodes[1].bias = Some(0.25);
        let genome = Genome::new(GenomeId(1), nodes, vec![edge(0, 0, 1, 1.0)], &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();
        assert_eq!(net.activate(&[1.0]).unwrap(), vec![1.25]);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let config = identity_config(2, 1);
        let genome = Genome::new(GenomeId(1), io(2, 1), vec![], &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();
        let err = net.activate(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            PhyloError::Network(NetworkError::InvalidInputArity { expected: 2, found: 1 })
        );
        assert!(net.activate(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn unconnected_output_aggregates_bias_only() {
        let config = identity_config(2, 1);
        let mut nodes = io(2, 1);
        nodes[2].activation = Activation::Sigmoid;
        let genome = Genome::new(GenomeId(1), nodes, vec![], &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();
        assert_eq!(net.activate(&[5.0, -5.0]).unwrap(), vec![0.5]);
        assert_eq!(net.layer_of(NodeId(2)), Some(1));
    }

    #[test]
    fn unreachable_subgraph_is_layered_backwards() {
        // 0 -> 1 (output), and a hidden chain 2 -> 3 -> 1 no input reaches.
        let config = identity_config(1, 1);
        let mut nodes = io(1, 1);
        nodes.push(hidden(2));
        nodes.push(hidden(3));
        nodes[2].bias = Some(1.0);
        let edges = vec![edge(0, 0, 1, 1.0), edge(1, 2, 3, 1.0), edge(2, 3, 1, 2.0)];
        let genome = Genome::new(GenomeId(1), nodes, edges, &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();

        assert_eq!(net.layer_of(NodeId(1)), Some(1));
        assert_eq!(net.layer_of(NodeId(3)), Some(0));
        assert_eq!(net.layer_of(NodeId(2)), Some(-1));
        // hidden 2 emits its bias 1.0, hidden 3 forwards it, output adds 2.0 * 1.0
        assert_eq!(net.activate(&[3.0]).unwrap(), vec![5.0]);
    }

    #[test]
    fn dead_ends_are_excluded() {
        // hidden 2 only feeds hidden 3, which feeds nothing.
        let config = identity_config(1, 1);
        let mut nodes = io(1, 1);
        nodes.push(hidden(2));
        nodes.push(hidden(3));
        let edges = vec![edge(0, 0, 1, 1.0), edge(1, 2, 3, 1.0)];
        let genome = Genome::new(GenomeId(1), nodes, edges, &config).unwrap();
        let net = FeedForwardNetwork::from_genome(&genome).unwrap();
        assert_eq!(net.layer_of(NodeId(2)), None);
        assert_eq!(net.layer_of(NodeId(3)), None);
        assert_eq!(net.node_count(), 2);
    }

    #[test]
    fn disabled_genes_never_execute() {
        let config = identity_config(1, 1);
        let mut nodes = io(1, 1);
        let mut off = hidden(2);
        off.enabled = false;
        nodes.push(off);
        let mut skip = edge(1, 0, 2, 1.0);
        skip.enabled = false;
        let mut out = edge(2, 2, 1, 1.0);
        out.enabled = false;
        let mut direct = edge(0, 0, 1, 1.0);
        direct.enabled = false;
        let genome = Genome::new(GenomeId(1), nodes, vec![direct, skip, out], &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.activate(&[9.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn outputs_come_back_in_id_order() {
        let config = identity_config(1, 2);
        let edges = vec![edge(0, 0, 2, 3.0), edge(1, 0, 1, 2.0)];
        let genome = Genome::new(GenomeId(1), io(1, 2), edges, &config).unwrap();
        let mut net = FeedForwardNetwork::from_genome(&genome).unwrap();
        assert_eq!(net.num_outputs(), 2);
        assert_eq!(net.activate(&[1.0]).unwrap(), vec![2.0, 3.0]);
        assert!(net.to_string().starts_with("network for genome-1: 2 layers"));
    }
}
