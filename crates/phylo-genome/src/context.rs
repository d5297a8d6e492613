//! Evolution context — the run-wide mutable state threaded through every
//! call that creates genes, genomes or species.
//!
//! One context per run. Independent runs own independent contexts, so they
//! can execute side by side, and a fixed seed reproduces a run exactly.

use crate::config::GenomeConfig;
use crate::innovation::InnovationTracker;
use phylo_core::types::{GenomeId, InnovationNumber, NodeId, SpeciesId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Innovation table, id counters and the random source of one run.
#[derive(Debug, Clone)]
pub struct EvolutionContext {
    innovations: InnovationTracker,
    next_node_id: u64,
    next_genome_id: u64,
    next_species_id: u64,
    rng: ChaCha8Rng,
}

/// Raw counter values, used when checkpointing a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub next_node_id: u64,
    pub next_genome_id: u64,
    pub next_species_id: u64,
}

impl EvolutionContext {
    /// Fresh context for genomes shaped by `config`.
    ///
    /// Node ids `0..inputs` are the inputs, the next `outputs` ids are the
    /// outputs, then the initial hidden layer; mutation-created nodes are
    /// numbered after those.
    pub fn new(config: &GenomeConfig, seed: u64) -> Self {
        Self {
            innovations: InnovationTracker::new(),
            next_node_id: (config.num_inputs + config.num_outputs + config.initial_hidden_nodes)
                as u64,
            next_genome_id: 0,
            next_species_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Reassemble a context from checkpointed parts.
    pub fn from_parts(innovations: InnovationTracker, counters: Counters, rng: ChaCha8Rng) -> Self {
        Self {
            innovations,
            next_node_id: counters.next_node_id,
            next_genome_id: counters.next_genome_id,
            next_species_id: counters.next_species_id,
            rng,
        }
    }

    /// Innovation number for an edge shape (see [`InnovationTracker::lookup_or_assign`]).
    pub fn innovation(&mut self, input: NodeId, output: NodeId) -> InnovationNumber {
        self.innovations.lookup_or_assign(input, output)
    }

    pub fn innovations(&self) -> &InnovationTracker {
        &self.innovations
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub fn next_genome_id(&mut self) -> GenomeId {
        let id = GenomeId(self.next_genome_id);
        self.next_genome_id += 1;
        id
    }

    pub fn next_species_id(&mut self) -> SpeciesId {
        let id = SpeciesId(self.next_species_id);
        self.next_species_id += 1;
        id
    }

    pub fn counters(&self) -> Counters {
        Counters {
            next_node_id: self.next_node_id,
            next_genome_id: self.next_genome_id,
            next_species_id: self.next_species_id,
        }
    }

    /// The run's random source. Every random decision goes through here.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Read-only view of the generator state, for checkpointing.
    pub fn rng_state(&self) -> &ChaCha8Rng {
        &self.rng
    }
}
