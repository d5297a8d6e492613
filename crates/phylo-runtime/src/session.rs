//! Session persistence — save/load a population between runs.
//!
//! A population is flattened into plain serializable snapshots (genes,
//! species bookkeeping, innovation table, id counters and the random
//! generator state) and written as JSON. Loading rebuilds every genome
//! through [`Genome::new`], so a damaged file fails with a typed error
//! instead of yielding a population that breaks its own invariants.
//!
//! A restored population continues the same random stream, so a run that
//! is saved and resumed evolves exactly like one that never stopped.

use crate::population::{GenerationPhase, GenerationReport, Population, PopulationConfig};
use crate::species::Species;
use phylo_core::error::Result;
use phylo_core::types::{Generation, GenomeId, InnovationNumber, SpeciesId};
use phylo_genome::config::GenomeConfig;
use phylo_genome::context::{Counters, EvolutionContext};
use phylo_genome::gene::{EdgeGene, NodeGene};
use phylo_genome::genome::Genome;
use phylo_genome::innovation::{InnovationRecord, InnovationTracker};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Serializable snapshot of a whole population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationState {
    pub metadata: SessionMetadata,
    pub config: PopulationConfig,
    pub generation: Generation,
    pub species: Vec<SerializedSpecies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion: Option<SerializedGenome>,
    #[serde(default)]
    pub history: Vec<Vec<f64>>,
    #[serde(default)]
    pub reports: Vec<GenerationReport>,
    pub context: ContextState,
}

/// Serializable genome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedGenome {
    pub id: GenomeId,
    pub nodes: Vec<NodeGene>,
    pub edges: Vec<EdgeGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
}

/// Serializable species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedSpecies {
    pub id: SpeciesId,
    pub founded: Generation,
    pub age: u64,
    pub members: Vec<SerializedGenome>,
    #[serde(default)]
    pub ancestors: Vec<SerializedGenome>,
    pub representative: SerializedGenome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion: Option<SerializedGenome>,
    #[serde(default)]
    pub fitness_history: Vec<f64>,
}

/// Innovation table, id counters and random state of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextState {
    pub innovations: Vec<InnovationRecord>,
    pub next_innovation: InnovationNumber,
    pub next_node_id: u64,
    pub next_genome_id: u64,
    pub next_species_id: u64,
    pub rng: ChaCha8Rng,
}

/// Session metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub generation: Generation,
    pub genome_count: usize,
    pub species_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion_fitness: Option<f64>,
    #[serde(default)]
    pub engine_version: String,
}

impl SerializedGenome {
    pub fn from_genome(genome: &Genome) -> Self {
        Self {
            id: genome.id(),
            nodes: genome.nodes().cloned().collect(),
            edges: genome.edges().cloned().collect(),
            fitness: genome.fitness(),
        }
    }

    /// Rebuild and validate the genome.
    pub fn restore(self, config: &GenomeConfig) -> Result<Genome> {
        let mut genome = Genome::new(self.id, self.nodes, self.edges, config)?;
        if let Some(fitness) = self.fitness {
            genome.set_fitness(fitness);
        }
        Ok(genome)
    }
}

impl SerializedSpecies {
    fn from_species(species: &Species) -> Self {
        Self {
            id: species.id(),
            founded: species.founded(),
            age: species.age(),
            members: species.members().iter().map(SerializedGenome::from_genome).collect(),
            ancestors: species
                .ancestors()
                .iter()
                .map(SerializedGenome::from_genome)
                .collect(),
            representative: SerializedGenome::from_genome(species.representative()),
            champion: species.champion().map(SerializedGenome::from_genome),
            fitness_history: species.fitness_history().to_vec(),
        }
    }

    fn restore(self, config: &GenomeConfig) -> Result<Species> {
        let restore_all = |genomes: Vec<SerializedGenome>| -> Result<Vec<Genome>> {
            genomes.into_iter().map(|g| g.restore(config)).collect()
        };
        Ok(Species {
            id: self.id,
            founded: self.founded,
            age: self.age,
            members: restore_all(self.members)?,
            ancestors: restore_all(self.ancestors)?,
            representative: self.representative.restore(config)?,
            champion: self.champion.map(|c| c.restore(config)).transpose()?,
            fitness_history: self.fitness_history,
        })
    }
}

impl ContextState {
    fn from_context(ctx: &EvolutionContext) -> Self {
        let counters = ctx.counters();
        Self {
            innovations: ctx.innovations().records(),
            next_innovation: ctx.innovations().next_innovation(),
            next_node_id: counters.next_node_id,
            next_genome_id: counters.next_genome_id,
            next_species_id: counters.next_species_id,
            rng: ctx.rng_state().clone(),
        }
    }

    fn restore(self) -> Result<EvolutionContext> {
        let innovations = InnovationTracker::from_records(self.innovations, self.next_innovation)?;
        let counters = Counters {
            next_node_id: self.next_node_id,
            next_genome_id: self.next_genome_id,
            next_species_id: self.next_species_id,
        };
        Ok(EvolutionContext::from_parts(innovations, counters, self.rng))
    }
}

/// Snapshot a population.
pub fn snapshot(population: &Population) -> PopulationState {
    PopulationState {
        metadata: SessionMetadata {
            session_id: uuid::Uuid::new_v4().to_string(),
            generation: population.generation(),
            genome_count: population.len(),
            species_count: population.species().len(),
            champion_fitness: population.champion().and_then(|c| c.fitness()),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        config: population.config().clone(),
        generation: population.generation(),
        species: population
            .species()
            .iter()
            .map(SerializedSpecies::from_species)
            .collect(),
        champion: population.champion().map(SerializedGenome::from_genome),
        history: population.history().to_vec(),
        reports: population.reports().to_vec(),
        context: ContextState::from_context(population.context()),
    }
}

/// Rebuild a population from a snapshot, validating config and genomes.
pub fn restore(state: PopulationState) -> Result<Population> {
    state.config.validate()?;
    let genome_config = &state.config.genome;
    let species = state
        .species
        .into_iter()
        .map(|s| s.restore(genome_config))
        .collect::<Result<Vec<_>>>()?;
    let champion = state
        .champion
        .map(|c| c.restore(genome_config))
        .transpose()?;
    let ctx = state.context.restore()?;

    Ok(Population {
        config: state.config,
        ctx,
        generation: state.generation,
        phase: GenerationPhase::Evaluating,
        species,
        champion,
        history: state.history,
        reports: state.reports,
    })
}

/// Serialize a population to an opaque byte blob.
pub fn save(population: &Population) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&snapshot(population))?)
}

/// Deserialize a population saved with [`save`].
pub fn load(bytes: &[u8]) -> Result<Population> {
    let state: PopulationState = serde_json::from_slice(bytes)?;
    restore(state)
}

/// Save a population to a JSON file, creating parent directories.
pub fn save_to_path(population: &Population, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&snapshot(population))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, json)?;
    debug!(path = %path.display(), generation = population.generation(), "session saved");
    Ok(())
}

/// Load a population saved with [`save_to_path`].
pub fn load_from_path(path: &Path) -> Result<Population> {
    let json = std::fs::read_to_string(path)?;
    let state: PopulationState = serde_json::from_str(&json)?;
    debug!(path = %path.display(), generation = state.generation, "session loaded");
    restore(state)
}
