//! Population — the generational loop.
//!
//! One generation:
//! 1. every live genome is compiled to a phenotype and scored by the
//!    caller's evaluation function (in parallel when configured)
//! 2. every species ranks and freezes its members
//! 3. stagnated and extinct species are removed
//! 4. each surviving species gets an offspring quota proportional to its
//!    recent fitness and breeds it
//! 5. the offspring are re-speciated and the generation counter advances
//!
//! Every phase completes for the whole population before the next starts.

use crate::network::FeedForwardNetwork;
use crate::species::Species;
use phylo_core::error::{EvaluationError, EvolutionError, PhyloError, Result};
use phylo_core::types::{Generation, SpeciesId};
use phylo_genome::compatibility::CompatibilityConfig;
use phylo_genome::config::GenomeConfig;
use phylo_genome::context::EvolutionContext;
use phylo_genome::genome::Genome;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Configuration for a population run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Target number of genomes per generation (default: 150).
    pub population_size: usize,
    /// Shape, ranges, functions and mutation table of every genome.
    pub genome: GenomeConfig,
    /// Distance coefficients and speciation threshold.
    pub compatibility: CompatibilityConfig,
    /// Generations without improvement before a species is culled (default: 15).
    pub stagnation_window: usize,
    /// Generations averaged into a species' share of offspring (default: 5).
    pub fitness_window: usize,
    /// Fraction of ancestors allowed to breed (default: 0.3, never fewer than two).
    pub reproduction_elitism: f64,
    /// Top ancestors copied unchanged into the next generation (default: 1).
    pub elites_per_species: usize,
    /// Best species protected from stagnation culling (default: 1).
    pub species_elitism: usize,
    /// Mutate crossover children before they join the population (default: true).
    pub mutate_offspring: bool,
    /// Score genomes on the rayon thread pool (default: true).
    pub parallel_evaluation: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            genome: GenomeConfig::default(),
            compatibility: CompatibilityConfig::default(),
            stagnation_window: 15,
            fitness_window: 5,
            reproduction_elitism: 0.3,
            elites_per_species: 1,
            species_elitism: 1,
            mutate_offspring: true,
            parallel_evaluation: true,
        }
    }
}

impl PopulationConfig {
    /// Default configuration for networks with the given shape.
    pub fn with_shape(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            genome: GenomeConfig::with_shape(num_inputs, num_outputs),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(PhyloError::invalid_config(
                "population_size",
                self.population_size,
                "at least two genomes are needed to breed",
            ));
        }
        if self.stagnation_window == 0 {
            return Err(PhyloError::invalid_config(
                "stagnation_window",
                self.stagnation_window,
                "must be at least one generation",
            ));
        }
        if self.fitness_window == 0 {
            return Err(PhyloError::invalid_config(
                "fitness_window",
                self.fitness_window,
                "must be at least one generation",
            ));
        }
        if !(self.reproduction_elitism > 0.0 && self.reproduction_elitism <= 1.0) {
            return Err(PhyloError::invalid_config(
                "reproduction_elitism",
                self.reproduction_elitism,
                "must lie in (0, 1]",
            ));
        }
        self.genome.validate()?;
        self.compatibility.validate()
    }
}

/// Where the population is inside the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationPhase {
    Initializing,
    Evaluating,
    Speciating,
    Reproducing,
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Evaluating => "evaluating",
            Self::Speciating => "speciating",
            Self::Reproducing => "reproducing",
        };
        f.write_str(name)
    }
}

/// Summary of one completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: Generation,
    /// Species alive when the generation was evaluated.
    pub species_count: usize,
    /// Best fitness seen in any generation so far.
    pub champion_fitness: f64,
    /// Best fitness of this generation.
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub population_size: usize,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gen {:>4} | species {:>3} | genomes {:>4} | best {:.4} | mean {:.4} | champion {:.4}",
            self.generation,
            self.species_count,
            self.population_size,
            self.best_fitness,
            self.mean_fitness,
            self.champion_fitness
        )
    }
}

/// When [`Population::run`] stops. At least one bound must be set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Termination {
    pub max_generations: Option<Generation>,
    pub fitness_goal: Option<f64>,
}

impl Termination {
    pub fn generations(max: Generation) -> Self {
        Self {
            max_generations: Some(max),
            fitness_goal: None,
        }
    }

    pub fn fitness_goal(goal: f64) -> Self {
        Self {
            max_generations: None,
            fitness_goal: Some(goal),
        }
    }

    /// Stop at `goal` or after `max` generations, whichever comes first.
    pub fn either(max: Generation, goal: f64) -> Self {
        Self {
            max_generations: Some(max),
            fitness_goal: Some(goal),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (self.max_generations, self.fitness_goal) {
            (None, None) => Err(PhyloError::invalid_config(
                "termination",
                "none",
                "set a generation cap, a fitness goal, or both",
            )),
            (_, Some(goal)) if !goal.is_finite() => Err(PhyloError::invalid_config(
                "fitness_goal",
                goal,
                "must be finite",
            )),
            _ => Ok(()),
        }
    }

    /// Whether a run at `generation` with the given champion fitness is done.
    pub fn is_met(&self, generation: Generation, champion_fitness: Option<f64>) -> bool {
        let capped = self.max_generations.map_or(false, |max| generation >= max);
        let reached = match (self.fitness_goal, champion_fitness) {
            (Some(goal), Some(fitness)) => fitness >= goal,
            _ => false,
        };
        capped || reached
    }
}

/// A population of genomes evolving under one [`EvolutionContext`].
#[derive(Debug, Clone)]
pub struct Population {
    pub(crate) config: PopulationConfig,
    pub(crate) ctx: EvolutionContext,
    pub(crate) generation: Generation,
    pub(crate) phase: GenerationPhase,
    pub(crate) species: Vec<Species>,
    pub(crate) champion: Option<Genome>,
    pub(crate) history: Vec<Vec<f64>>,
    pub(crate) reports: Vec<GenerationReport>,
}

impl Population {
    /// Create `population_size` initial genomes and speciate them.
    pub fn new(config: PopulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let ctx = EvolutionContext::new(&config.genome, seed);
        let mut population = Self {
            config,
            ctx,
            generation: 0,
            phase: GenerationPhase::Initializing,
            species: Vec::new(),
            champion: None,
            history: Vec::new(),
            reports: Vec::new(),
        };
        let mut genomes = Vec::with_capacity(population.config.population_size);
        for _ in 0..population.config.population_size {
            genomes.push(Genome::initial(&population.config.genome, &mut population.ctx)?);
        }
        population.speciate(genomes);
        population.phase = GenerationPhase::Evaluating;
        info!(
            genomes = population.len(),
            species = population.species.len(),
            "population initialized"
        );
        Ok(population)
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn context(&self) -> &EvolutionContext {
        &self.ctx
    }

    /// Generations completed so far.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Best genome ever evaluated.
    pub fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }

    /// Live genomes awaiting evaluation.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|s| s.members.iter())
    }

    pub fn len(&self) -> usize {
        self.species.iter().map(|s| s.members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fitness of every genome evaluated, one entry per generation.
    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    pub fn reports(&self) -> &[GenerationReport] {
        &self.reports
    }

    /// Run generations until `termination` is met and return the champion.
    ///
    /// The bounds are checked only between generations.
    pub fn run<F>(&mut self, evaluate: &F, termination: Termination) -> Result<Genome>
    where
        F: Fn(&mut FeedForwardNetwork) -> f64 + Sync,
    {
        termination.validate()?;
        while !termination.is_met(self.generation, self.champion_fitness()) {
            self.run_generation(evaluate)?;
        }
        self.champion
            .clone()
            .ok_or_else(|| EvolutionError::NoChampion.into())
    }

    /// Evaluate, cull, reproduce and re-speciate once.
    pub fn run_generation<F>(&mut self, evaluate: &F) -> Result<GenerationReport>
    where
        F: Fn(&mut FeedForwardNetwork) -> f64 + Sync,
    {
        self.phase = GenerationPhase::Evaluating;
        let scores = self.evaluate(evaluate)?;
        self.update_champion();

        let species_count = self.species.len();
        for species in &mut self.species {
            species.step_generation(&mut self.ctx)?;
        }

        let report = GenerationReport {
            generation: self.generation,
            species_count,
            champion_fitness: self.champion_fitness().unwrap_or_default(),
            best_fitness: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_fitness: if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            },
            population_size: scores.len(),
        };
        info!(
            generation = report.generation,
            species = report.species_count,
            best = report.best_fitness,
            mean = report.mean_fitness,
            champion = report.champion_fitness,
            "generation evaluated"
        );
        self.history.push(scores);
        self.reports.push(report.clone());

        self.phase = GenerationPhase::Speciating;
        self.remove_stagnated_species();
        self.remove_extinct_species();

        self.phase = GenerationPhase::Reproducing;
        let offspring = self.reproduce()?;
        self.speciate(offspring);

        self.generation += 1;
        self.phase = GenerationPhase::Evaluating;
        Ok(report)
    }

    /// Score every live genome and return the scores in member order.
    fn evaluate<F>(&mut self, evaluate: &F) -> Result<Vec<f64>>
    where
        F: Fn(&mut FeedForwardNetwork) -> f64 + Sync,
    {
        let score = |genome: &mut Genome| -> Result<f64> {
            let mut network = FeedForwardNetwork::from_genome(genome)?;
            let fitness = evaluate(&mut network);
            if !fitness.is_finite() {
                return Err(EvaluationError::NonFiniteFitness {
                    genome: genome.id(),
                    value: fitness,
                }
                .into());
            }
            genome.set_fitness(fitness);
            Ok(fitness)
        };

        let mut genomes: Vec<&mut Genome> = self
            .species
            .iter_mut()
            .flat_map(|s| s.members_mut().iter_mut())
            .collect();
        if self.config.parallel_evaluation {
            genomes.par_iter_mut().map(|g| score(&mut **g)).collect()
        } else {
            genomes.iter_mut().map(|g| score(&mut **g)).collect()
        }
    }

    fn update_champion(&mut self) {
        let best = self
            .genomes()
            .filter_map(|g| g.fitness().map(|fitness| (fitness, g)))
            .max_by(|(a, _), (b, _)| a.total_cmp(b));
        let Some((fitness, best)) = best else { return };
        if self.champion_fitness().map_or(true, |current| fitness > current) {
            debug!(genome = %best.id(), fitness, "new champion");
            let snapshot = best.snapshot();
            self.champion = Some(snapshot);
        }
    }

    fn champion_fitness(&self) -> Option<f64> {
        self.champion.as_ref().and_then(|c| c.fitness())
    }

    /// Drop species that stopped improving, sparing the `species_elitism`
    /// best. Returns the removed ids.
    pub fn remove_stagnated_species(&mut self) -> Vec<SpeciesId> {
        let mut ranked: Vec<(SpeciesId, f64)> = self
            .species
            .iter()
            .map(|s| (s.id, s.best_fitness().unwrap_or(f64::NEG_INFINITY)))
            .collect();
        ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        let protected: Vec<SpeciesId> = ranked
            .into_iter()
            .take(self.config.species_elitism)
            .map(|(id, _)| id)
            .collect();

        let window = self.config.stagnation_window;
        let mut removed = Vec::new();
        self.species.retain(|s| {
            let cull = s.is_stagnated(window) && !protected.contains(&s.id);
            if cull {
                debug!(species = %s.id, age = s.age, best = ?s.best_fitness(), "species stagnated");
                removed.push(s.id);
            }
            !cull
        });
        removed
    }

    /// Drop species with fewer than two ancestors. Returns the removed ids.
    pub fn remove_extinct_species(&mut self) -> Vec<SpeciesId> {
        let mut removed = Vec::new();
        self.species.retain(|s| {
            if s.is_extinct() {
                debug!(species = %s.id, ancestors = s.ancestors.len(), "species extinct");
                removed.push(s.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Offspring quota per species, proportional to recent average fitness.
    fn quotas(&self) -> Vec<usize> {
        if self.species.is_empty() {
            return Vec::new();
        }
        let mut scores: Vec<f64> = self
            .species
            .iter()
            .map(|s| s.average_fitness(self.config.fitness_window))
            .collect();
        let floor = scores.iter().copied().fold(f64::INFINITY, f64::min);
        if floor < 0.0 {
            scores.iter_mut().for_each(|s| *s -= floor);
        }
        let total: f64 = scores.iter().sum();
        let size = self.config.population_size as f64;
        if total <= 0.0 {
            warn!(species = scores.len(), "total species fitness is zero, splitting evenly");
            let even = (size / scores.len() as f64).round() as usize;
            return vec![even; scores.len()];
        }
        scores
            .iter()
            .map(|s| (size * s / total).round() as usize)
            .collect()
    }

    fn reproduce(&mut self) -> Result<Vec<Genome>> {
        let quotas = self.quotas();
        let mut offspring = Vec::with_capacity(self.config.population_size);
        for (species, quota) in self.species.iter().zip(quotas) {
            let children = species.reproduce(quota, &self.config, &mut self.ctx)?;
            debug!(species = %species.id, quota, bred = children.len(), "species reproduced");
            offspring.extend(children);
        }
        if !offspring.is_empty() {
            return Ok(offspring);
        }

        let champion = self
            .champion
            .as_ref()
            .ok_or(EvolutionError::PopulationExhausted)?;
        warn!(
            generation = self.generation,
            "no species left to breed, reseeding from the champion"
        );
        for _ in 0..self.config.population_size {
            let mut child = champion.offspring_copy(self.ctx.next_genome_id());
            child.random_mutation(&self.config.genome, &mut self.ctx);
            offspring.push(child);
        }
        Ok(offspring)
    }

    /// Assign each genome to the first species whose representative it is
    /// compatible with, founding new species as needed. Species left
    /// without members are dropped.
    pub fn speciate(&mut self, genomes: Vec<Genome>) {
        for genome in genomes {
            let home = self.species.iter_mut().find(|s| {
                s.is_compatible(&genome, &self.config.compatibility, &self.config.genome)
            });
            match home {
                Some(species) => species.add_member(genome),
                None => {
                    let id = self.ctx.next_species_id();
                    debug!(species = %id, founder = %genome.id(), "species founded");
                    self.species.push(Species::new(id, genome, self.generation));
                }
            }
        }
        self.species.retain(|s| !s.members.is_empty());
    }
}
