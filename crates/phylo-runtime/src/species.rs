//! Species — a cluster of structurally similar genomes.
//!
//! A species collects the current generation's members, freezes them as
//! ancestors once their fitness is known, and breeds the next generation's
//! offspring from those ancestors. Offspring are handed back to the
//! population unassigned; re-speciation decides where they land.

use crate::population::PopulationConfig;
use phylo_core::error::Result;
use phylo_core::types::{Generation, SpeciesId};
use phylo_genome::compatibility::CompatibilityConfig;
use phylo_genome::config::GenomeConfig;
use phylo_genome::context::EvolutionContext;
use phylo_genome::crossover::crossover;
use phylo_genome::genome::Genome;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Species {
    pub(crate) id: SpeciesId,
    pub(crate) founded: Generation,
    pub(crate) age: u64,
    pub(crate) members: Vec<Genome>,
    pub(crate) ancestors: Vec<Genome>,
    pub(crate) representative: Genome,
    pub(crate) champion: Option<Genome>,
    /// Best member fitness of every completed generation, oldest first.
    pub(crate) fitness_history: Vec<f64>,
}

impl Species {
    /// Found a species around its first member.
    pub fn new(id: SpeciesId, founder: Genome, generation: Generation) -> Self {
        Self {
            id,
            founded: generation,
            age: 0,
            representative: founder.snapshot(),
            members: vec![founder],
            ancestors: Vec::new(),
            champion: None,
            fitness_history: Vec::new(),
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Generation in which the species was founded.
    pub fn founded(&self) -> Generation {
        self.founded
    }

    /// Completed generations since founding.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Current-generation members, best first after `step_generation`.
    pub fn members(&self) -> &[Genome] {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut [Genome] {
        &mut self.members
    }

    /// Last generation's members, frozen, best first.
    pub fn ancestors(&self) -> &[Genome] {
        &self.ancestors
    }

    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    /// Best genome this species has ever produced.
    pub fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }

    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    /// Best fitness of the most recent completed generation.
    pub fn best_fitness(&self) -> Option<f64> {
        self.fitness_history.last().copied()
    }

    pub fn add_member(&mut self, genome: Genome) {
        self.members.push(genome);
    }

    /// Whether `genome` is close enough to the representative to join.
    pub fn is_compatible(
        &self,
        genome: &Genome,
        compat: &CompatibilityConfig,
        config: &GenomeConfig,
    ) -> bool {
        compat.is_compatible(&self.representative, genome, config)
    }

    /// Close the generation. Every member must carry a fitness.
    ///
    /// Members are ranked best first and frozen as ancestors, the champion
    /// is updated, and a random ancestor becomes the new representative so
    /// one early high scorer does not anchor compatibility tests forever.
    pub fn step_generation(&mut self, ctx: &mut EvolutionContext) -> Result<()> {
        let mut ranked = Vec::with_capacity(self.members.len());
        for genome in self.members.drain(..) {
            let fitness = genome.require_fitness()?;
            ranked.push((fitness, genome));
        }
        ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        self.ancestors = ranked.into_iter().map(|(_, g)| g).collect();
        self.age += 1;

        if let Some(best) = self.ancestors.first() {
            let fitness = best.fitness().unwrap_or_default();
            let improved = self
                .champion
                .as_ref()
                .and_then(|c| c.fitness())
                .map_or(true, |current| fitness > current);
            if improved {
                self.champion = Some(best.snapshot());
            }
            self.fitness_history.push(fitness);
        }
        if let Some(representative) = self.ancestors.choose(ctx.rng()) {
            self.representative = representative.snapshot();
        }
        Ok(())
    }

    /// True when, over the last `window` generations, the best fitness never
    /// rose above its value in the first generation of the window.
    pub fn is_stagnated(&self, window: usize) -> bool {
        let history = &self.fitness_history;
        if window == 0 || history.len() < window {
            return false;
        }
        let opened = history.len() - window;
        let start = history[opened];
        let recent = history[opened + 1..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        recent <= start
    }

    /// Fewer than two ancestors: nothing left to breed from.
    pub fn is_extinct(&self) -> bool {
        self.ancestors.len() < 2
    }

    /// Mean best fitness over the last `window` generations.
    pub fn average_fitness(&self, window: usize) -> f64 {
        let window = window.max(1).min(self.fitness_history.len());
        if window == 0 {
            return 0.0;
        }
        let recent = &self.fitness_history[self.fitness_history.len() - window..];
        recent.iter().sum::<f64>() / window as f64
    }

    /// Breed `count` offspring from the ancestors.
    ///
    /// The first `elites_per_species` ancestors are copied unchanged. The
    /// rest are crossovers of two distinct parents drawn from the top
    /// `reproduction_elitism` fraction (at least two), mutated when
    /// `mutate_offspring` is set. With fewer than two ancestors no
    /// offspring are produced.
    pub fn reproduce(
        &self,
        count: usize,
        config: &PopulationConfig,
        ctx: &mut EvolutionContext,
    ) -> Result<Vec<Genome>> {
        if self.is_extinct() || count == 0 {
            return Ok(Vec::new());
        }
        let mut offspring = Vec::with_capacity(count);

        let elites = config
            .elites_per_species
            .min(count)
            .min(self.ancestors.len());
        for elite in &self.ancestors[..elites] {
            offspring.push(elite.offspring_copy(ctx.next_genome_id()));
        }

        let pool_size = ((config.reproduction_elitism * self.ancestors.len() as f64) as usize)
            .max(2)
            .min(self.ancestors.len());
        let pool = &self.ancestors[..pool_size];
        while offspring.len() < count {
            let first = ctx.rng().gen_range(0..pool.len());
            let mut second = ctx.rng().gen_range(0..pool.len() - 1);
            if second >= first {
                second += 1;
            }
            let mut child = crossover(&pool[first], &pool[second], &config.genome, ctx)?;
            if config.mutate_offspring {
                child.random_mutation(&config.genome, ctx);
            }
            offspring.push(child);
        }
        Ok(offspring)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} age={} members={} ancestors={}",
            self.id,
            self.age,
            self.members.len(),
            self.ancestors.len()
        )?;
        if let Some(best) = self.best_fitness() {
            write!(f, " best={:.4}", best)?;
        }
        if let Some(fitness) = self.champion.as_ref().and_then(|c| c.fitness()) {
            write!(f, " champion={:.4}", fitness)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(size: usize, seed: u64) -> (PopulationConfig, EvolutionContext, Species) {
        let config = PopulationConfig::default();
        let mut ctx = EvolutionContext::new(&config.genome, seed);
        let founder = Genome::initial(&config.genome, &mut ctx).unwrap();
        let id = ctx.next_species_id();
        let mut species = Species::new(id, founder, 0);
        for _ in 1..size {
            species.add_member(Genome::initial(&config.genome, &mut ctx).unwrap());
        }
        (config, ctx, species)
    }

    fn score(species: &mut Species, scores: &[f64]) {
        for (genome, fitness) in species.members_mut().iter_mut().zip(scores) {
            genome.set_fitness(*fitness);
        }
    }

    #[test]
    fn step_generation_ranks_and_freezes() {
        let (_, mut ctx, mut species) = setup(4, 1);
        score(&mut species, &[1.0, 3.0, 2.0, 0.5]);
        species.step_generation(&mut ctx).unwrap();

        let ranked: Vec<f64> = species.ancestors().iter().filter_map(|g| g.fitness()).collect();
        assert_eq!(ranked, vec![3.0, 2.0, 1.0, 0.5]);
        assert!(species.members().is_empty());
        assert_eq!(species.champion().and_then(|c| c.fitness()), Some(3.0));
        assert_eq!(species.best_fitness(), Some(3.0));
        assert_eq!(species.age(), 1);
        assert!(species
            .ancestors()
            .iter()
            .any(|g| g.id() == species.representative().id()));
    }

    #[test]
    fn step_generation_needs_fitness() {
        let (_, mut ctx, mut species) = setup(2, 2);
        assert!(species.step_generation(&mut ctx).is_err());
    }

    #[test]
    fn champion_only_improves() {
        let (config, mut ctx, mut species) = setup(2, 3);
        score(&mut species, &[2.0, 1.0]);
        species.step_generation(&mut ctx).unwrap();
        for _ in 0..2 {
            species.add_member(Genome::initial(&config.genome, &mut ctx).unwrap());
        }
        score(&mut species, &[0.5, 0.25]);
        species.step_generation(&mut ctx).unwrap();
        assert_eq!(species.champion().and_then(|c| c.fitness()), Some(2.0));
        assert_eq!(species.fitness_history(), &[2.0, 0.5]);
    }

    #[test]
    fn stagnation_compares_against_window_start() {
        let (_, _, mut species) = setup(1, 4);
        species.fitness_history = vec![1.0, 2.0, 2.0, 2.0];
        assert!(species.is_stagnated(3));
        assert!(!species.is_stagnated(4));
        species.fitness_history.push(2.5);
        assert!(!species.is_stagnated(3));
        assert!(!species.is_stagnated(0));
    }

    #[test]
    fn flat_history_stagnates_once_it_fills_the_window() {
        let (_, _, mut species) = setup(1, 8);
        species.fitness_history = vec![2.0, 2.0];
        assert!(!species.is_stagnated(3));
        species.fitness_history.push(2.0);
        assert!(species.is_stagnated(3));
        species.fitness_history = vec![3.0, 2.5, 2.9];
        assert!(species.is_stagnated(3));
    }

    #[test]
    fn average_fitness_uses_recent_window() {
        let (_, _, mut species) = setup(1, 5);
        assert_eq!(species.average_fitness(5), 0.0);
        species.fitness_history = vec![10.0, 1.0, 2.0, 3.0];
        assert_eq!(species.average_fitness(3), 2.0);
        assert_eq!(species.average_fitness(10), 4.0);
    }

    #[test]
    fn reproduce_fills_the_quota() {
        let (config, mut ctx, mut species) = setup(6, 6);
        score(&mut species, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        species.step_generation(&mut ctx).unwrap();

        let offspring = species.reproduce(10, &config, &mut ctx).unwrap();
        assert_eq!(offspring.len(), 10);
        assert!(offspring.iter().all(|g| g.fitness().is_none()));
        // elite copy keeps the best ancestor's genes under a new id
        let elite = &offspring[0];
        let best = &species.ancestors()[0];
        assert_ne!(elite.id(), best.id());
        assert_eq!(elite.edges().collect::<Vec<_>>(), best.edges().collect::<Vec<_>>());
    }

    #[test]
    fn extinct_species_do_not_reproduce() {
        let (config, mut ctx, mut species) = setup(1, 7);
        score(&mut species, &[1.0]);
        species.step_generation(&mut ctx).unwrap();
        assert!(species.is_extinct());
        assert!(species.reproduce(5, &config, &mut ctx).unwrap().is_empty());
    }
}
