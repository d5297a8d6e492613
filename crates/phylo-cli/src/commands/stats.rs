//! Show generation statistics and the species table.

use anyhow::Result;
use colored::Colorize;
use phylo::runtime::metrics;

use super::load_current;

pub fn run(elite: f64, last: Option<usize>) -> Result<()> {
    let population = load_current()?;

    let stats = metrics::compute_with_elite(population.history(), elite);
    let skip = last.map_or(0, |n| stats.len().saturating_sub(n));

    println!("{}", "Phylo Run Statistics".bold());
    println!("{}", "═".repeat(56));
    println!(
        "  Generations:  {}",
        population.generation().to_string().cyan()
    );
    println!("  Genomes:      {}", population.len().to_string().cyan());
    println!(
        "  Species:      {}",
        population.species().len().to_string().cyan()
    );
    if let Some(fitness) = population.champion().and_then(|c| c.fitness()) {
        println!("  Champion:     {}", format!("{:.4}", fitness).green());
    }
    println!(
        "  Innovations:  {}",
        population.context().innovations().len().to_string().cyan()
    );

    if !stats.is_empty() {
        println!();
        println!("{}", metrics::header().bold());
        for stat in &stats[skip..] {
            println!("{}", stat);
        }
    }

    if !population.species().is_empty() {
        println!();
        println!(
            "{}",
            format!(
                "{:>12} {:>5} {:>8} {:>10} {:>10}",
                "species", "age", "members", "best", "champion"
            )
            .bold()
        );
        for species in population.species() {
            let best = species
                .best_fitness()
                .map_or_else(|| "-".to_string(), |f| format!("{:.4}", f));
            let champion = species
                .champion()
                .and_then(|c| c.fitness())
                .map_or_else(|| "-".to_string(), |f| format!("{:.4}", f));
            println!(
                "{:>12} {:>5} {:>8} {:>10} {:>10}",
                species.id().to_string(),
                species.age(),
                species.members().len(),
                best,
                champion
            );
        }
    }

    Ok(())
}
