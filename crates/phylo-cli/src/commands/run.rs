//! Evolve the XOR task, starting fresh or resuming the current session.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use phylo::prelude::*;

use crate::config::{current_session_path, Config};
use crate::tasks::{xor_fitness, XOR_MAX_FITNESS};

pub struct RunOptions {
    pub generations: Option<u64>,
    pub goal: Option<f64>,
    pub seed: Option<u64>,
    pub fresh: bool,
}

pub fn run(options: RunOptions, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let session_path = current_session_path()?;

    let mut population = if session_path.exists() && !options.fresh {
        println!("{} Resuming session...", "→".blue());
        load_from_path(&session_path)
            .with_context(|| format!("Failed to load session: {}", session_path.display()))?
    } else {
        let seed = options.seed.unwrap_or(config.run.seed);
        println!(
            "{} Creating population (seed {})...",
            "→".blue(),
            seed.to_string().cyan()
        );
        Population::new(config.population.clone(), seed)?
    };

    let shape = &population.config().genome;
    if shape.num_inputs != 2 || shape.num_outputs != 1 {
        bail!(
            "XOR needs 2 inputs and 1 output, the population has {} and {}",
            shape.num_inputs,
            shape.num_outputs
        );
    }

    let generations = options.generations.unwrap_or(config.run.generations);
    let goal = options.goal.or(config.run.fitness_goal);
    let start = population.generation();
    let termination = Termination {
        max_generations: Some(start + generations),
        fitness_goal: goal,
    };
    termination.validate()?;

    println!(
        "  Generation {}, {} genomes in {} species",
        start.to_string().cyan(),
        population.len().to_string().cyan(),
        population.species().len().to_string().cyan()
    );
    println!(
        "{} Evolving for up to {} generations...",
        "→".blue(),
        generations.to_string().cyan()
    );

    let pb = ProgressBar::new(generations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} generations {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    while !termination.is_met(
        population.generation(),
        population.champion().and_then(|c| c.fitness()),
    ) {
        let report = population.run_generation(&xor_fitness)?;
        if verbose {
            pb.println(format!("  {}", report));
        }
        pb.set_message(format!("champion {:.4}", report.champion_fitness));
        pb.inc(1);
    }
    pb.finish_and_clear();

    save_to_path(&population, &session_path)?;

    let champion = population
        .champion()
        .context("No generation was evaluated")?;
    let fitness = champion.fitness().unwrap_or_default();
    let solved = goal.map_or(false, |g| fitness >= g);

    println!();
    if solved {
        println!("{} Goal reached!", "✓".green().bold());
    } else {
        println!("{} Run complete.", "✓".green().bold());
    }
    println!(
        "  Generations: {} → {}",
        start.to_string().yellow(),
        population.generation().to_string().green()
    );
    println!(
        "  Champion: {} ({:.4} / {:.1})",
        champion.id().to_string().cyan(),
        fitness,
        XOR_MAX_FITNESS
    );
    println!("  Species: {}", population.species().len().to_string().cyan());
    println!("  Saved to {}", session_path.display());

    Ok(())
}
