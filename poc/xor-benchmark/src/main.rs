//! XOR Benchmark: Starting Topology Versus Time To Solve
//!
//! Evolves XOR from two starting points over the same seeds and compares
//! how often and how quickly each one reaches the fitness goal.
//!
//! Protocol:
//! 1. MINIMAL: inputs wired straight to the output, no hidden nodes
//! 2. HIDDEN: inputs wired through a two-node hidden layer
//! 3. Each condition runs seeds 0..SEEDS, population 150, at most
//!    MAX_GENERATIONS generations, goal fitness 3.99 (of 4.0)
//! 4. Report success rate, generations to solve, species count and
//!    champion size; `--json` prints the raw results instead

use phylo::prelude::*;
use serde::Serialize;
use std::time::Instant;

const SEEDS: u64 = 8;
const MAX_GENERATIONS: u64 = 300;
const GOAL: f64 = 3.99;

const XOR: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn xor_fitness(network: &mut FeedForwardNetwork) -> f64 {
    let mut error = 0.0;
    for (inputs, expected) in XOR {
        match network.activate(&inputs) {
            Ok(outputs) => error += (outputs[0] - expected).powi(2),
            Err(_) => return 0.0,
        }
    }
    4.0 - error
}

#[derive(Debug, Clone, Serialize)]
struct SeedResult {
    condition: String,
    seed: u64,
    solved: bool,
    generations: u64,
    champion_fitness: f64,
    species: usize,
    hidden_nodes: usize,
    enabled_edges: usize,
    millis: u128,
}

fn run_condition(name: &str, initial_hidden_nodes: usize) -> phylo::prelude::Result<Vec<SeedResult>> {
    let mut results = Vec::new();
    for seed in 0..SEEDS {
        let mut config = PopulationConfig::with_shape(2, 1);
        config.genome.initial_hidden_nodes = initial_hidden_nodes;

        let started = Instant::now();
        let mut population = Population::new(config, seed)?;
        let champion = population.run(&xor_fitness, Termination::either(MAX_GENERATIONS, GOAL))?;
        let fitness = champion.fitness().unwrap_or_default();

        let result = SeedResult {
            condition: name.to_string(),
            seed,
            solved: fitness >= GOAL,
            generations: population.generation(),
            champion_fitness: fitness,
            species: population.species().len(),
            hidden_nodes: champion.enabled_nodes().filter(|n| n.is_hidden()).count(),
            enabled_edges: champion.enabled_edges().count(),
            millis: started.elapsed().as_millis(),
        };
        println!(
            "  seed {:>2} │ {:>6} {:>5} {:>8.4} {:>4} {:>4} {:>4} {:>7}ms",
            seed,
            if result.solved { "solved" } else { "-" },
            result.generations,
            result.champion_fitness,
            result.species,
            result.hidden_nodes,
            result.enabled_edges,
            result.millis
        );
        results.push(result);
    }
    println!();
    Ok(results)
}

fn summarize(name: &str, results: &[SeedResult]) {
    let solved: Vec<&SeedResult> = results.iter().filter(|r| r.solved).collect();
    let mean_generations = if solved.is_empty() {
        f64::NAN
    } else {
        solved.iter().map(|r| r.generations as f64).sum::<f64>() / solved.len() as f64
    };
    let mean_hidden = if solved.is_empty() {
        f64::NAN
    } else {
        solved.iter().map(|r| r.hidden_nodes as f64).sum::<f64>() / solved.len() as f64
    };
    println!(
        "    {:>10} │ {:>3}/{:<3} {:>9.1} {:>9.2}",
        name,
        solved.len(),
        results.len(),
        mean_generations,
        mean_hidden
    );
}

fn main() -> phylo::prelude::Result<()> {
    let json = std::env::args().any(|a| a == "--json");

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║  XOR Benchmark: Starting Topology vs Time To Solve  ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {:>7} │ {:>6} {:>5} {:>8} {:>4} {:>4} {:>4} {:>9}",
        "", "", "gens", "fitness", "spc", "hid", "edg", "time");

    println!("── Condition 1: Minimal start (no hidden nodes) ─────────");
    let minimal = run_condition("minimal", 0)?;

    println!("── Condition 2: Hidden start (two hidden nodes) ─────────");
    let hidden = run_condition("hidden", 2)?;

    println!("── Comparison ───────────────────────────────────────────");
    println!();
    println!("    {:>10} │ {:>7} {:>9} {:>9}", "Condition", "Solved", "AvgGens", "AvgHid");
    summarize("Minimal", &minimal);
    summarize("Hidden", &hidden);

    if json {
        let all: Vec<&SeedResult> = minimal.iter().chain(hidden.iter()).collect();
        println!();
        println!("{}", serde_json::to_string_pretty(&all)?);
    }

    Ok(())
}
