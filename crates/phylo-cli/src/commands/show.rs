//! Show the champion genome and its network.

use anyhow::{Context, Result};
use colored::Colorize;
use phylo::prelude::*;

use super::load_current;
use crate::tasks::{xor_outputs, XOR_CASES};

pub fn run(genes: bool) -> Result<()> {
    let population = load_current()?;
    let champion = population
        .champion()
        .context("The session has no champion yet")?;
    let mut network = FeedForwardNetwork::from_genome(champion)?;

    println!(
        "{} {} (fitness {:.4})",
        "Champion".bold(),
        champion.id().to_string().cyan(),
        champion.fitness().unwrap_or_default()
    );
    println!(
        "  Nodes: {} enabled of {}",
        champion.enabled_nodes().count().to_string().cyan(),
        champion.node_count()
    );
    println!(
        "  Edges: {} enabled of {}",
        champion.enabled_edges().count().to_string().cyan(),
        champion.edge_count()
    );
    println!("  {}", network);

    println!();
    println!("{}", "Layers".bold());
    for (layer, nodes) in network.layers().iter().enumerate() {
        let ids: Vec<String> = nodes.iter().map(|id| id.to_string()).collect();
        println!("  {:>3}: {}", layer, ids.join(" "));
    }

    if genes {
        println!();
        println!("{}", "Genes".bold());
        println!("{}", champion);
    }

    println!();
    println!("{}", "XOR".bold());
    let outputs = xor_outputs(&mut network)?;
    for ((inputs, expected), output) in XOR_CASES.iter().zip(outputs) {
        let mark = if (output - expected).abs() < 0.1 {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {:?} → {:.4} (expected {})",
            mark, inputs, output, expected
        );
    }

    Ok(())
}
