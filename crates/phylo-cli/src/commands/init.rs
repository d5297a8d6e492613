//! Initialize a new Phylo project.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Config;

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    println!("{} Initializing Phylo project...", "→".blue());

    // Create .phylo directory
    let phylo_dir = base_path.join(".phylo");
    std::fs::create_dir_all(&phylo_dir)
        .with_context(|| format!("Failed to create {}", phylo_dir.display()))?;
    println!("  {} Created {}", "✓".green(), phylo_dir.display());

    // Create sessions directory
    let sessions_dir = phylo_dir.join("sessions");
    std::fs::create_dir_all(&sessions_dir)
        .with_context(|| format!("Failed to create {}", sessions_dir.display()))?;
    println!("  {} Created {}", "✓".green(), sessions_dir.display());

    // Create default config
    let config_path = base_path.join("phylo.toml");
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    let gitignore_path = phylo_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, "current.json\nsessions/\n")?;
        println!("  {} Created {}", "✓".green(), gitignore_path.display());
    }

    println!();
    println!("{} Phylo project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} phylo run", "1.".blue());
    println!("  {} phylo stats", "2.".blue());
    println!("  {} phylo show", "3.".blue());

    Ok(())
}
