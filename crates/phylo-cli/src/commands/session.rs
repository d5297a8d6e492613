//! Session management commands.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use phylo::prelude::*;

use crate::config::{current_session_path, sessions_dir};

pub fn save(name: &str) -> Result<()> {
    let current_path = current_session_path()?;

    if !current_path.exists() {
        bail!("No active session. Run {} first.", "phylo run".cyan());
    }

    let sessions = sessions_dir()?;
    std::fs::create_dir_all(&sessions)?;

    let session_path = sessions.join(format!("{}.json", name));
    std::fs::copy(&current_path, &session_path)
        .with_context(|| format!("Failed to save session: {}", name))?;

    println!("{} Session saved: {}", "✓".green().bold(), name.cyan());

    Ok(())
}

pub fn load(name: &str) -> Result<()> {
    let sessions = sessions_dir()?;
    let session_path = sessions.join(format!("{}.json", name));

    if !session_path.exists() {
        bail!("Session not found: {}", name);
    }

    // Restore once to make sure the file is valid before replacing the current one
    let population = load_from_path(&session_path)
        .with_context(|| format!("Session is corrupt: {}", name))?;

    let current_path = current_session_path()?;
    std::fs::copy(&session_path, &current_path)
        .with_context(|| format!("Failed to load session: {}", name))?;

    println!("{} Session loaded: {}", "✓".green().bold(), name.cyan());
    println!(
        "  Generation: {}",
        population.generation().to_string().cyan()
    );
    println!("  Genomes: {}", population.len().to_string().cyan());

    Ok(())
}

pub fn list() -> Result<()> {
    let sessions = sessions_dir()?;

    if !sessions.exists() {
        println!("No saved sessions.");
        return Ok(());
    }

    let mut entries: Vec<_> = std::fs::read_dir(&sessions)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    if entries.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    println!("{}", "Saved sessions:".bold());
    for entry in entries {
        let path = entry.path();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let summary = std::fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str::<PopulationState>(&json).ok())
            .map(|state| {
                format!(
                    "generation {}, champion {}",
                    state.metadata.generation,
                    state
                        .metadata
                        .champion_fitness
                        .map_or_else(|| "-".to_string(), |f| format!("{:.4}", f))
                )
            })
            .unwrap_or_else(|| "unreadable".to_string());
        println!("  {} {}", name.cyan(), summary);
    }

    Ok(())
}
