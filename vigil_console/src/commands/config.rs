//! Config command - inspect or initialize the console configuration

use anyhow::Context;
use colored::*;

use vigil_core::ConsoleConfig;

/// Print the effective configuration after file and environment layering
pub fn show() -> anyhow::Result<()> {
    let config = ConsoleConfig::load()?;
    match ConsoleConfig::path() {
        Some(path) if path.exists() => {
            println!("{} {}", "# config file:".dimmed(), path.display())
        }
        _ => println!("{}", "# no config file found, showing defaults".dimmed()),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Write a default config file for editing
pub fn init(force: bool) -> anyhow::Result<()> {
    let path = ConsoleConfig::path().context("no config directory available on this system")?;
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, ConsoleConfig::default().to_toml_string()?)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
