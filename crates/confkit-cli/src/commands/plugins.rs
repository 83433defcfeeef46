//! `confkit plugins`

use colored::Colorize;
use confkit_plugins::builtin_registrations;

use crate::context::Project;
use crate::error::Result;

pub fn run_plugins(project: &Project) -> Result<()> {
    let registry = project.toolkit().registry();

    println!("{}", "Installed plugins".bold());
    if registry.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for plugin in registry.iter() {
        println!(
            "  {} {:<16} {:<8} {}",
            "+".green(),
            plugin.name(),
            plugin.version(),
            plugin.description().unwrap_or_default().dimmed()
        );
    }

    let available: Vec<_> = builtin_registrations()
        .iter()
        .filter(|r| !registry.contains(r.name))
        .collect();
    if !available.is_empty() {
        println!();
        println!("{}", "Available plugins".bold());
        for registration in available {
            println!(
                "    {:<16} {}",
                registration.name,
                registration.category.dimmed()
            );
        }
    }
    Ok(())
}
