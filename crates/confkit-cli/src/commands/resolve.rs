//! `confkit resolve`

use colored::Colorize;
use confkit_core::{OutputFormat, render};
use serde_json::json;

use super::display_value;
use crate::context::Project;
use crate::error::Result;

pub async fn run_resolve(project: &Project, json: bool, provenance: bool) -> Result<()> {
    let resolved = project.resolve().await?;

    if json {
        let output = if provenance {
            json!({
                "config": resolved.to_value(),
                "provenance": resolved.provenance_value(),
            })
        } else {
            resolved.to_value()
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !provenance {
        print!("{}", render(&resolved.to_value(), OutputFormat::Yaml)?);
        return Ok(());
    }

    let width = resolved
        .provenance()
        .keys()
        .map(|path| path.to_string().len())
        .max()
        .unwrap_or(0);
    for (path, kind) in resolved.provenance() {
        let value = match resolved.get(path) {
            Some(value) => display_value(value, true)?.replace('\n', " "),
            None => String::new(),
        };
        println!(
            "  {:<width$}  {}  {}",
            path.to_string(),
            value,
            format!("({})", kind).dimmed(),
            width = width
        );
    }
    Ok(())
}
