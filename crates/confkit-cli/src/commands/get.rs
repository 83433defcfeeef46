//! `confkit get`

use confkit_schema::ConfigPath;

use super::display_value;
use crate::context::Project;
use crate::error::{CliError, Result};

pub async fn run_get(project: &Project, path: &str, json: bool) -> Result<()> {
    let path = ConfigPath::parse(path)?;
    let resolved = project.resolve().await?;

    let value = resolved
        .get(&path)
        .ok_or_else(|| CliError::user(format!("No value at '{}'", path)))?;
    tracing::debug!(path = %path, source = ?resolved.source_of(&path), "Resolved value");
    println!("{}", display_value(value, json)?);
    Ok(())
}
