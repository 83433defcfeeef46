//! `confkit validate`

use std::fs;
use std::path::Path;

use colored::Colorize;
use confkit_core::Error as CoreError;
use confkit_core::source::{DocumentFormat, parse_fragment};
use confkit_schema::{Schema, ValidationError};
use serde_json::Value;

use crate::context::Project;
use crate::error::{CliError, Result};

pub async fn run_validate(
    project: &Project,
    schema_path: Option<&Path>,
    data_path: Option<&Path>,
) -> Result<()> {
    let schema = match schema_path {
        Some(path) => Schema::from_value(&read_document(&project.root().join(path))?)?,
        None => project.toolkit().schema(),
    };

    let data = match data_path {
        Some(path) => read_document(&project.root().join(path))?,
        None => match project.resolve().await {
            Ok(resolved) => resolved.to_value(),
            Err(CliError::Core(CoreError::Validation { errors })) => return report(&errors),
            Err(other) => return Err(other.into()),
        },
    };

    let result = project.toolkit().validator().validate(&data, &schema)?;
    report(&result.errors)
}

fn read_document(path: &Path) -> Result<Value> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Cannot read {}: {}", path.display(), e)))?;
    let fragment = parse_fragment(&content, format, &path.display().to_string())?;
    Ok(Value::Object(fragment))
}

fn report(errors: &[ValidationError]) -> Result<()> {
    if errors.is_empty() {
        println!("{} Configuration is valid", "✓".green());
        return Ok(());
    }
    for error in errors {
        println!("  {} {}", "✗".red(), error);
    }
    Err(CliError::user(format!(
        "{} validation error(s)",
        errors.len()
    )))
}
