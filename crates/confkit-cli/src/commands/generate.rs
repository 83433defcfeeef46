//! `confkit generate`

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use confkit_core::{GeneratedFile, OutputFormat, diff_output, render};

use crate::context::Project;
use crate::error::{CliError, Result};

pub async fn run_generate(
    project: &Project,
    format: Option<&str>,
    output: Option<&Path>,
    check: bool,
) -> Result<()> {
    let resolved = project.resolve().await?;

    let files = if format.is_some() || output.is_some() {
        let format = output_format(format, output)?;
        let contents = render(&resolved.to_value(), format)?;
        match output {
            Some(path) => vec![GeneratedFile::new(path, contents)],
            None if check => {
                return Err(CliError::user("--check needs --output when rendering"));
            }
            None => {
                print!("{}", contents);
                return Ok(());
            }
        }
    } else {
        project.toolkit().generate(&resolved)?
    };

    if files.is_empty() {
        println!("{}", "No installed plugin generates files".dimmed());
        return Ok(());
    }

    if check {
        check_files(project.root(), &files)
    } else {
        write_files(project.root(), &files)
    }
}

fn output_format(format: Option<&str>, output: Option<&Path>) -> Result<OutputFormat> {
    if let Some(name) = format {
        return Ok(name.parse()?);
    }
    let extension = output
        .and_then(|path| path.extension())
        .and_then(|e| e.to_str())
        .unwrap_or("json");
    Ok(extension.parse()?)
}

fn target(root: &Path, file: &GeneratedFile) -> PathBuf {
    if file.path.is_absolute() {
        file.path.clone()
    } else {
        root.join(&file.path)
    }
}

fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = target(root, file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.contents)?;
        tracing::debug!(path = %path.display(), bytes = file.contents.len(), "Wrote generated file");
        println!("  {} {}", "+".green(), file.path.display());
    }
    println!("{} Generated {} file(s)", "✓".green(), files.len());
    Ok(())
}

fn check_files(root: &Path, files: &[GeneratedFile]) -> Result<()> {
    let mut stale = 0;
    for file in files {
        let current = fs::read_to_string(target(root, file)).unwrap_or_default();
        let label = file.path.display().to_string();
        if let Some(diff) = diff_output(&label, &current, &file.contents) {
            stale += 1;
            print!("{}", diff);
        }
    }
    if stale > 0 {
        return Err(CliError::user(format!(
            "{} generated file(s) out of date; run `confkit generate`",
            stale
        )));
    }
    println!("{} Generated files are up to date", "✓".green());
    Ok(())
}
