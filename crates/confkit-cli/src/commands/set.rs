//! `confkit set`
//!
//! TOML files are edited in place with `toml_edit` so comments and layout
//! survive; JSON and YAML files are rewritten.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use confkit_core::source::{DocumentFormat, FileSource, parse_value};
use confkit_schema::{ConfigPath, PathSegment};
use serde_json::Value;
use toml_edit::{DocumentMut, InlineTable, Item, Table};

use crate::error::{CliError, Result};

/// File created when the project has no configuration file yet
const NEW_PROJECT_FILE: &str = "confkit.config.toml";

pub fn run_set(root: &Path, path: &str, raw_value: &str) -> Result<()> {
    let path = ConfigPath::parse(path)?;
    if path.is_root() {
        return Err(CliError::user("Cannot replace the whole configuration"));
    }
    let value = parse_value(raw_value);

    let file = FileSource::project_file(root).unwrap_or_else(|| root.join(NEW_PROJECT_FILE));
    let content = if file.is_file() {
        fs::read_to_string(&file)?
    } else {
        String::new()
    };

    let updated = match DocumentFormat::from_path(&file)? {
        DocumentFormat::Toml => set_toml(&content, &path, &value)?,
        DocumentFormat::Json => {
            let mut document = parse_document(&content, |c| Ok(serde_json::from_str(c)?))?;
            path.set(&mut document, value.clone())?;
            format!("{}\n", serde_json::to_string_pretty(&document)?)
        }
        DocumentFormat::Yaml => {
            let mut document = parse_document(&content, |c| Ok(serde_yaml::from_str(c)?))?;
            path.set(&mut document, value.clone())?;
            serde_yaml::to_string(&document)?
        }
    };
    fs::write(&file, updated)?;

    println!(
        "{} Set {} = {} in {}",
        "✓".green(),
        path.to_string().cyan(),
        value,
        display_name(root, &file)
    );
    Ok(())
}

fn parse_document(content: &str, parse: impl Fn(&str) -> Result<Value>) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    match parse(content)? {
        Value::Null => Ok(Value::Object(Default::default())),
        document => Ok(document),
    }
}

fn display_name(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| file.to_path_buf())
        .display()
        .to_string()
}

/// Set `path` in a TOML document, keeping everything else as written.
fn set_toml(content: &str, path: &ConfigPath, value: &Value) -> Result<String> {
    let mut document: DocumentMut = content.parse()?;

    let keys = path
        .segments()
        .iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => Ok(key.as_str()),
            PathSegment::Index(_) => Err(CliError::user(format!(
                "Array indices are not supported when editing TOML: {}",
                path
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    let Some((last, parents)) = keys.split_last() else {
        return Err(CliError::user("Cannot replace the whole configuration"));
    };

    let mut table: &mut Table = document.as_table_mut();
    for key in parents {
        let item = table.entry(key).or_insert_with(toml_edit::table);
        table = item.as_table_mut().ok_or_else(|| {
            CliError::user(format!("'{}' is not a table in the project file", key))
        })?;
    }
    table[*last] = Item::Value(to_toml(value)?);

    Ok(document.to_string())
}

fn to_toml(value: &Value) -> Result<toml_edit::Value> {
    Ok(match value {
        Value::Null => return Err(CliError::user("TOML cannot store null values")),
        Value::Bool(flag) => (*flag).into(),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => integer.into(),
            None => number.as_f64().unwrap_or_default().into(),
        },
        Value::String(text) => text.as_str().into(),
        Value::Array(items) => {
            let mut array = toml_edit::Array::new();
            for item in items {
                array.push(to_toml(item)?);
            }
            array.into()
        }
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, item) in map {
                table.insert(key.as_str(), to_toml(item)?);
            }
            table.into()
        }
    })
}
