//! `confkit schema`

use crate::context::Project;
use crate::error::Result;

pub fn run_schema(project: &Project) -> Result<()> {
    let schema = project.toolkit().schema();
    println!("{}", serde_json::to_string_pretty(&schema.to_value())?);
    Ok(())
}
