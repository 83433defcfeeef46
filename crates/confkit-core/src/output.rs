//! Rendering resolved configuration to output formats

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use similar::TextDiff;

use crate::{Error, Result};

/// First line of every generated script
pub const BANNER: &str = "// Generated by confkit. Do not edit.";

/// Target formats for rendered configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// TypeScript module exporting a `const` object
    Ts,
    /// ES module with a default export
    Js,
}

impl OutputFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Ts => "ts",
            Self::Js => "js",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "ts" => Ok(Self::Ts),
            "js" => Ok(Self::Js),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Serialize `value` in `format`.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Ts => format!(
            "{}\nconst config = {} as const;\n\nexport default config;\n",
            BANNER,
            serde_json::to_string_pretty(value)?
        ),
        OutputFormat::Js => format!(
            "{}\nexport default {};\n",
            BANNER,
            serde_json::to_string_pretty(value)?
        ),
    };
    Ok(rendered)
}

/// Unified diff from `current` to `rendered`, or `None` when identical.
pub fn diff_output(label: &str, current: &str, rendered: &str) -> Option<String> {
    if current == rendered {
        return None;
    }
    let diff = TextDiff::from_lines(current, rendered);
    Some(
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", label), &format!("b/{}", label))
            .to_string(),
    )
}
