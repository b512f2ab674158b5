use std::fs;
use std::path::Path;

use crate::error::RpcError;
use crate::options::Options;

/// Encodings an options file may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionsFormat {
    Json,
    Yaml,
    Toml,
}

impl OptionsFormat {
    /// Pick the format from the file extension, falling back to the content
    /// when there is none. Unknown extensions are rejected.
    pub fn detect(path: &Path, content: &str) -> Result<Self, RpcError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "json" => Ok(OptionsFormat::Json),
                "yaml" | "yml" => Ok(OptionsFormat::Yaml),
                "toml" => Ok(OptionsFormat::Toml),
                _ => Err(RpcError::UnsupportedFormat(ext.to_string())),
            },
            None => Ok(sniff(content)),
        }
    }
}

/// `{` opens JSON, a `key = value` line means TOML, anything else is YAML.
fn sniff(content: &str) -> OptionsFormat {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    match lines.next() {
        Some(line) if line.starts_with('{') => OptionsFormat::Json,
        Some(line) if is_toml_assignment(line) => OptionsFormat::Toml,
        _ => OptionsFormat::Yaml,
    }
}

fn is_toml_assignment(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| {
        let key = key.trim();
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}

/// Load [`Options`] from a JSON, YAML or TOML file.
pub fn load_options(path: &Path) -> Result<Options, RpcError> {
    let content = fs::read_to_string(path)?;
    parse_options(path, &content)
}

fn parse_options(path: &Path, content: &str) -> Result<Options, RpcError> {
    match OptionsFormat::detect(path, content)? {
        OptionsFormat::Json => Ok(serde_json::from_str(content)?),
        OptionsFormat::Yaml => Ok(serde_yaml_bw::from_str(content)?),
        OptionsFormat::Toml => Ok(toml::from_str(content)?),
    }
}
