//! Hadoop style XML configuration resources (`core-site.xml`, `hdfs-site.xml`).

use crate::{
  config::Configuration,
  error::{HdfsClientErrorKind::ConfigError, Result},
};
use failure::ResultExt;
use serde::Deserialize;
use std::{fs, io::ErrorKind, path::Path};

#[derive(Debug, Deserialize)]
struct XmlConfiguration {
  #[serde(rename = "property", default)]
  properties: Vec<XmlProperty>,
}

#[derive(Debug, Deserialize)]
struct XmlProperty {
  name: Option<String>,
  value: Option<String>,
  #[serde(rename = "final")]
  is_final: Option<String>,
}

/// Loads one XML resource into `config`. Returns `Ok(false)` when the file does not exist.
pub fn load_resource(config: &mut Configuration, path: &Path) -> Result<bool> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      info!("Configuration resource not found, skipping: {}", path.display());
      return Ok(false);
    }
    Err(e) => {
      return Err(e)
        .context(ConfigError(format!("Failed to read configuration resource {}", path.display())))
        .map_err(Into::into)
    }
  };

  let source = path.display().to_string();
  let count = apply_resource(config, &content, &source)?;
  info!("Loaded {} properties from {}", count, source);
  Ok(true)
}

/// Parses `content` and applies its properties, returning how many were applied.
pub fn apply_resource(config: &mut Configuration, content: &str, source: &str) -> Result<usize> {
  let parsed: XmlConfiguration = serde_xml_rs::from_str(content)
    .map_err(|e| ConfigError(format!("Malformed configuration resource {}: {}", source, e)))?;

  let mut count = 0;
  for property in parsed.properties {
    let name = match property.name.as_ref().map(|n| n.trim()).filter(|n| !n.is_empty()) {
      Some(name) => name,
      None => {
        warn!("{}: property without a name, ignoring", source);
        continue;
      }
    };

    let value = match property.value.as_ref() {
      Some(value) => value.trim(),
      None => {
        debug!("{}: property {} has no value, ignoring", source, name);
        continue;
      }
    };

    let is_final = property.is_final.as_ref().map(|f| f.trim() == "true").unwrap_or(false);
    if config.add_resource_property(name, value, is_final, source) {
      debug!("  {} = {}", name, value);
      count += 1;
    }
  }

  Ok(count)
}
