//! Reader for flat `java.util.Properties` style files, e.g. `client.conf`.

use crate::error::{HdfsClientErrorKind::ConfigError, Result};
use std::{
  collections::{btree_map, BTreeMap},
  fs,
  io::ErrorKind,
  path::Path,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
  entries: BTreeMap<String, String>,
}

impl Properties {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn parse(content: &str) -> Result<Self> {
    let mut properties = Properties::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
      let line = line.trim_start_matches(is_whitespace);
      if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        continue;
      }

      let mut logical = line.to_string();
      while has_continuation(&logical) {
        logical.pop();
        match lines.next() {
          Some(next) => logical.push_str(next.trim_start_matches(is_whitespace)),
          None => break,
        }
      }

      let (key, value) = split_key_value(&logical);
      properties.entries.insert(unescape(key)?, unescape(value)?);
    }

    Ok(properties)
  }

  /// Loads a properties file. A missing file is `Ok(None)`.
  pub fn load(path: &Path) -> Result<Option<Self>> {
    match fs::read_to_string(path) {
      Ok(content) => Self::parse(&content)
        .map(Some)
        .map_err(|e| ConfigError(format!("Malformed properties file {}: {}", path.display(), e)).into()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => {
        warn!("Error loading {}: {}", path.display(), e);
        Ok(None)
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(|v| v.as_str())
  }

  /// Like [`Properties::get`], but treats an empty value as absent.
  pub fn get_non_empty(&self, key: &str) -> Option<&str> {
    self.get(key).filter(|v| !v.is_empty())
  }

  pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
    self.entries.insert(key.into(), value.into());
  }

  pub fn iter(&self) -> btree_map::Iter<String, String> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

fn is_whitespace(c: char) -> bool {
  c == ' ' || c == '\t' || c == '\x0c'
}

fn has_continuation(line: &str) -> bool {
  line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
  let mut escaped = false;
  let mut key_end = line.len();
  for (idx, c) in line.char_indices() {
    if escaped {
      escaped = false;
    } else if c == '\\' {
      escaped = true;
    } else if c == '=' || c == ':' || is_whitespace(c) {
      key_end = idx;
      break;
    }
  }

  let key = &line[..key_end];
  let mut rest = line[key_end..].trim_start_matches(is_whitespace);
  if rest.starts_with('=') || rest.starts_with(':') {
    rest = rest[1..].trim_start_matches(is_whitespace);
  }
  (key, rest)
}

fn unescape(s: &str) -> Result<String> {
  let mut out = String::with_capacity(s.len());
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }

    match chars.next() {
      Some('t') => out.push('\t'),
      Some('n') => out.push('\n'),
      Some('r') => out.push('\r'),
      Some('f') => out.push('\x0c'),
      Some('u') => {
        let hex: String = chars.by_ref().take(4).collect();
        let decoded = if hex.len() == 4 {
          u32::from_str_radix(&hex, 16).ok().and_then(std::char::from_u32)
        } else {
          None
        };
        match decoded {
          Some(d) => out.push(d),
          None => return Err(ConfigError(format!("Malformed \\uxxxx encoding in [{}]", s)).into()),
        }
      }
      Some(other) => out.push(other),
      None => (),
    }
  }
  Ok(out)
}
