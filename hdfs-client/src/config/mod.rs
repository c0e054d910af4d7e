use crate::{
  config::keys::*,
  error::{HdfsClientError, HdfsClientErrorKind::ConfigError, Result},
  security::user::current_os_user,
};
use regex::Regex;
use std::{
  collections::BTreeMap,
  env,
  fmt::Display,
  str::FromStr,
};

pub mod keys;
pub mod properties;
pub mod resolver;
pub mod timeouts;
pub mod xml;

pub use resolver::{ConfigResolver, ResolvedConfig};
pub use timeouts::TimeoutSettings;

type ConfigKey = String;

pub const DEFAULT_SOURCE: &'static str = "default";
pub const PROGRAMMATIC_SOURCE: &'static str = "programmatically";

const MAX_SUBST: usize = 20;

lazy_static! {
  static ref VAR_PATTERN: Regex =
    Regex::new(r"\$\{[^\}\$ ]+\}").expect("Variable pattern should be a valid regex");
}

#[derive(Debug, Clone)]
struct ConfigData {
  value: String,
  is_final: bool,
  source: String,
}

/// Key/value client configuration, layered from several sources.
///
/// Later writes win, except that a property loaded as `final` from one resource can not be
/// replaced by a later resource (see [`Configuration::add_resource_property`]). Values may
/// reference other keys as `${key}`, environment variables as `${env.NAME}` and the OS user as
/// `${user.name}`; references are expanded by the typed getters.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
  data: BTreeMap<ConfigKey, ConfigData>,
}

impl Configuration {
  pub fn new() -> Self {
    Self { data: BTreeMap::new() }
  }

  pub fn with_defaults() -> Self {
    let mut config = Self::new();
    config.set_with_source(FS_DEFAULT_NAME_KEY, FS_DEFAULT_NAME_DEFAULT, DEFAULT_SOURCE);
    config.set_with_source(
      HADOOP_SECURITY_AUTHENTICATION_KEY,
      HADOOP_SECURITY_AUTHENTICATION_DEFAULT,
      DEFAULT_SOURCE,
    );
    config.set_with_source(HADOOP_TMP_DIR_KEY, HADOOP_TMP_DIR_DEFAULT, DEFAULT_SOURCE);
    config.set_with_source(
      DFS_CLIENT_READ_READAHEAD_KEY,
      DFS_CLIENT_READ_READAHEAD_DEFAULT,
      DEFAULT_SOURCE,
    );
    config
  }

  pub fn get<T>(&self, key: &str) -> Result<Option<T>>
  where
    T: FromStr,
    T::Err: Display,
  {
    self
      .get_str(key)?
      .map(|v| {
        T::from_str(v.trim()).map_err(|e| {
          HdfsClientError::from(ConfigError(format!("Invalid value [{}] for key [{}]: {}", v, key, e)))
        })
      })
      .transpose()
  }

  pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
  where
    T: FromStr,
    T::Err: Display,
  {
    Ok(self.get(key)?.unwrap_or(default))
  }

  /// Value of `key` with variable references expanded.
  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    self.get_raw(key).map(|v| self.substitute_vars(v)).transpose()
  }

  /// Value of `key` exactly as it was set.
  pub fn get_raw(&self, key: &str) -> Option<&str> {
    self.data.get(key).map(|d| d.value.as_str())
  }

  /// Where the current value of `key` came from: a resource path, an overrides file, or one of
  /// the built in layers such as [`DEFAULT_SOURCE`].
  pub fn get_source(&self, key: &str) -> Option<&str> {
    self.data.get(key).map(|d| d.source.as_str())
  }

  pub fn is_final(&self, key: &str) -> bool {
    self.data.get(key).map(|d| d.is_final).unwrap_or(false)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.data.contains_key(key)
  }

  pub fn set<V: ToString>(&mut self, key: &str, value: V) {
    self.set_with_source(key, value, PROGRAMMATIC_SOURCE)
  }

  pub fn set_with_source<V: ToString>(&mut self, key: &str, value: V, source: &str) {
    let value = value.to_string();
    trace!("Setting [{}={}] from {}", key, value, source);
    let is_final = self.is_final(key);
    self.data.insert(key.to_string(), ConfigData { value, is_final, source: source.to_string() });
  }

  /// Applies one property read from a configuration resource. Returns false when the key was
  /// already marked final by a different resource and the new value was ignored.
  pub fn add_resource_property(
    &mut self,
    key: &str,
    value: &str,
    is_final: bool,
    source: &str,
  ) -> bool {
    if let Some(existing) = self.data.get(key) {
      if existing.is_final && existing.source != source {
        warn!("{}: an attempt to override final parameter: {}; Ignoring.", source, key);
        return false;
      }
    }

    trace!("Setting [{}={}] from {}{}", key, value, source, if is_final { " (final)" } else { "" });
    self.data.insert(
      key.to_string(),
      ConfigData { value: value.to_string(), is_final, source: source.to_string() },
    );
    true
  }

  /// Stream buffer size from `dfs.client.read.readahead`. Unusable values fall back to the
  /// default.
  pub fn readahead(&self) -> usize {
    match self.get::<usize>(DFS_CLIENT_READ_READAHEAD_KEY) {
      Ok(Some(size)) if size > 0 => size,
      Ok(_) => DFS_CLIENT_READ_READAHEAD_DEFAULT,
      Err(e) => {
        warn!("Ignoring readahead setting: {}", e);
        DFS_CLIENT_READ_READAHEAD_DEFAULT
      }
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.data.iter().map(|(k, v)| (k.as_str(), v.value.as_str()))
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  fn substitute_vars(&self, expr: &str) -> Result<String> {
    let mut eval = expr.to_string();
    for _ in 0..MAX_SUBST {
      let (start, end) = match VAR_PATTERN.find(&eval) {
        Some(m) => (m.start(), m.end()),
        None => return Ok(eval),
      };

      let var = &eval[start + 2..end - 1];
      let val = match self.lookup_var(var) {
        Some(v) => v,
        None => return Ok(eval),
      };

      // Self references would never terminate
      if val.contains(&eval[start..end]) {
        return Ok(eval);
      }

      eval = format!("{}{}{}", &eval[..start], val, &eval[end..]);
    }

    Err(ConfigError(format!("Variable substitution depth too large: {} {}", MAX_SUBST, expr)).into())
  }

  fn lookup_var(&self, var: &str) -> Option<String> {
    if let Some(name) = var.strip_prefix("env.") {
      return env::var(name).ok();
    }

    match var {
      "user.name" => {
        if let Some(user) = current_os_user() {
          return Some(user);
        }
      }
      "user.home" => {
        if let Ok(home) = env::var("HOME") {
          return Some(home);
        }
      }
      _ => (),
    }

    self.get_raw(var).map(|v| v.to_string())
  }
}

#[cfg(test)]
mod tests {
  use crate::config::{keys::*, Configuration, DEFAULT_SOURCE};
  use crate::error::HdfsClientErrorKind;

  #[test]
  fn test_defaults() {
    let config = Configuration::with_defaults();
    assert_eq!(Some("file:///"), config.get_raw(FS_DEFAULT_NAME_KEY));
    assert_eq!(Some(DEFAULT_SOURCE), config.get_source(FS_DEFAULT_NAME_KEY));
    assert_eq!(
      Some("simple".to_string()),
      config.get::<String>(HADOOP_SECURITY_AUTHENTICATION_KEY).unwrap()
    );
    assert_eq!(65536usize, config.get_or(DFS_CLIENT_READ_READAHEAD_KEY, 0usize).unwrap());
  }

  #[test]
  fn test_typed_get() {
    let mut config = Configuration::new();
    config.set("a.int", " 42 ");
    config.set("a.bool", "true");
    config.set("a.bad", "forty");

    assert_eq!(Some(42u64), config.get("a.int").unwrap());
    assert_eq!(Some(true), config.get("a.bool").unwrap());
    assert_eq!(7u32, config.get_or("a.missing", 7u32).unwrap());

    let err = config.get::<u32>("a.bad").unwrap_err();
    match err.kind() {
      HdfsClientErrorKind::ConfigError(msg) => assert!(msg.contains("a.bad")),
      k => panic!("Unexpected error kind: {:?}", k),
    }
  }

  #[test]
  fn test_later_set_wins() {
    let mut config = Configuration::new();
    config.set_with_source("k", "v1", "core-site.xml");
    config.set_with_source("k", "v2", "client.conf");
    assert_eq!(Some("v2"), config.get_raw("k"));
    assert_eq!(Some("client.conf"), config.get_source("k"));
  }

  #[test]
  fn test_final_property_survives_later_resources() {
    let mut config = Configuration::new();
    assert!(config.add_resource_property("dfs.replication", "3", true, "core-site.xml"));
    assert!(!config.add_resource_property("dfs.replication", "1", false, "hdfs-site.xml"));
    assert_eq!(Some("3"), config.get_raw("dfs.replication"));

    // Programmatic writes are not resources and always apply
    config.set("dfs.replication", "2");
    assert_eq!(Some("2"), config.get_raw("dfs.replication"));
    assert!(config.is_final("dfs.replication"));
  }

  #[test]
  fn test_variable_expansion() {
    let mut config = Configuration::new();
    config.set("base.dir", "/data");
    config.set("log.dir", "${base.dir}/logs");
    config.set("audit.dir", "${log.dir}/audit");
    config.set("unknown", "${no.such.key.anywhere}/x");
    config.set("self", "${self}");
    config.set("env", "${env.HDFS_CLIENT_SURELY_UNSET_VARIABLE}");

    assert_eq!(Some("/data/logs/audit".to_string()), config.get_str("audit.dir").unwrap());
    assert_eq!(Some("${no.such.key.anywhere}/x".to_string()), config.get_str("unknown").unwrap());
    assert_eq!(Some("${self}".to_string()), config.get_str("self").unwrap());
    assert_eq!(
      Some("${env.HDFS_CLIENT_SURELY_UNSET_VARIABLE}".to_string()),
      config.get_str("env").unwrap()
    );
    assert_eq!(Some("${log.dir}/audit"), config.get_raw("audit.dir"));
  }

  #[test]
  fn test_variable_expansion_depth_limit() {
    let mut config = Configuration::new();
    for i in 0..25 {
      config.set(&format!("chain.{}", i), format!("${{chain.{}}}", i + 1));
    }
    config.set("chain.25", "end");

    assert_eq!(Some("end".to_string()), config.get_str("chain.10").unwrap());
    let err = config.get_str("chain.0").unwrap_err();
    match err.kind() {
      HdfsClientErrorKind::ConfigError(msg) => assert!(msg.contains("depth")),
      k => panic!("Unexpected error kind: {:?}", k),
    }
  }
}
