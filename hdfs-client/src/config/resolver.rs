use crate::{
  config::{
    keys::*,
    properties::Properties,
    timeouts::{TimeoutSettings, TIMEOUT_SOURCE},
    xml::load_resource,
    Configuration,
  },
  error::Result,
};
use std::{
  env,
  path::{Path, PathBuf},
};

pub const TARGET_ADDRESS_SOURCE: &'static str = "command line target address";

/// Merged configuration plus the overrides file it was built from, if one was loaded.
#[derive(Debug, Clone, Getters)]
pub struct ResolvedConfig {
  #[get = "pub"]
  config: Configuration,
  #[get = "pub"]
  overrides: Option<Properties>,
}

impl ResolvedConfig {
  pub fn into_parts(self) -> (Configuration, Option<Properties>) {
    (self.config, self.overrides)
  }
}

/// Builds the client configuration. Layers are applied in a fixed order, each one overriding
/// the previous: defaults, `core-site.xml`, `hdfs-site.xml`, `client.conf`, timeouts, and last
/// the target address given on the command line.
#[derive(Debug, Clone, Default, new)]
pub struct ConfigResolver {
  timeouts: TimeoutSettings,
}

impl ConfigResolver {
  pub fn resolve(&self, target_address: &str, conf_dir: Option<&Path>) -> Result<ResolvedConfig> {
    let mut config = Configuration::with_defaults();
    let mut overrides = None;

    match conf_dir {
      Some(dir) => {
        info!("Loading configuration from: {}", dir.display());
        load_resource(&mut config, &dir.join(CORE_SITE_FILE))?;
        load_resource(&mut config, &dir.join(HDFS_SITE_FILE))?;
        overrides = load_overrides(&mut config, &dir.join(CLIENT_CONF_FILE))?;
      }
      None => info!("No configuration directory given, using default configuration."),
    }

    self.timeouts.apply_to(&mut config, TIMEOUT_SOURCE);
    info!("Setting default socket timeout to {} ms", self.timeouts.timeout_ms());

    debug!("Configuration properties:");
    for (key, value) in config.iter() {
      debug!("  {} = {}", key, value);
    }

    config.set_with_source(FS_DEFAULT_NAME_KEY, target_address, TARGET_ADDRESS_SOURCE);
    info!("Setting {} to: {}", FS_DEFAULT_NAME_KEY, target_address);

    Ok(ResolvedConfig { config, overrides })
  }
}

fn load_overrides(config: &mut Configuration, path: &Path) -> Result<Option<Properties>> {
  let properties = match Properties::load(path)? {
    Some(p) => p,
    None => {
      info!("{} not found at: {}", CLIENT_CONF_FILE, path.display());
      return Ok(None);
    }
  };

  info!("Loading {} from: {}", CLIENT_CONF_FILE, path.display());
  let source = path.display().to_string();
  let mut count = 0;
  for (key, value) in properties.iter().filter(|(_, v)| !v.is_empty()) {
    config.set_with_source(key, value, &source);
    info!("  Override: {} = {}", key, value);
    count += 1;
  }
  info!("Loaded {} properties from {}", count, CLIENT_CONF_FILE);

  Ok(Some(properties))
}

/// Configuration directory named by `HADOOP_CONF_DIR`; unset or empty means none.
pub fn conf_dir_from_env() -> Option<PathBuf> {
  env::var_os(HADOOP_CONF_DIR_ENV).filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
  use crate::config::{
    keys::*,
    resolver::{ConfigResolver, TARGET_ADDRESS_SOURCE},
    timeouts::{TimeoutSettings, TIMEOUT_DURATION_KEYS},
    Configuration,
  };
  use std::fs;

  const TARGET: &'static str = "hdfs://cli-namenode:8020";

  fn defaults_plus_address() -> Configuration {
    let mut expected = Configuration::with_defaults();
    TimeoutSettings::default().apply_to(&mut expected, "expected");
    expected.set(FS_DEFAULT_NAME_KEY, TARGET);
    expected
  }

  fn assert_same_entries(expected: &Configuration, actual: &Configuration) {
    let expected: Vec<(&str, &str)> = expected.iter().collect();
    let actual: Vec<(&str, &str)> = actual.iter().collect();
    assert_eq!(expected, actual);
  }

  #[test]
  fn test_without_conf_dir() {
    let resolved = ConfigResolver::default().resolve(TARGET, None).unwrap();

    assert!(resolved.overrides().is_none());
    assert_same_entries(&defaults_plus_address(), resolved.config());
  }

  #[test]
  fn test_empty_conf_dir() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = ConfigResolver::default().resolve(TARGET, Some(dir.path())).unwrap();

    assert!(resolved.overrides().is_none());
    assert_same_entries(&defaults_plus_address(), resolved.config());
  }

  #[test]
  fn test_only_one_resource_present() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join(HDFS_SITE_FILE),
      "<configuration><property><name>dfs.replication</name><value>2</value></property></configuration>",
    )
    .unwrap();

    let resolved = ConfigResolver::default().resolve(TARGET, Some(dir.path())).unwrap();
    let mut expected = defaults_plus_address();
    expected.set("dfs.replication", "2");
    assert_same_entries(&expected, resolved.config());
  }

  #[test]
  fn test_layer_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join(CORE_SITE_FILE),
      r#"<configuration>
  <property><name>fs.defaultFS</name><value>hdfs://file-namenode:8020</value></property>
  <property><name>layer.a</name><value>core</value></property>
  <property><name>layer.b</name><value>core</value></property>
  <property><name>dfs.client.socket-timeout</name><value>90000</value></property>
</configuration>"#,
    )
    .unwrap();
    fs::write(
      dir.path().join(HDFS_SITE_FILE),
      r#"<configuration>
  <property><name>layer.b</name><value>hdfs</value></property>
  <property><name>layer.c</name><value>hdfs</value></property>
</configuration>"#,
    )
    .unwrap();
    fs::write(
      dir.path().join(CLIENT_CONF_FILE),
      "layer.c=client\nlayer.d=client\nlayer.a=\nfs.defaultFS=hdfs://conf-namenode:8020\n",
    )
    .unwrap();

    let resolved = ConfigResolver::default().resolve(TARGET, Some(dir.path())).unwrap();
    let config = resolved.config();

    assert_eq!(Some("core"), config.get_raw("layer.a"));
    assert_eq!(Some("hdfs"), config.get_raw("layer.b"));
    assert_eq!(Some("client"), config.get_raw("layer.c"));
    assert_eq!(Some("client"), config.get_raw("layer.d"));
    assert_eq!(Some("10000"), config.get_raw(DFS_CLIENT_SOCKET_TIMEOUT_KEY));
    assert_eq!(Some(TARGET), config.get_raw(FS_DEFAULT_NAME_KEY));
    assert_eq!(Some(TARGET_ADDRESS_SOURCE), config.get_source(FS_DEFAULT_NAME_KEY));

    let overrides = resolved.overrides().as_ref().unwrap();
    assert_eq!(Some(""), overrides.get("layer.a"));
  }

  #[test]
  fn test_explicit_target_always_wins() {
    let addresses = ["hdfs://a:8020", "webhdfs://b:9870", "file:///"];
    let file_values = ["hdfs://x:1", "viewfs://cluster", ""];

    for address in addresses.iter() {
      for file_value in file_values.iter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CLIENT_CONF_FILE), format!("fs.defaultFS={}\n", file_value))
          .unwrap();

        let resolved = ConfigResolver::default().resolve(address, Some(dir.path())).unwrap();
        assert_eq!(Some(*address), resolved.config().get_raw(FS_DEFAULT_NAME_KEY));
      }
    }
  }

  #[test]
  fn test_custom_timeouts() {
    let resolved =
      ConfigResolver::new(TimeoutSettings::new(1234, 3)).resolve(TARGET, None).unwrap();
    for key in TIMEOUT_DURATION_KEYS.iter() {
      assert_eq!(Some("1234"), resolved.config().get_raw(key));
    }
    assert_eq!(
      Some("3"),
      resolved.config().get_raw(IPC_CLIENT_CONNECT_MAX_RETRIES_ON_TIMEOUTS_KEY)
    );
  }

  #[test]
  fn test_malformed_resource_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CORE_SITE_FILE), "<configuration><property>").unwrap();
    assert!(ConfigResolver::default().resolve(TARGET, Some(dir.path())).is_err());
  }
}
