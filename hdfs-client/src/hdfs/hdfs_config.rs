use crate::{
  config::{keys::*, timeouts::DEFAULT_TIMEOUT_MS, Configuration, TimeoutSettings},
  error::{HdfsClientErrorKind::InvalidArgumentError, Result},
  fs::{
    file_system::{DFS_SCHEME, SWEBHDFS_SCHEME, WEBHDFS_SCHEME},
    path::FsPath,
  },
};
use std::time::Duration;

const WILDCARD_HOST: &'static str = "0.0.0.0";
const WEBHDFS_PREFIX: &'static str = "/webhdfs/v1";

/// Client settings derived from the configuration. Rebuilt for every call so that timeout changes
/// made on the live configuration apply to the next request.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct HdfsClientConfig {
  #[get_copy = "pub"]
  socket_timeout: Duration,
  #[get_copy = "pub"]
  connect_timeout: Duration,
  #[get_copy = "pub"]
  max_retries_on_timeout: u32,
  #[get_copy = "pub"]
  buffer_size: usize,
}

impl HdfsClientConfig {
  pub fn new(config: &Configuration) -> Result<Self> {
    let timeouts = TimeoutSettings::from_config(config)?;
    let connect_timeout = config.get_or(IPC_CLIENT_CONNECT_TIMEOUT_KEY, DEFAULT_TIMEOUT_MS)?;
    let buffer_size = config.readahead();

    Ok(Self {
      socket_timeout: timeouts.timeout(),
      connect_timeout: Duration::from_millis(connect_timeout),
      max_retries_on_timeout: timeouts.max_retries_on_timeout(),
      buffer_size,
    })
  }
}

/// Base url of the WebHDFS endpoint serving `uri`, e.g. `http://nn:9870/webhdfs/v1`.
pub fn webhdfs_endpoint(uri: &FsPath, config: &Configuration) -> Result<String> {
  let host = uri
    .host()
    .filter(|h| !h.is_empty())
    .ok_or_else(|| InvalidArgumentError(format!("No host in filesystem address {}", uri.as_str())))?;

  let (http_scheme, address) = match uri.scheme() {
    WEBHDFS_SCHEME => {
      ("http", format!("{}:{}", host, uri.port().unwrap_or(DFS_NAMENODE_HTTP_PORT_DEFAULT)))
    }
    SWEBHDFS_SCHEME => {
      ("https", format!("{}:{}", host, uri.port().unwrap_or(DFS_NAMENODE_HTTPS_PORT_DEFAULT)))
    }
    DFS_SCHEME => {
      let https_only = config
        .get_str(DFS_HTTP_POLICY_KEY)?
        .map(|p| p.trim().eq_ignore_ascii_case(DFS_HTTP_POLICY_HTTPS_ONLY))
        .unwrap_or(false);
      let (http_scheme, key, port) = if https_only {
        ("https", DFS_NAMENODE_HTTPS_ADDRESS_KEY, DFS_NAMENODE_HTTPS_PORT_DEFAULT)
      } else {
        ("http", DFS_NAMENODE_HTTP_ADDRESS_KEY, DFS_NAMENODE_HTTP_PORT_DEFAULT)
      };

      let address = match config.get_str(key)?.filter(|a| !a.trim().is_empty()) {
        Some(configured) => {
          let configured = configured.trim();
          match configured.strip_prefix(WILDCARD_HOST) {
            Some(port_part) => format!("{}{}", host, port_part),
            None => configured.to_string(),
          }
        }
        None => format!("{}:{}", host, port),
      };
      (http_scheme, address)
    }
    other => {
      return Err(InvalidArgumentError(format!("{} is not a WebHDFS capable scheme", other)).into())
    }
  };

  Ok(format!("{}://{}{}", http_scheme, address, WEBHDFS_PREFIX))
}
