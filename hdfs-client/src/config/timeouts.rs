use crate::{
  config::{keys::*, Configuration},
  error::Result,
};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10000;
pub const DEFAULT_MAX_RETRIES_ON_TIMEOUT: u32 = 1;

pub const TIMEOUT_SOURCE: &'static str = "client timeout defaults";

/// Every key holding a millisecond timeout that the client manages.
pub const TIMEOUT_DURATION_KEYS: [&'static str; 7] = [
  DFS_CLIENT_SOCKET_TIMEOUT_KEY,
  DFS_CLIENT_SOCKET_READ_TIMEOUT_KEY,
  IPC_CLIENT_CONNECT_TIMEOUT_KEY,
  IPC_CLIENT_CONNECTION_MAXIDLETIME_KEY,
  DFS_DATANODE_SOCKET_WRITE_TIMEOUT_KEY,
  DFS_DATANODE_SOCKET_READ_TIMEOUT_KEY,
  DFS_CLIENT_BLOCK_READ_TIMEOUT_KEY,
];

/// One shared timeout for all managed keys plus the connect retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, new)]
pub struct TimeoutSettings {
  #[get_copy = "pub"]
  timeout_ms: u64,
  #[get_copy = "pub"]
  max_retries_on_timeout: u32,
}

impl Default for TimeoutSettings {
  fn default() -> Self {
    Self::new(DEFAULT_TIMEOUT_MS, DEFAULT_MAX_RETRIES_ON_TIMEOUT)
  }
}

impl TimeoutSettings {
  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }

  /// Writes every managed key, including the retry count.
  pub fn apply_to(&self, config: &mut Configuration, source: &str) {
    self.apply_durations_to(config, source);
    config.set_with_source(
      IPC_CLIENT_CONNECT_MAX_RETRIES_ON_TIMEOUTS_KEY,
      self.max_retries_on_timeout,
      source,
    );
  }

  /// Writes only the duration keys; the retry count is left as configured.
  pub fn apply_durations_to(&self, config: &mut Configuration, source: &str) {
    for key in TIMEOUT_DURATION_KEYS.iter() {
      config.set_with_source(key, self.timeout_ms, source);
    }
  }

  /// Reads the settings back, taking the socket timeout as the shared value.
  pub fn from_config(config: &Configuration) -> Result<Self> {
    Ok(Self::new(
      config.get_or(DFS_CLIENT_SOCKET_TIMEOUT_KEY, DEFAULT_TIMEOUT_MS)?,
      config.get_or(IPC_CLIENT_CONNECT_MAX_RETRIES_ON_TIMEOUTS_KEY, DEFAULT_MAX_RETRIES_ON_TIMEOUT)?,
    ))
  }
}
