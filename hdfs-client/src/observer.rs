use crate::error::HdfsClientError;
use std::{
  fmt::{Display, Formatter},
  sync::Arc,
  time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  List,
  Read,
  ReadBytes,
  Write,
  Mkdir,
  Delete,
  Exists,
}

impl Operation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operation::List => "list",
      Operation::Read => "read",
      Operation::ReadBytes => "read_bytes",
      Operation::Write => "write",
      Operation::Mkdir => "mkdir",
      Operation::Delete => "delete",
      Operation::Exists => "exists",
    }
  }
}

impl Display for Operation {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Progress events of client operations. Every method defaults to doing nothing.
pub trait ClientObserver {
  fn operation_started(&self, _operation: Operation, _path: &str) {}

  fn source_opened(&self, _path: &str, _elapsed: Duration) {}

  fn read_started(&self, _path: &str) {}

  fn read_completed(&self, _path: &str, _bytes: usize, _elapsed: Duration) {}

  fn operation_completed(&self, _operation: Operation, _path: &str, _elapsed: Duration) {}

  fn error_occurred(&self, _operation: Operation, _path: &str, _error: &HdfsClientError) {}
}

pub type ClientObserverRef = Arc<dyn ClientObserver + Send + Sync>;

/// Writes progress as log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ClientObserver for LogObserver {
  fn operation_started(&self, operation: Operation, path: &str) {
    info!("Starting {} on {}", operation, path);
  }

  fn source_opened(&self, path: &str, elapsed: Duration) {
    info!("Opened {} in {} ms", path, elapsed.as_millis());
  }

  fn read_started(&self, path: &str) {
    debug!("Reading {}", path);
  }

  fn read_completed(&self, path: &str, bytes: usize, elapsed: Duration) {
    info!("Read {} bytes from {} in {} ms", bytes, path, elapsed.as_millis());
  }

  fn operation_completed(&self, operation: Operation, path: &str, elapsed: Duration) {
    debug!("Finished {} on {} in {} ms", operation, path, elapsed.as_millis());
  }

  fn error_occurred(&self, operation: Operation, path: &str, error: &HdfsClientError) {
    error!("Error during {} on {}: {}", operation, path, error);
  }
}
