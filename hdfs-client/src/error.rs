use failure::{Backtrace, Context, Fail};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug)]
pub struct HdfsClientError {
  inner: Context<HdfsClientErrorKind>,
}

/// Exception reported by a remote gateway, e.g. a WebHDFS `RemoteException` body.
#[derive(Clone, Eq, PartialEq, Debug, new, Getters)]
pub struct RemoteErrorInfo {
  #[get = "pub"]
  exception_class_name: String,
  #[get = "pub"]
  message: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum HdfsClientErrorKind {
  #[fail(display = "Configuration error: {}", _0)]
  ConfigError(String),
  #[fail(display = "Kerberos authentication failed: {}", _0)]
  AuthenticationError(String),
  #[fail(display = "Failed to connect: {}", _0)]
  ConnectionError(String),
  #[fail(display = "File not found: {}", _0)]
  NotFound(String),
  #[fail(display = "Invalid operation: {}", _0)]
  InvalidOperation(String),
  #[fail(display = "File already exists and overwrite is not allowed: {}", _0)]
  AlreadyExists(String),
  #[fail(display = "Io error happened: {}", _0)]
  IoError(String),
  #[fail(display = "Error accessing {} (after {} ms)", path, elapsed_ms)]
  StreamError { path: String, elapsed_ms: u128 },
  #[fail(display = "Invalid argument: {}", _0)]
  InvalidArgumentError(String),
  #[fail(display = "Illegal path string: {}", _0)]
  PathError(String),
  #[fail(display = "Remote error happened: {:?}", _0)]
  RemoteError(RemoteErrorInfo),
  #[fail(display = "Timeout after: {:?}", _0)]
  TimeOutError(Duration),
}

impl HdfsClientErrorKind {
  pub fn stream_error(path: &str, elapsed: Duration) -> Self {
    HdfsClientErrorKind::StreamError { path: path.to_string(), elapsed_ms: elapsed.as_millis() }
  }
}

impl HdfsClientError {
  pub fn kind(&self) -> &HdfsClientErrorKind {
    self.inner.get_context()
  }

  /// Whether this error, or anything in its cause chain, came from a Kerberos login.
  pub fn is_authentication_error(&self) -> bool {
    if let HdfsClientErrorKind::AuthenticationError(_) = self.kind() {
      return true;
    }

    let mut cause = self.cause();
    while let Some(c) = cause {
      if let Some(e) = c.downcast_ref::<HdfsClientError>() {
        if e.is_authentication_error() {
          return true;
        }
      }
      cause = c.cause();
    }
    false
  }
}

impl Display for HdfsClientError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(&self.inner, f)
  }
}

impl Fail for HdfsClientError {
  fn cause(&self) -> Option<&dyn Fail> {
    self.inner.cause()
  }

  fn backtrace(&self) -> Option<&Backtrace> {
    self.inner.backtrace()
  }
}

impl From<HdfsClientErrorKind> for HdfsClientError {
  fn from(kind: HdfsClientErrorKind) -> Self {
    Self { inner: Context::new(kind) }
  }
}

impl From<Context<HdfsClientErrorKind>> for HdfsClientError {
  fn from(inner: Context<HdfsClientErrorKind>) -> Self {
    Self { inner }
  }
}

pub type Result<T> = std::result::Result<T, HdfsClientError>;

#[cfg(test)]
mod tests {
  use crate::error::{HdfsClientError, HdfsClientErrorKind};
  use failure::ResultExt;
  use std::time::Duration;

  #[test]
  fn test_authentication_error_found_in_cause_chain() {
    let login: std::result::Result<(), HdfsClientError> =
      Err(HdfsClientErrorKind::AuthenticationError("bad principal".to_string()).into());
    let wrapped: HdfsClientError = login
      .context(HdfsClientErrorKind::ConnectionError("hdfs://nn:8020".to_string()))
      .unwrap_err()
      .into();

    assert!(wrapped.is_authentication_error());
    assert!(!HdfsClientError::from(HdfsClientErrorKind::NotFound("/a".to_string()))
      .is_authentication_error());
  }

  #[test]
  fn test_stream_error_display() {
    let e = HdfsClientError::from(HdfsClientErrorKind::stream_error(
      "/user/a.txt",
      Duration::from_millis(1500),
    ));
    assert_eq!("Error accessing /user/a.txt (after 1500 ms)", e.to_string());
  }
}
