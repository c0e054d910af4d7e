use crate::{
  config::{resolver::ConfigResolver, Configuration, TimeoutSettings},
  connection::ConnectionFactory,
  error::{
    HdfsClientErrorKind::{self, AlreadyExists, InvalidOperation},
    Result,
  },
  fs::{file_status::FileStatus, input_stream::FsInputStream, FileSystem, FileSystemRef},
  observer::{ClientObserverRef, LogObserver, Operation},
  security::{
    kerberos::{AuthenticationOutcome, KerberosAuthenticator},
    user::SubjectRef,
    SecurityContext, SecurityContextRef,
  },
};
use failure::ResultExt;
use std::{
  io::{Read, Write},
  path::PathBuf,
  sync::Arc,
  time::Instant,
};

/// Upper bound of a single [`HdfsClient::read`].
pub const READ_BUFFER_SIZE: usize = 4096;

const SET_TIMEOUT_SOURCE: &'static str = "HdfsClient.set_timeout";

/// Client bound to one filesystem. The connection is released by [`HdfsClient::close`] or on drop.
pub struct HdfsClient {
  target: String,
  fs: Option<FileSystemRef>,
  security: SecurityContextRef,
  observer: ClientObserverRef,
}

pub struct HdfsClientBuilder {
  target: String,
  conf_dir: Option<PathBuf>,
  timeouts: TimeoutSettings,
  security: Option<SecurityContextRef>,
  observer: Option<ClientObserverRef>,
}

impl HdfsClientBuilder {
  pub fn new(target: &str) -> Self {
    Self {
      target: target.to_string(),
      conf_dir: None,
      timeouts: TimeoutSettings::default(),
      security: None,
      observer: None,
    }
  }

  pub fn conf_dir(mut self, conf_dir: Option<PathBuf>) -> Self {
    self.conf_dir = conf_dir;
    self
  }

  pub fn timeouts(mut self, timeouts: TimeoutSettings) -> Self {
    self.timeouts = timeouts;
    self
  }

  pub fn security(mut self, security: SecurityContextRef) -> Self {
    self.security = Some(security);
    self
  }

  pub fn observer(mut self, observer: ClientObserverRef) -> Self {
    self.observer = Some(observer);
    self
  }

  pub fn build(self) -> Result<HdfsClient> {
    let security = self.security.unwrap_or_else(|| Arc::new(SecurityContext::new()));
    let observer = self.observer.unwrap_or_else(|| Arc::new(LogObserver));

    if self.conf_dir.is_none() {
      warn!("No configuration directory set, using default configuration.");
    }
    let resolved =
      ConfigResolver::new(self.timeouts).resolve(&self.target, self.conf_dir.as_deref())?;
    let (mut config, overrides) = resolved.into_parts();

    if let Some(overrides) = overrides {
      match KerberosAuthenticator::new(&security).authenticate(&mut config, &overrides)? {
        AuthenticationOutcome::NotConfigured => {
          info!("Kerberos is not configured, using simple authentication.")
        }
        AuthenticationOutcome::Established => (),
        AuthenticationOutcome::Failed(reason) => {
          warn!("Kerberos authentication not set up ({}), using simple authentication.", reason)
        }
      }
    }

    let fs = ConnectionFactory::new(security.clone()).connect(config, &self.target)?;
    Ok(HdfsClient { target: self.target, fs: Some(fs), security, observer })
  }
}

impl HdfsClient {
  pub fn target(&self) -> &str {
    &self.target
  }

  /// Configuration of the live connection.
  pub fn conf(&self) -> Result<&Configuration> {
    Ok(self.fs()?.conf())
  }

  fn fs(&self) -> Result<&dyn FileSystem> {
    match &self.fs {
      Some(fs) => Ok(&**fs),
      None => Err(InvalidOperation(format!("Client for {} is closed", self.target)).into()),
    }
  }

  fn observe<T, F>(&self, operation: Operation, path: &str, f: F) -> Result<T>
  where
    F: FnOnce(&dyn FileSystem) -> Result<T>,
  {
    let fs = self.fs()?;
    self.observer.operation_started(operation, path);
    let start = Instant::now();
    match f(fs) {
      Ok(v) => {
        self.observer.operation_completed(operation, path, start.elapsed());
        Ok(v)
      }
      Err(e) => {
        self.observer.error_occurred(operation, path, &e);
        Err(e)
      }
    }
  }

  /// Entries under `path`; an empty list when `path` does not exist.
  pub fn list(&self, path: &str) -> Result<Vec<FileStatus>> {
    self.observe(Operation::List, path, |fs| {
      if !fs.exists(path)? {
        warn!("Path does not exist: {}", path);
        return Ok(Vec::new());
      }
      fs.list_status(path)
    })
  }

  /// Issues a single read of at most [`READ_BUFFER_SIZE`] bytes, so the result may be a prefix
  /// of the file. Use [`HdfsClient::read_bytes`] to read a given amount.
  pub fn read(&self, path: &str) -> Result<String> {
    self.observe(Operation::Read, path, |fs| {
      let start = Instant::now();
      let mut stream = self.open_file(fs, path)?;
      self.observer.source_opened(path, start.elapsed());

      self.observer.read_started(path);
      let mut buffer = vec![0u8; READ_BUFFER_SIZE];
      let n = stream
        .read(&mut buffer)
        .context(HdfsClientErrorKind::stream_error(path, start.elapsed()))?;
      self.observer.read_completed(path, n, start.elapsed());

      Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    })
  }

  /// Reads until `max_bytes` bytes were read or the file ended.
  pub fn read_bytes(&self, path: &str, max_bytes: usize) -> Result<Vec<u8>> {
    self.observe(Operation::ReadBytes, path, |fs| {
      let start = Instant::now();
      let mut stream = self.open_file(fs, path)?;
      self.observer.source_opened(path, start.elapsed());

      self.observer.read_started(path);
      let mut data = Vec::with_capacity(max_bytes.min(READ_BUFFER_SIZE));
      stream
        .by_ref()
        .take(max_bytes as u64)
        .read_to_end(&mut data)
        .context(HdfsClientErrorKind::stream_error(path, start.elapsed()))?;
      self.observer.read_completed(path, data.len(), start.elapsed());

      Ok(data)
    })
  }

  fn open_file(&self, fs: &dyn FileSystem, path: &str) -> Result<Box<dyn FsInputStream>> {
    let status = fs.get_file_status(path)?;
    if status.is_dir() {
      return Err(InvalidOperation(format!("Path is a directory: {}", path)).into());
    }
    fs.open(path)
  }

  pub fn write(&self, path: &str, content: &[u8], overwrite: bool) -> Result<()> {
    self.observe(Operation::Write, path, |fs| {
      if !overwrite && fs.exists(path)? {
        return Err(AlreadyExists(path.to_string()).into());
      }

      let start = Instant::now();
      let mut stream = fs.create(path, overwrite)?;
      stream
        .write_all(content)
        .and_then(|_| stream.flush())
        .context(HdfsClientErrorKind::stream_error(path, start.elapsed()))?;
      stream.close()?;
      info!("Wrote {} bytes to {}", content.len(), path);
      Ok(())
    })
  }

  pub fn mkdir(&self, path: &str) -> Result<bool> {
    self.observe(Operation::Mkdir, path, |fs| fs.mkdirs(path))
  }

  pub fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    self.observe(Operation::Delete, path, |fs| fs.delete(path, recursive))
  }

  pub fn exists(&self, path: &str) -> Result<bool> {
    self.observe(Operation::Exists, path, |fs| fs.exists(path))
  }

  /// Rewrites every timeout of the live connection; later operations use the new value. The
  /// retry count is left unchanged.
  pub fn set_timeout(&mut self, timeout_ms: u64) -> Result<()> {
    let target = self.target.clone();
    let fs = self
      .fs
      .as_mut()
      .ok_or_else(|| InvalidOperation(format!("Client for {} is closed", target)))?;

    let current = TimeoutSettings::from_config(fs.conf())?;
    TimeoutSettings::new(timeout_ms, current.max_retries_on_timeout())
      .apply_durations_to(fs.conf_mut(), SET_TIMEOUT_SOURCE);
    info!("Set timeouts of {} to {} ms", target, timeout_ms);
    Ok(())
  }

  /// The identity operations run as.
  pub fn whoami(&self) -> SubjectRef {
    self.security.login_user()
  }

  /// Releases the connection. Closing again is a no-op.
  pub fn close(&mut self) -> Result<()> {
    match self.fs.take() {
      Some(mut fs) => {
        info!("Closing connection to {}", self.target);
        fs.close()
      }
      None => Ok(()),
    }
  }
}

impl Drop for HdfsClient {
  fn drop(&mut self) {
    if let Err(e) = self.close() {
      warn!("Failed to close connection to {}: {}", self.target, e);
    }
  }
}
