use crate::{
  config::Configuration,
  error::{
    HdfsClientErrorKind::{
      AlreadyExists, AuthenticationError, ConnectionError, InvalidOperation, NotFound,
    },
    Result,
  },
  fs::{
    file_status::FileStatus,
    file_system::{FileSystem, FileSystemRef},
    input_stream::{FsInputStream, FsOutputStream},
    path::{FsPath, SEPARATOR},
  },
  hdfs::{
    hdfs_config::{webhdfs_endpoint, HdfsClientConfig},
    protocol::client_protocol::{ClientProtocol, WebHdfsProtocol},
  },
  security::user::SubjectRef,
};
use failure::ResultExt;
use std::convert::TryFrom;

const USER_HOME_PREFIX: &'static str = "/user";

pub struct DistributedFileSystem {
  base_uri: FsPath,
  config: Configuration,
  working_dir: String,
  name_node: Box<dyn ClientProtocol>,
  closed: bool,
}

impl DistributedFileSystem {
  fn resolve(&self, path: &str) -> Result<String> {
    if self.closed {
      return Err(InvalidOperation(format!("Filesystem {} is closed", self.base_uri.as_str())).into());
    }
    self.base_uri.resolve(&self.working_dir, path)
  }

  fn client_config(&self) -> Result<HdfsClientConfig> {
    HdfsClientConfig::new(&self.config)
  }

  pub fn working_dir(&self) -> &str {
    &self.working_dir
  }
}

impl FileSystem for DistributedFileSystem {
  fn uri(&self) -> &FsPath {
    &self.base_uri
  }

  fn conf(&self) -> &Configuration {
    &self.config
  }

  fn conf_mut(&mut self) -> &mut Configuration {
    &mut self.config
  }

  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    let path = self.resolve(path)?;
    self
      .name_node
      .get_file_info(&self.client_config()?, &path)?
      .ok_or_else(|| NotFound(self.base_uri.qualify(&path)).into())
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    let status = self.get_file_status(path)?;
    if !status.is_dir() {
      return Ok(vec![status]);
    }
    self.name_node.get_listing(&self.client_config()?, status.path())
  }

  fn open(&self, path: &str) -> Result<Box<dyn FsInputStream>> {
    let status = self.get_file_status(path)?;
    if status.is_dir() {
      return Err(InvalidOperation(format!("{} is a directory", status.path())).into());
    }
    self.name_node.open(&self.client_config()?, status.path())
  }

  fn create(&self, path: &str, overwrite: bool) -> Result<Box<dyn FsOutputStream>> {
    let path = self.resolve(path)?;
    let conf = self.client_config()?;
    if let Some(status) = self.name_node.get_file_info(&conf, &path)? {
      if status.is_dir() {
        return Err(InvalidOperation(format!("{} is a directory", path)).into());
      }
      if !overwrite {
        return Err(AlreadyExists(self.base_uri.qualify(&path)).into());
      }
    }
    self.name_node.create(&conf, &path, overwrite)
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    let path = self.resolve(path)?;
    self.name_node.mkdirs(&self.client_config()?, &path)
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    let path = self.resolve(path)?;
    self.name_node.delete(&self.client_config()?, &path, recursive)
  }

  fn close(&mut self) -> Result<()> {
    if !self.closed {
      debug!("Closing {}", self.base_uri.as_str());
      self.closed = true;
    }
    Ok(())
  }
}

pub struct DFSBuilder<'a> {
  path: &'a str,
  config: Configuration,
  subject: SubjectRef,
  name_node: Option<Box<dyn ClientProtocol>>,
}

impl<'a> DFSBuilder<'a> {
  pub fn new(path: &'a str, config: Configuration, subject: SubjectRef) -> Self {
    Self { path, config, subject, name_node: None }
  }

  pub fn with_protocol(mut self, name_node: Box<dyn ClientProtocol>) -> Self {
    self.name_node = Some(name_node);
    self
  }

  pub fn build(self) -> Result<FileSystemRef> {
    let path = FsPath::try_from(self.path)?;
    let base_uri = path.base()?;

    let name_node = match self.name_node {
      Some(name_node) => name_node,
      None => {
        // The gateway only sees `user.name`; a ticket would silently be ignored.
        if self.subject.has_kerberos_credentials() {
          return Err(
            AuthenticationError(format!(
              "{} is logged in with Kerberos, but {} is served over WebHDFS which this client can \
               only access with simple authentication (SPNEGO is not supported)",
              self.subject.user().fullname(),
              base_uri.as_str()
            ))
            .into(),
          );
        }
        let endpoint = webhdfs_endpoint(&base_uri, &self.config)?;
        info!("Using WebHDFS endpoint {} for {}", endpoint, base_uri.as_str());
        let conf = HdfsClientConfig::new(&self.config)?;
        Box::new(WebHdfsProtocol::new(&endpoint, self.subject.clone(), &conf)?)
      }
    };

    let working_dir =
      format!("{}{}{}", USER_HOME_PREFIX, SEPARATOR, self.subject.user().shortname());
    let fs = DistributedFileSystem {
      base_uri,
      config: self.config,
      working_dir,
      name_node,
      closed: false,
    };

    fs.get_file_status(SEPARATOR)
      .context(ConnectionError(format!("unable to reach {}", fs.base_uri.as_str())))?;
    Ok(Box::new(fs))
  }
}
