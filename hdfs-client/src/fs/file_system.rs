use crate::{
  config::Configuration,
  error::{
    HdfsClientErrorKind::{ConnectionError, NotFound},
    Result,
  },
  fs::{
    file_status::FileStatus,
    input_stream::{FsInputStream, FsOutputStream},
    local::LocalFileSystem,
    path::FsPath,
  },
  hdfs::distributed_file_system::DFSBuilder,
  security::user::SubjectRef,
};
use std::convert::TryFrom;

pub const LOCAL_SCHEME: &'static str = "file";
pub const DFS_SCHEME: &'static str = "hdfs";
pub const WEBHDFS_SCHEME: &'static str = "webhdfs";
pub const SWEBHDFS_SCHEME: &'static str = "swebhdfs";

pub type FileSystemRef = Box<dyn FileSystem>;

pub trait FileSystem {
  fn uri(&self) -> &FsPath;

  fn conf(&self) -> &Configuration;

  fn conf_mut(&mut self) -> &mut Configuration;

  fn exists(&self, path: &str) -> Result<bool> {
    match self.get_file_status(path) {
      Ok(_) => Ok(true),
      Err(e) => match e.kind() {
        NotFound(_) => Ok(false),
        _ => Err(e),
      },
    }
  }

  /// Fails with `NotFound` when nothing exists at `path`.
  fn get_file_status(&self, path: &str) -> Result<FileStatus>;

  /// Entries of a directory, or the status of `path` alone when it is a file.
  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>>;

  fn open(&self, path: &str) -> Result<Box<dyn FsInputStream>>;

  /// Creates or truncates a file, making missing parent directories.
  fn create(&self, path: &str, overwrite: bool) -> Result<Box<dyn FsOutputStream>>;

  fn mkdirs(&self, path: &str) -> Result<bool>;

  /// Returns false when nothing existed at `path`. Deleting a non-empty directory without
  /// `recursive` is an error.
  fn delete(&self, path: &str, recursive: bool) -> Result<bool>;

  fn close(&mut self) -> Result<()>;
}

// Methods for creating file systems
pub fn make_file_system(
  fs_path: &str,
  config: Configuration,
  subject: SubjectRef,
) -> Result<FileSystemRef> {
  let uri = FsPath::try_from(fs_path)?;
  match uri.scheme() {
    LOCAL_SCHEME => Ok(Box::new(LocalFileSystem::new(uri, config)?)),
    DFS_SCHEME | WEBHDFS_SCHEME | SWEBHDFS_SCHEME => DFSBuilder::new(fs_path, config, subject).build(),
    other => Err(ConnectionError(format!("No FileSystem for scheme \"{}\"", other)).into()),
  }
}
