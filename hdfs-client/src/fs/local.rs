use crate::{
  config::Configuration,
  error::{
    HdfsClientErrorKind::{AlreadyExists, InvalidOperation, IoError, NotFound},
    Result,
  },
  fs::{
    file_status::{FileStat, FileStatus},
    file_system::FileSystem,
    input_stream::{FsInputStream, FsOutputStream},
    path::FsPath,
  },
};
use failure::{Fail, ResultExt};
use std::{
  env,
  fs::{self, File, Metadata},
  io::{self, BufReader, BufWriter, ErrorKind, Read, Write},
  os::unix::fs::MetadataExt,
  path::{Path, PathBuf},
  time::UNIX_EPOCH,
};

const LOCAL_REPLICATION: u16 = 1;
const LOCAL_BLOCK_SIZE: u64 = 32 * 1024 * 1024;

/// The `file://` filesystem.
pub struct LocalFileSystem {
  uri: FsPath,
  config: Configuration,
  working_dir: String,
  closed: bool,
}

impl LocalFileSystem {
  pub fn new(uri: FsPath, config: Configuration) -> Result<Self> {
    let working_dir = env::current_dir().context(IoError("current directory".to_string()))?;
    Ok(Self {
      uri,
      config,
      working_dir: working_dir.to_string_lossy().into_owned(),
      closed: false,
    })
  }

  fn local_path(&self, path: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(self.uri.resolve(&self.working_dir, path)?))
  }
}

fn metadata(path: &Path) -> Result<Option<Metadata>> {
  match fs::symlink_metadata(path) {
    Ok(m) => Ok(Some(m)),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e.context(IoError(format!("stat {}", path.display()))).into()),
  }
}

fn millis_since_epoch(time: io::Result<std::time::SystemTime>) -> i64 {
  time
    .ok()
    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
    .map(|d| d.as_millis() as i64)
    .unwrap_or(0)
}

fn to_file_status(path: &Path, meta: &Metadata) -> FileStatus {
  let owner = users::get_user_by_uid(meta.uid())
    .map(|u| u.name().to_string_lossy().into_owned())
    .unwrap_or_else(|| meta.uid().to_string());
  let group = users::get_group_by_gid(meta.gid())
    .map(|g| g.name().to_string_lossy().into_owned())
    .unwrap_or_else(|| meta.gid().to_string());
  let stat = FileStat::new(
    millis_since_epoch(meta.modified()),
    millis_since_epoch(meta.accessed()),
    owner,
    group,
    (meta.mode() & 0o7777) as u16,
  );

  let path = path.to_string_lossy();
  let file_type = meta.file_type();
  if file_type.is_dir() {
    FileStatus::dir(&path, stat)
  } else if file_type.is_symlink() {
    FileStatus::symlink(&path, stat)
  } else {
    FileStatus::file(&path, meta.len(), LOCAL_REPLICATION, LOCAL_BLOCK_SIZE, stat)
  }
}

impl FileSystem for LocalFileSystem {
  fn uri(&self) -> &FsPath {
    &self.uri
  }

  fn conf(&self) -> &Configuration {
    &self.config
  }

  fn conf_mut(&mut self) -> &mut Configuration {
    &mut self.config
  }

  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    let local = self.local_path(path)?;
    match metadata(&local)? {
      Some(meta) => Ok(to_file_status(&local, &meta)),
      None => Err(NotFound(local.display().to_string()).into()),
    }
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    let status = self.get_file_status(path)?;
    if !status.is_dir() {
      return Ok(vec![status]);
    }

    let dir = PathBuf::from(status.path());
    let mut entries = Vec::new();
    for entry in fs::read_dir(&dir).context(IoError(format!("list {}", dir.display())))? {
      let entry = entry.context(IoError(format!("list {}", dir.display())))?;
      let entry_path = entry.path();
      // Entries can vanish between listing and stat
      if let Some(meta) = metadata(&entry_path)? {
        entries.push(to_file_status(&entry_path, &meta));
      }
    }
    entries.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(entries)
  }

  fn open(&self, path: &str) -> Result<Box<dyn FsInputStream>> {
    let status = self.get_file_status(path)?;
    if status.is_dir() {
      return Err(InvalidOperation(format!("{} is a directory", status.path())).into());
    }

    let file = File::open(status.path()).context(IoError(format!("open {}", status.path())))?;
    let reader = BufReader::with_capacity(self.config.readahead(), file);
    debug!("Opened {} for reading", status.path());
    Ok(Box::new(LocalInputStream { path: status.path().clone(), reader }))
  }

  fn create(&self, path: &str, overwrite: bool) -> Result<Box<dyn FsOutputStream>> {
    let local = self.local_path(path)?;
    if let Some(meta) = metadata(&local)? {
      if meta.is_dir() {
        return Err(InvalidOperation(format!("{} is a directory", local.display())).into());
      }
      if !overwrite {
        return Err(AlreadyExists(local.display().to_string()).into());
      }
    }

    if let Some(parent) = local.parent() {
      fs::create_dir_all(parent).context(IoError(format!("mkdirs {}", parent.display())))?;
    }

    let file = File::create(&local).context(IoError(format!("create {}", local.display())))?;
    debug!("Created {} for writing", local.display());
    Ok(Box::new(LocalOutputStream {
      path: local.to_string_lossy().into_owned(),
      writer: BufWriter::new(file),
    }))
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    let local = self.local_path(path)?;
    match metadata(&local)? {
      Some(meta) if meta.is_dir() => Ok(true),
      Some(_) => Err(AlreadyExists(format!("{} is not a directory", local.display())).into()),
      None => {
        fs::create_dir_all(&local).context(IoError(format!("mkdirs {}", local.display())))?;
        Ok(true)
      }
    }
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    let local = self.local_path(path)?;
    let meta = match metadata(&local)? {
      Some(meta) => meta,
      None => return Ok(false),
    };

    if !meta.is_dir() {
      fs::remove_file(&local).context(IoError(format!("delete {}", local.display())))?;
    } else if recursive {
      fs::remove_dir_all(&local).context(IoError(format!("delete {}", local.display())))?;
    } else {
      let mut children = fs::read_dir(&local).context(IoError(format!("list {}", local.display())))?;
      if children.next().is_some() {
        return Err(
          InvalidOperation(format!("{} is non empty: Directory is not empty", local.display()))
            .into(),
        );
      }
      fs::remove_dir(&local).context(IoError(format!("delete {}", local.display())))?;
    }
    Ok(true)
  }

  fn close(&mut self) -> Result<()> {
    if !self.closed {
      debug!("Closing {}", self.uri.as_str());
      self.closed = true;
    }
    Ok(())
  }
}

struct LocalInputStream {
  path: String,
  reader: BufReader<File>,
}

impl Read for LocalInputStream {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.reader.read(buf)
  }
}

impl FsInputStream for LocalInputStream {
  fn path(&self) -> &str {
    &self.path
  }
}

struct LocalOutputStream {
  path: String,
  writer: BufWriter<File>,
}

impl Write for LocalOutputStream {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.writer.write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.writer.flush()
  }
}

impl FsOutputStream for LocalOutputStream {
  fn path(&self) -> &str {
    &self.path
  }

  fn close(mut self: Box<Self>) -> Result<()> {
    self.writer.flush().context(IoError(format!("flush {}", self.path)))?;
    self.writer.get_ref().sync_all().context(IoError(format!("sync {}", self.path)))?;
    Ok(())
  }
}
