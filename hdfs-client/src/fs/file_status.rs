use crate::fs::path::file_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
  File,
  Directory,
  Symlink,
}

/// Ownership and timestamps shared by files and directories. Times are milliseconds since epoch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters, CopyGetters, new)]
pub struct FileStat {
  #[get_copy = "pub"]
  modification_time: i64,
  #[get_copy = "pub"]
  access_time: i64,
  #[get = "pub"]
  owner: String,
  #[get = "pub"]
  group: String,
  #[get_copy = "pub"]
  permission: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct FileStatus {
  /// Absolute path on the owning filesystem.
  #[get = "pub"]
  path: String,
  #[get_copy = "pub"]
  file_type: FileType,
  #[get_copy = "pub"]
  length: u64,
  #[get_copy = "pub"]
  replication: u16,
  #[get_copy = "pub"]
  block_size: u64,
  #[get = "pub"]
  file_stat: FileStat,
}

impl FileStatus {
  pub fn file(path: &str, length: u64, replication: u16, block_size: u64, stat: FileStat) -> Self {
    Self {
      path: path.to_string(),
      file_type: FileType::File,
      length,
      replication,
      block_size,
      file_stat: stat,
    }
  }

  pub fn dir(path: &str, stat: FileStat) -> Self {
    Self {
      path: path.to_string(),
      file_type: FileType::Directory,
      length: 0,
      replication: 0,
      block_size: 0,
      file_stat: stat,
    }
  }

  pub fn symlink(path: &str, stat: FileStat) -> Self {
    Self { file_type: FileType::Symlink, ..Self::dir(path, stat) }
  }

  pub fn name(&self) -> &str {
    file_name(&self.path)
  }

  pub fn is_dir(&self) -> bool {
    self.file_type == FileType::Directory
  }

  pub fn is_file(&self) -> bool {
    self.file_type == FileType::File
  }
}
