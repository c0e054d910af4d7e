//! JSON bodies exchanged with the WebHDFS gateway.

use crate::{
  error::{
    HdfsClientError,
    HdfsClientErrorKind::{AlreadyExists, InvalidOperation, NotFound, RemoteError},
    RemoteErrorInfo,
  },
  fs::{
    file_status::{FileStat, FileStatus},
    path::SEPARATOR,
  },
};
use serde::Deserialize;

const FILE_NOT_FOUND_EXCEPTION: &'static str = "FileNotFoundException";
const FILE_ALREADY_EXISTS_EXCEPTION: &'static str = "FileAlreadyExistsException";
const PATH_IS_NOT_EMPTY_DIRECTORY_EXCEPTION: &'static str = "PathIsNotEmptyDirectoryException";
const PARENT_NOT_DIRECTORY_EXCEPTION: &'static str = "ParentNotDirectoryException";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileTypeMessage {
  File,
  Directory,
  Symlink,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatusMessage {
  #[serde(default)]
  pub access_time: i64,
  #[serde(default)]
  pub block_size: u64,
  #[serde(default)]
  pub group: String,
  #[serde(default)]
  pub length: u64,
  #[serde(default)]
  pub modification_time: i64,
  #[serde(default)]
  pub owner: String,
  #[serde(default)]
  pub path_suffix: String,
  #[serde(default)]
  pub permission: String,
  #[serde(default)]
  pub replication: u16,
  #[serde(rename = "type")]
  pub file_type: FileTypeMessage,
}

impl FileStatusMessage {
  /// Status of the entry, whose path is `parent` joined with the entry's suffix.
  pub fn into_file_status(self, parent: &str) -> FileStatus {
    let path = if self.path_suffix.is_empty() {
      parent.to_string()
    } else if parent.ends_with(SEPARATOR) {
      format!("{}{}", parent, self.path_suffix)
    } else {
      format!("{}{}{}", parent, SEPARATOR, self.path_suffix)
    };

    let permission = u16::from_str_radix(&self.permission, 8).unwrap_or(0);
    let stat = FileStat::new(
      self.modification_time,
      self.access_time,
      self.owner,
      self.group,
      permission,
    );

    match self.file_type {
      FileTypeMessage::File => {
        FileStatus::file(&path, self.length, self.replication, self.block_size, stat)
      }
      FileTypeMessage::Directory => FileStatus::dir(&path, stat),
      FileTypeMessage::Symlink => FileStatus::symlink(&path, stat),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct FileStatusResponse {
  #[serde(rename = "FileStatus")]
  pub file_status: FileStatusMessage,
}

#[derive(Debug, Deserialize)]
pub struct FileStatusList {
  #[serde(rename = "FileStatus", default)]
  pub file_status: Vec<FileStatusMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ListStatusResponse {
  #[serde(rename = "FileStatuses")]
  pub file_statuses: FileStatusList,
}

#[derive(Debug, Deserialize)]
pub struct BooleanResponse {
  pub boolean: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteExceptionMessage {
  pub exception: String,
  #[serde(default)]
  pub java_class_name: String,
  #[serde(default)]
  pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoteExceptionResponse {
  #[serde(rename = "RemoteException")]
  pub remote_exception: RemoteExceptionMessage,
}

impl From<RemoteExceptionMessage> for HdfsClientError {
  fn from(e: RemoteExceptionMessage) -> Self {
    match e.exception.as_str() {
      FILE_NOT_FOUND_EXCEPTION => NotFound(e.message).into(),
      FILE_ALREADY_EXISTS_EXCEPTION => AlreadyExists(e.message).into(),
      PATH_IS_NOT_EMPTY_DIRECTORY_EXCEPTION | PARENT_NOT_DIRECTORY_EXCEPTION => {
        InvalidOperation(e.message).into()
      }
      _ => {
        let class_name = if e.java_class_name.is_empty() { e.exception } else { e.java_class_name };
        RemoteError(RemoteErrorInfo::new(class_name, e.message)).into()
      }
    }
  }
}
