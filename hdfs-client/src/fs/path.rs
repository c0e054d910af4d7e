use crate::error::{
  HdfsClientError,
  HdfsClientErrorKind::{InvalidArgumentError, PathError},
  Result,
};
use failure::ResultExt;
use std::convert::TryFrom;
use url::Url;

pub const SEPARATOR: &'static str = "/";

/// A fully qualified filesystem address such as `hdfs://nn:8020/user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsPath {
  url: Url,
}

impl FsPath {
  pub fn scheme(&self) -> &str {
    self.url.scheme()
  }

  pub fn host(&self) -> Option<&str> {
    self.url.host_str()
  }

  pub fn port(&self) -> Option<u16> {
    self.url.port()
  }

  pub fn authority(&self) -> String {
    let mut authority = String::with_capacity(32);
    authority.push_str(self.url.username());

    if let Some(passwd) = self.url.password() {
      authority.push(':');
      authority.push_str(passwd);
    }

    if !authority.is_empty() {
      authority.push('@');
    }

    if let Some(host_str) = self.url.host_str() {
      authority.push_str(host_str);
    }

    if let Some(port) = self.url.port() {
      authority.push(':');
      authority.push_str(port.to_string().as_str());
    }

    authority
  }

  pub fn file_path(&self) -> &str {
    self.url.path()
  }

  /// `scheme://authority/` with the path dropped.
  pub fn base(&self) -> Result<Self> {
    Self::try_from(format!("{}://{}/", self.url.scheme(), self.authority()).as_str())
  }

  pub fn as_str(&self) -> &str {
    self.url.as_str()
  }

  /// Absolute path on this filesystem for `path`. Relative paths are taken from `working_dir`;
  /// qualified paths must point at this filesystem.
  pub fn resolve(&self, working_dir: &str, path: &str) -> Result<String> {
    if path.contains("://") {
      let other = FsPath::try_from(path)?;
      if other.scheme() != self.scheme() || other.authority() != self.authority() {
        return Err(
          InvalidArgumentError(format!("Wrong FS: {}, expected: {}", path, self.base()?.as_str()))
            .into(),
        );
      }
      return Ok(normalize(other.file_path()));
    }

    if path.starts_with(SEPARATOR) {
      Ok(normalize(path))
    } else {
      Ok(normalize(&format!("{}{}{}", working_dir, SEPARATOR, path)))
    }
  }

  /// Qualified address of an absolute path on this filesystem.
  pub fn qualify(&self, absolute_path: &str) -> String {
    format!("{}://{}{}", self.scheme(), self.authority(), absolute_path)
  }
}

/// Collapses `.`, `..` and repeated separators. The result always starts with `/`.
pub fn normalize(path: &str) -> String {
  let mut components: Vec<&str> = Vec::new();
  for component in path.split(SEPARATOR) {
    match component {
      "" | "." => (),
      ".." => {
        components.pop();
      }
      c => components.push(c),
    }
  }

  format!("{}{}", SEPARATOR, components.join(SEPARATOR))
}

/// Last component of `path`, or the empty string for the root.
pub fn file_name(path: &str) -> &str {
  path.trim_end_matches(SEPARATOR).rsplit(SEPARATOR).next().unwrap_or("")
}

pub fn parent(path: &str) -> Option<String> {
  let normalized = normalize(path);
  if normalized == SEPARATOR {
    return None;
  }
  match normalized.rfind(SEPARATOR) {
    Some(0) => Some(SEPARATOR.to_string()),
    Some(idx) => Some(normalized[..idx].to_string()),
    None => None,
  }
}

impl<'a> TryFrom<&'a str> for FsPath {
  type Error = HdfsClientError;

  fn try_from(value: &'a str) -> Result<Self> {
    let url = Url::parse(value).context(PathError(value.to_string()))?;
    Ok(FsPath { url })
  }
}
