use crate::{
  config::keys::HADOOP_USER_NAME_ENV,
  error::{HdfsClientErrorKind::InvalidArgumentError, Result},
  security::auth::AuthMethod,
};
use regex::Regex;
use std::{env, path::PathBuf, sync::Arc};

const UNKNOWN_USER: &'static str = "unknown";
const FILE_CACHE_PREFIX: &'static str = "FILE:";

lazy_static! {
  // primary[/instance][@REALM]
  static ref PRINCIPAL_PATTERN: Regex = Regex::new(r"^([^/@]+)(?:/([^/@]+))?(?:@([^/@]+))?$")
    .expect("Principal pattern should be a valid regex");
}

#[derive(Debug, PartialEq, Eq, Clone, Getters, CopyGetters)]
pub struct User {
  #[get = "pub"]
  shortname: String,
  #[get = "pub"]
  fullname: String,
  #[get = "pub"]
  realm: Option<String>,
  #[get_copy = "pub"]
  auth_method: AuthMethod,
}

impl User {
  pub fn simple(name: &str) -> Self {
    Self {
      shortname: name.to_string(),
      fullname: name.to_string(),
      realm: None,
      auth_method: AuthMethod::Simple,
    }
  }

  pub fn from_principal(principal: &str) -> Result<Self> {
    let captures = PRINCIPAL_PATTERN
      .captures(principal.trim())
      .ok_or_else(|| InvalidArgumentError(format!("Malformed Kerberos principal: {}", principal)))?;

    Ok(Self {
      shortname: captures[1].to_string(),
      fullname: principal.trim().to_string(),
      realm: captures.get(3).map(|m| m.as_str().to_string()),
      auth_method: AuthMethod::Kerberos,
    })
  }
}

/// Credentials obtained by a keytab login.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Credentials {
  /// Credential cache holding the ticket, in `TYPE:residual` form.
  #[get = "pub"]
  cache: String,
  #[get = "pub"]
  keytab: PathBuf,
  #[get = "pub"]
  krb5_conf: Option<PathBuf>,
}

impl Credentials {
  /// Location of a `FILE:` cache; other cache types have no file.
  pub fn cache_file(&self) -> Option<PathBuf> {
    self.cache.strip_prefix(FILE_CACHE_PREFIX).map(PathBuf::from)
  }
}

#[derive(Debug, Getters, new)]
pub struct Subject {
  #[get = "pub"]
  user: User,
  #[get = "pub"]
  credentials: Option<Credentials>,
}

pub type SubjectRef = Arc<Subject>;

impl Subject {
  /// The ambient identity: `HADOOP_USER_NAME` if set, otherwise the OS user.
  pub fn simple_os_user() -> Self {
    let name = env::var(HADOOP_USER_NAME_ENV)
      .ok()
      .filter(|n| !n.is_empty())
      .or_else(current_os_user)
      .unwrap_or_else(|| UNKNOWN_USER.to_string());
    Self::new(User::simple(&name), None)
  }

  pub fn has_kerberos_credentials(&self) -> bool {
    self.user.auth_method == AuthMethod::Kerberos && self.credentials.is_some()
  }

  /// Local OS groups of the short name; empty when the user is unknown to this host.
  pub fn group_names(&self) -> Vec<String> {
    let shortname = self.user.shortname.as_str();
    let primary_gid = match users::get_user_by_name(shortname) {
      Some(u) => u.primary_group_id(),
      None => return Vec::new(),
    };

    users::get_user_groups(shortname, primary_gid)
      .unwrap_or_default()
      .iter()
      .map(|g| g.name().to_string_lossy().into_owned())
      .collect()
  }
}

pub fn current_os_user() -> Option<String> {
  users::get_current_username().and_then(|n| n.into_string().ok())
}
