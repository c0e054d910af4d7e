use crate::{
  config::{keys::HADOOP_SECURITY_AUTHENTICATION_KEY, Configuration},
  error::Result,
};
use std::{
  fmt::{Display, Formatter},
  str::FromStr,
};

/// Value of `hadoop.security.authentication`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
  Simple,
  Kerberos,
}

impl AuthMethod {
  pub fn from_config(config: &Configuration) -> Result<Self> {
    config.get_or(HADOOP_SECURITY_AUTHENTICATION_KEY, AuthMethod::Simple)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      AuthMethod::Simple => "simple",
      AuthMethod::Kerberos => "kerberos",
    }
  }
}

impl FromStr for AuthMethod {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, String> {
    match s.to_ascii_lowercase().as_str() {
      "simple" => Ok(AuthMethod::Simple),
      "kerberos" => Ok(AuthMethod::Kerberos),
      other => Err(format!("unsupported authentication method: {}", other)),
    }
  }
}

impl Display for AuthMethod {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    write!(f, "{}", self.as_str().to_ascii_uppercase())
  }
}
