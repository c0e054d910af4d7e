use crate::error::{HdfsClientErrorKind::AuthenticationError, Result};
use std::sync::{Arc, OnceLock};

pub mod auth;
pub mod kerberos;
pub mod user;

use kerberos::{discard_cache, KerberosLogin, KinitLogin};
use user::{Subject, SubjectRef};

/// Process wide login state. At most one login user is established; until then the ambient OS
/// user is reported.
pub struct SecurityContext {
  login: Box<dyn KerberosLogin + Send + Sync>,
  login_user: OnceLock<SubjectRef>,
}

pub type SecurityContextRef = Arc<SecurityContext>;

impl Default for SecurityContext {
  fn default() -> Self {
    Self::new()
  }
}

impl SecurityContext {
  pub fn new() -> Self {
    Self::with_login(KinitLogin::default())
  }

  pub fn with_login<L>(login: L) -> Self
  where
    L: KerberosLogin + Send + Sync + 'static,
  {
    Self { login: Box::new(login), login_user: OnceLock::new() }
  }

  pub fn kerberos_login(&self) -> &dyn KerberosLogin {
    self.login.as_ref()
  }

  pub fn establish(&self, subject: Subject) -> Result<SubjectRef> {
    let name = subject.user().fullname().clone();
    self.login_user.set(Arc::new(subject)).map_err(|_| {
      AuthenticationError(format!("a login user is already established, can not log in as {}", name))
    })?;
    Ok(self.login_user())
  }

  pub fn is_established(&self) -> bool {
    self.login_user.get().is_some()
  }

  pub fn login_user(&self) -> SubjectRef {
    match self.login_user.get() {
      Some(subject) => subject.clone(),
      None => Arc::new(Subject::simple_os_user()),
    }
  }
}

impl Drop for SecurityContext {
  fn drop(&mut self) {
    if let Some(credentials) = self.login_user.get().and_then(|s| s.credentials().as_ref()) {
      discard_cache(credentials);
    }
  }
}
