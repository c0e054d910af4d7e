use crate::{
  config::{keys::*, properties::Properties, Configuration},
  error::{HdfsClientErrorKind::AuthenticationError, Result},
  security::{
    auth::AuthMethod,
    user::{Credentials, Subject, User},
    SecurityContext,
  },
};
use failure::ResultExt;
use std::{
  env, fs, io,
  path::{Path, PathBuf},
  process::Command,
};
use uuid::Uuid;

const KINIT_PROGRAM: &'static str = "kinit";
const CACHE_FILE_PREFIX: &'static str = "krb5cc_hdfs_client_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
  /// No principal/keytab pair was configured; access stays unauthenticated.
  NotConfigured,
  Established,
  /// Authentication was requested but could not be set up. No login was attempted.
  Failed(String),
}

/// Obtains Kerberos credentials for a principal from a keytab.
pub trait KerberosLogin {
  fn login(&self, principal: &str, keytab: &Path, krb5_conf: Option<&Path>)
    -> Result<Credentials>;
}

/// Logs in by running `kinit -k -t <keytab> <principal>` into a private credential cache.
#[derive(Debug, Clone)]
pub struct KinitLogin {
  program: String,
  cache_dir: PathBuf,
}

impl Default for KinitLogin {
  fn default() -> Self {
    Self::new(KINIT_PROGRAM)
  }
}

impl KinitLogin {
  pub fn new(program: &str) -> Self {
    Self { program: program.to_string(), cache_dir: env::temp_dir() }
  }

  pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
    self.cache_dir = cache_dir;
    self
  }
}

impl KerberosLogin for KinitLogin {
  fn login(
    &self,
    principal: &str,
    keytab: &Path,
    krb5_conf: Option<&Path>,
  ) -> Result<Credentials> {
    let cache_file = self.cache_dir.join(format!("{}{}", CACHE_FILE_PREFIX, Uuid::new_v4()));
    let cache = format!("FILE:{}", cache_file.display());

    let mut command = Command::new(&self.program);
    command.arg("-k").arg("-t").arg(keytab).arg(principal).env("KRB5CCNAME", &cache);
    if let Some(conf) = krb5_conf {
      command.env("KRB5_CONFIG", conf);
    }

    debug!("Running kerberos login: {:?}", command);
    let output = command.output().context(AuthenticationError(format!(
      "unable to run {} for principal {}",
      self.program, principal
    )))?;

    if !output.status.success() {
      remove_cache_file(&cache_file);
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(
        AuthenticationError(format!(
          "login from keytab {} failed for principal {} ({}): {}",
          keytab.display(),
          principal,
          output.status,
          stderr.trim()
        ))
        .into(),
      );
    }

    Ok(Credentials::new(cache, keytab.to_path_buf(), krb5_conf.map(Path::to_path_buf)))
  }
}

/// Deletes the ticket cache of `credentials` if it is a cache file written by [`KinitLogin`].
/// Caches of other tools are left alone.
pub fn discard_cache(credentials: &Credentials) {
  let owned = credentials.cache_file().filter(|file| {
    file
      .file_name()
      .and_then(|name| name.to_str())
      .map(|name| name.starts_with(CACHE_FILE_PREFIX))
      .unwrap_or(false)
  });
  if let Some(file) = owned {
    remove_cache_file(&file);
  }
}

fn remove_cache_file(file: &Path) {
  match fs::remove_file(file) {
    Ok(()) => debug!("Removed credential cache {}", file.display()),
    Err(ref e) if e.kind() == io::ErrorKind::NotFound => (),
    Err(e) => warn!("Unable to remove credential cache {}: {}", file.display(), e),
  }
}

/// Sets up keytab based login from the properties of the overrides file.
#[derive(new)]
pub struct KerberosAuthenticator<'a> {
  security: &'a SecurityContext,
}

impl<'a> KerberosAuthenticator<'a> {
  pub fn authenticate(
    &self,
    config: &mut Configuration,
    overrides: &Properties,
  ) -> Result<AuthenticationOutcome> {
    let (keytab, principal) = match (
      overrides.get_non_empty(KERBEROS_KEYTAB_KEY),
      overrides.get_non_empty(KERBEROS_PRINCIPAL_KEY),
    ) {
      (Some(keytab), Some(principal)) => (Path::new(keytab), principal),
      _ => return Ok(AuthenticationOutcome::NotConfigured),
    };

    info!("Setting up Kerberos authentication:");
    info!("  Principal: {}", principal);
    info!("  Keytab: {}", keytab.display());

    let krb5_conf =
      Path::new(overrides.get_non_empty(KERBEROS_KRB5_CONF_KEY).unwrap_or(KERBEROS_KRB5_CONF_DEFAULT));
    let krb5_conf = if krb5_conf.is_file() {
      info!("  Using krb5.conf: {}", krb5_conf.display());
      Some(krb5_conf)
    } else {
      warn!("krb5.conf file not found at: {}, using default path", krb5_conf.display());
      None
    };

    if !keytab.is_file() {
      error!("Keytab file not found: {}", keytab.display());
      return Ok(AuthenticationOutcome::Failed(format!("keytab not found: {}", keytab.display())));
    }

    config.set(HADOOP_SECURITY_AUTHENTICATION_KEY, AuthMethod::Kerberos.as_str());

    let user = User::from_principal(principal)
      .context(AuthenticationError(format!("invalid principal {}", principal)))?;
    let credentials = self.security.kerberos_login().login(principal, keytab, krb5_conf)?;
    if let Err(e) = self.security.establish(Subject::new(user, Some(credentials.clone()))) {
      discard_cache(&credentials);
      return Err(e);
    }

    info!("Kerberos authentication setup successfully.");
    Ok(AuthenticationOutcome::Established)
  }
}
