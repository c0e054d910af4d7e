use crate::{
  config::{keys::FS_DEFAULT_NAME_KEY, resolver::TARGET_ADDRESS_SOURCE, Configuration},
  error::{HdfsClientErrorKind::ConnectionError, Result},
  fs::{make_file_system, FileSystemRef},
  security::SecurityContextRef,
};
use failure::ResultExt;

/// Opens the filesystem named by a target address as the current login user.
#[derive(new)]
pub struct ConnectionFactory {
  security: SecurityContextRef,
}

impl ConnectionFactory {
  pub fn connect(&self, mut config: Configuration, target_address: &str) -> Result<FileSystemRef> {
    config.set_with_source(FS_DEFAULT_NAME_KEY, target_address, TARGET_ADDRESS_SOURCE);

    let subject = self.security.login_user();
    info!(
      "Connecting to {} as {} ({})",
      target_address,
      subject.user().fullname(),
      subject.user().auth_method()
    );

    let fs = make_file_system(target_address, config, subject)
      .context(ConnectionError(format!("Failed to connect to {}", target_address)))?;
    info!("Connected to {}", fs.uri().as_str());
    Ok(fs)
  }
}

#[cfg(test)]
mod tests {
  use crate::config::{keys::FS_DEFAULT_NAME_KEY, Configuration};
  use crate::connection::ConnectionFactory;
  use crate::error::HdfsClientErrorKind;
  use crate::security::{kerberos::tests::FakeLogin, SecurityContext};
  use std::sync::Arc;

  fn factory() -> ConnectionFactory {
    ConnectionFactory::new(Arc::new(SecurityContext::with_login(FakeLogin::default())))
  }

  #[test]
  fn test_target_address_applied_last() {
    let mut config = Configuration::with_defaults();
    config.set(FS_DEFAULT_NAME_KEY, "hdfs://from-file:8020");

    let fs = factory().connect(config, "file:///").unwrap();
    assert_eq!(Some("file:///"), fs.conf().get_raw(FS_DEFAULT_NAME_KEY));
  }

  #[test]
  fn test_invalid_address() {
    for address in ["not a uri", "ftp://host/", "webhdfs:///"].iter() {
      let err = factory().connect(Configuration::with_defaults(), address).err().unwrap();
      match err.kind() {
        HdfsClientErrorKind::ConnectionError(msg) => assert!(msg.contains(address)),
        k => panic!("Unexpected error kind: {:?}", k),
      }
    }
  }
}
