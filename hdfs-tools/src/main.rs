extern crate hdfs_client;
extern crate log4rs;
#[macro_use]
extern crate log;
extern crate failure;

use clap::{Parser, Subcommand};
use failure::Fail;
use hdfs_client::{
  config::resolver::conf_dir_from_env,
  error::{HdfsClientError, Result},
  security::SecurityContext,
  HdfsClient, HdfsClientBuilder,
};
use log::LevelFilter;
use log4rs::{
  append::console::{ConsoleAppender, Target},
  config::{Appender, Config, Root},
  encode::pattern::PatternEncoder,
};
use std::{env, path::PathBuf, process, str::FromStr, sync::Arc};

const LOG_CONFIG_ENV: &'static str = "HDFS_CLI_LOG_CONFIG";
const LOG_LEVEL_ENV: &'static str = "HDFS_CLI_LOG_LEVEL";
const LOG_CONFIG_FILE: &'static str = "log4rs.yaml";
const LOG_PATTERN: &'static str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

const KERBEROS_HINTS: [&'static str; 4] = [
  "1. The keytab file exists and is readable",
  "2. The principal is correct",
  "3. The keytab file contains keys for the specified principal",
  "4. The client has the correct time (time skew can cause authentication failures)",
];

/// Command line client for HDFS and other Hadoop compatible filesystems.
///
/// The configuration directory is taken from HADOOP_CONF_DIR (core-site.xml, hdfs-site.xml and
/// client.conf). Kerberos is used when client.conf sets hadoop.kerberos.principal and
/// hadoop.kerberos.keytab.
#[derive(Parser, Debug)]
#[command(name = "hdfs-cli", version)]
struct Cli {
  /// Filesystem address, e.g. hdfs://namenode:8020 or webhdfs://namenode:9870
  target: String,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
  /// List files in directory
  List {
    #[arg(default_value = "/")]
    path: String,
  },
  /// Read file content
  Read { path: String },
  /// Write content to file
  Write {
    path: String,
    content: String,
    #[arg(value_parser = parse_bool)]
    overwrite: Option<bool>,
  },
  /// Create directory
  Mkdir { path: String },
  /// Delete file or directory
  Delete {
    path: String,
    #[arg(value_parser = parse_bool)]
    recursive: Option<bool>,
  },
  /// Check if path exists
  Exists { path: String },
  /// Show current authenticated user
  Whoami,
}

/// `true` in any case is true, everything else is false.
fn parse_bool(s: &str) -> std::result::Result<bool, String> {
  Ok(s.eq_ignore_ascii_case("true"))
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) => {
      if e.print().is_err() {
        eprintln!("{}", e);
      }
      process::exit(if e.use_stderr() { 1 } else { 0 });
    }
  };

  init_logging();

  let result = run(cli, conf_dir_from_env());
  match &result {
    Ok(output) => {
      for line in output {
        println!("{}", line);
      }
    }
    Err(e) => {
      for line in error_report(e) {
        eprintln!("{}", line);
      }
      debug!("Error details: {:?}", e);
    }
  }
  process::exit(exit_status(&result));
}

fn exit_status<T>(result: &Result<T>) -> i32 {
  if result.is_ok() {
    0
  } else {
    1
  }
}

fn init_logging() {
  let config_file = env::var_os(LOG_CONFIG_ENV)
    .map(PathBuf::from)
    .or_else(|| conf_dir_from_env().map(|d| d.join(LOG_CONFIG_FILE)).filter(|p| p.is_file()));

  if let Some(file) = config_file {
    match log4rs::init_file(&file, Default::default()) {
      Ok(_) => return,
      Err(e) => eprintln!("Unable to load log configuration {}: {}", file.display(), e),
    }
  }

  let level = env::var(LOG_LEVEL_ENV)
    .ok()
    .and_then(|l| LevelFilter::from_str(&l).ok())
    .unwrap_or(LevelFilter::Info);

  let stderr = ConsoleAppender::builder()
    .target(Target::Stderr)
    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
    .build();
  let config = Config::builder()
    .appender(Appender::builder().build("stderr", Box::new(stderr)))
    .build(Root::builder().appender("stderr").build(level));

  match config {
    Ok(config) => {
      if let Err(e) = log4rs::init_config(config) {
        eprintln!("Log4rs initialization failed: {}", e);
      }
    }
    Err(e) => eprintln!("Invalid log configuration: {}", e),
  }
}

/// Runs the command against `cli.target` and returns the lines to print. The client is closed
/// whether or not the command succeeded.
fn run(cli: Cli, conf_dir: Option<PathBuf>) -> Result<Vec<String>> {
  let mut client = HdfsClientBuilder::new(&cli.target)
    .conf_dir(conf_dir)
    .security(Arc::new(SecurityContext::new()))
    .build()?;
  info!("HDFS client initialized with address: {}", cli.target);

  let command = cli.command.unwrap_or(Command::List { path: "/".to_string() });
  let result = execute(&client, command);
  let closed = client.close();
  let output = result?;
  closed?;
  Ok(output)
}

fn execute(client: &HdfsClient, command: Command) -> Result<Vec<String>> {
  let mut output = Vec::new();
  match command {
    Command::List { path } => {
      let listing = client.list(&path)?;
      output.push(format!("Listing files in {}:", path));
      for status in listing {
        let file_type = if status.is_dir() { "d" } else { "-" };
        output.push(format!("{} {:>12} {}", file_type, status.length(), status.name()));
      }
    }
    Command::Read { path } => {
      output.push(client.read(&path)?);
    }
    Command::Write { path, content, overwrite } => {
      client.write(&path, content.as_bytes(), overwrite.unwrap_or(false))?;
      output.push(format!("Successfully wrote to {}", path));
    }
    Command::Mkdir { path } => {
      let success = client.mkdir(&path)?;
      output.push(format!(
        "Directory creation {}: {}",
        if success { "successful" } else { "failed" },
        path
      ));
    }
    Command::Delete { path, recursive } => {
      let success = client.delete(&path, recursive.unwrap_or(false))?;
      output.push(format!("Deletion {}: {}", if success { "successful" } else { "failed" }, path));
    }
    Command::Exists { path } => {
      let exists = client.exists(&path)?;
      output.push(format!("Path {} {}", path, if exists { "exists" } else { "does not exist" }));
    }
    Command::Whoami => {
      let subject = client.whoami();
      let user = subject.user();
      output.push(format!("Current authenticated user: {}", user.fullname()));
      output.push(format!("Authentication method: {}", user.auth_method()));
      output.push(format!("Is using Kerberos: {}", subject.has_kerberos_credentials()));

      if subject.has_kerberos_credentials() {
        output.push(format!("Kerberos principal: {}", user.fullname()));
        output.push(format!("Groups: {}", subject.group_names().join(", ")));
      }
    }
  }
  Ok(output)
}

/// Whether the error, or any of its causes, points at a Kerberos login problem.
fn needs_kerberos_hints(e: &HdfsClientError) -> bool {
  e.is_authentication_error()
    || e.to_string().contains("Kerberos")
    || (e as &dyn Fail).iter_causes().any(|c| c.to_string().contains("Kerberos"))
}

fn error_report(e: &HdfsClientError) -> Vec<String> {
  let mut lines = vec![format!("Error executing operation: {}", e)];
  for cause in (e as &dyn Fail).iter_causes() {
    lines.push(format!("  caused by: {}", cause));
  }

  if needs_kerberos_hints(e) {
    lines.push(String::new());
    lines.push("Kerberos authentication error. Please check:".to_string());
    lines.extend(KERBEROS_HINTS.iter().map(|h| h.to_string()));
  }
  lines
}

#[cfg(test)]
mod tests {
  use crate::{error_report, exit_status, needs_kerberos_hints, parse_bool, run, Cli, Command};
  use clap::Parser;
  use failure::ResultExt;
  use hdfs_client::error::{HdfsClientError, HdfsClientErrorKind};
  use std::fs;

  fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
  }

  #[test]
  fn test_parse_bool() {
    assert_eq!(Ok(true), parse_bool("true"));
    assert_eq!(Ok(true), parse_bool("TRUE"));
    assert_eq!(Ok(false), parse_bool("yes"));
    assert_eq!(Ok(false), parse_bool("1"));
  }

  #[test]
  fn test_default_operation() {
    let cli = parse(&["hdfs-cli", "hdfs://nn:8020"]);
    assert_eq!("hdfs://nn:8020", cli.target);
    assert_eq!(None, cli.command);

    let cli = parse(&["hdfs-cli", "hdfs://nn:8020", "list"]);
    assert_eq!(Some(Command::List { path: "/".to_string() }), cli.command);
  }

  #[test]
  fn test_operations() {
    let cli = parse(&["hdfs-cli", "hdfs://nn:8020", "write", "/a.txt", "hello", "True"]);
    assert_eq!(
      Some(Command::Write {
        path: "/a.txt".to_string(),
        content: "hello".to_string(),
        overwrite: Some(true)
      }),
      cli.command
    );

    let cli = parse(&["hdfs-cli", "hdfs://nn:8020", "delete", "/d"]);
    assert_eq!(Some(Command::Delete { path: "/d".to_string(), recursive: None }), cli.command);

    let cli = parse(&["hdfs-cli", "hdfs://nn:8020", "whoami"]);
    assert_eq!(Some(Command::Whoami), cli.command);
  }

  #[test]
  fn test_invalid_invocations() {
    assert!(Cli::try_parse_from(&["hdfs-cli"]).is_err());
    assert!(Cli::try_parse_from(&["hdfs-cli", "hdfs://nn:8020", "read"]).is_err());
    assert!(Cli::try_parse_from(&["hdfs-cli", "hdfs://nn:8020", "chmod", "/a"]).is_err());
    assert!(Cli::try_parse_from(&["hdfs-cli", "hdfs://nn:8020", "write", "/a"]).is_err());
  }

  fn local(args: &[&str]) -> Cli {
    let mut argv = vec!["hdfs-cli", "file:///"];
    argv.extend_from_slice(args);
    parse(&argv)
  }

  #[test]
  fn test_run_against_local_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("greeting.txt");
    let file = file.to_str().unwrap();

    let output = run(local(&["write", file, "hello"]), None).unwrap();
    assert_eq!(vec![format!("Successfully wrote to {}", file)], output);

    let output = run(local(&["read", file]), None).unwrap();
    assert_eq!(vec!["hello".to_string()], output);

    let output = run(local(&["list", dir.path().to_str().unwrap()]), None).unwrap();
    assert_eq!(2, output.len());
    assert!(output[1].starts_with("- "));
    assert!(output[1].ends_with(" 5 greeting.txt"));

    let output = run(local(&["exists", file]), None).unwrap();
    assert_eq!(vec![format!("Path {} exists", file)], output);
  }

  #[test]
  fn test_run_failing_operation() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let missing = missing.to_str().unwrap();

    let result = run(local(&["read", missing]), None);
    assert_eq!(1, exit_status(&result));
    let err = result.unwrap_err();
    match err.kind() {
      HdfsClientErrorKind::NotFound(_) => (),
      k => panic!("Unexpected error kind: {:?}", k),
    }
    let report = error_report(&err);
    assert!(report[0].starts_with("Error executing operation: File not found"));
    assert!(!report.iter().any(|l| l.contains("Please check")));

    fs::write(missing, b"x").unwrap();
    let result = run(local(&["write", missing, "y"]), None);
    assert_eq!(1, exit_status(&result));
    assert_eq!(0, exit_status(&run(local(&["read", missing]), None)));
    assert!(!needs_kerberos_hints(&result.unwrap_err()));

    let result = run(parse(&["hdfs-cli", "gopher://nn/", "exists", "/"]), None);
    assert_eq!(1, exit_status(&result));
  }

  #[test]
  fn test_kerberos_hints() {
    let login: HdfsClientError =
      HdfsClientErrorKind::AuthenticationError("kinit exited with 1".to_string()).into();
    assert!(needs_kerberos_hints(&login));
    let report = error_report(&login);
    assert_eq!("Kerberos authentication error. Please check:", report[2]);
    assert_eq!(7, report.len());

    let wrapped: HdfsClientError = Err::<(), _>(login)
      .context(HdfsClientErrorKind::ConnectionError("hdfs://nn:8020".to_string()))
      .unwrap_err()
      .into();
    assert!(needs_kerberos_hints(&wrapped));
    let report = error_report(&wrapped);
    assert_eq!("Error executing operation: Failed to connect: hdfs://nn:8020", report[0]);
    assert_eq!("  caused by: Kerberos authentication failed: kinit exited with 1", report[1]);

    let mentioned: HdfsClientError =
      HdfsClientErrorKind::ConfigError("Kerberos realm missing".to_string()).into();
    assert!(needs_kerberos_hints(&mentioned));

    let not_found: HdfsClientError = HdfsClientErrorKind::NotFound("/a".to_string()).into();
    assert!(!needs_kerberos_hints(&not_found));
    assert_eq!(
      vec!["Error executing operation: File not found: /a".to_string()],
      error_report(&not_found)
    );
  }
}
