//! Configuration keys understood by the client, with their defaults.

pub const HADOOP_CONF_DIR_ENV: &'static str = "HADOOP_CONF_DIR";
pub const HADOOP_USER_NAME_ENV: &'static str = "HADOOP_USER_NAME";

pub const CORE_SITE_FILE: &'static str = "core-site.xml";
pub const HDFS_SITE_FILE: &'static str = "hdfs-site.xml";
pub const CLIENT_CONF_FILE: &'static str = "client.conf";

pub const FS_DEFAULT_NAME_KEY: &'static str = "fs.defaultFS";
pub const FS_DEFAULT_NAME_DEFAULT: &'static str = "file:///";

pub const HADOOP_SECURITY_AUTHENTICATION_KEY: &'static str = "hadoop.security.authentication";
pub const HADOOP_SECURITY_AUTHENTICATION_DEFAULT: &'static str = "simple";

pub const HADOOP_TMP_DIR_KEY: &'static str = "hadoop.tmp.dir";
pub const HADOOP_TMP_DIR_DEFAULT: &'static str = "/tmp/hadoop-${user.name}";

pub const KERBEROS_KEYTAB_KEY: &'static str = "hadoop.kerberos.keytab";
pub const KERBEROS_PRINCIPAL_KEY: &'static str = "hadoop.kerberos.principal";
pub const KERBEROS_KRB5_CONF_KEY: &'static str = "hadoop.kerberos.krb5.conf";
pub const KERBEROS_KRB5_CONF_DEFAULT: &'static str = "/etc/krb5.conf";

// Readahead in bytes
pub const DFS_CLIENT_READ_READAHEAD_KEY: &'static str = "dfs.client.read.readahead";
pub const DFS_CLIENT_READ_READAHEAD_DEFAULT: usize = 64 * 1024;

pub const DFS_NAMENODE_HTTP_ADDRESS_KEY: &'static str = "dfs.namenode.http-address";
pub const DFS_NAMENODE_HTTP_PORT_DEFAULT: u16 = 9870;
pub const DFS_NAMENODE_HTTPS_ADDRESS_KEY: &'static str = "dfs.namenode.https-address";
pub const DFS_NAMENODE_HTTPS_PORT_DEFAULT: u16 = 9871;
pub const DFS_HTTP_POLICY_KEY: &'static str = "dfs.http.policy";
pub const DFS_HTTP_POLICY_HTTPS_ONLY: &'static str = "HTTPS_ONLY";

// Timeouts, all in milliseconds
pub const DFS_CLIENT_SOCKET_TIMEOUT_KEY: &'static str = "dfs.client.socket-timeout";
pub const DFS_CLIENT_SOCKET_READ_TIMEOUT_KEY: &'static str = "dfs.client.socket.timeout";
pub const IPC_CLIENT_CONNECT_TIMEOUT_KEY: &'static str = "ipc.client.connect.timeout";
pub const IPC_CLIENT_CONNECTION_MAXIDLETIME_KEY: &'static str =
  "ipc.client.connection.maxidletime";
pub const DFS_DATANODE_SOCKET_WRITE_TIMEOUT_KEY: &'static str =
  "dfs.datanode.socket.write.timeout";
pub const DFS_DATANODE_SOCKET_READ_TIMEOUT_KEY: &'static str = "dfs.datanode.socket.read.timeout";
pub const DFS_CLIENT_BLOCK_READ_TIMEOUT_KEY: &'static str = "dfs.client.block.read.timeout";
pub const IPC_CLIENT_CONNECT_MAX_RETRIES_ON_TIMEOUTS_KEY: &'static str =
  "ipc.client.connect.max.retries.on.timeouts";
