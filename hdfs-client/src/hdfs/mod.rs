pub mod distributed_file_system;
pub mod hdfs_config;
pub mod protocol;
