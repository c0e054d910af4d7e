pub mod file_status;
pub mod file_system;
pub mod input_stream;
pub mod local;
pub mod path;

pub use file_system::{make_file_system, FileSystem, FileSystemRef};
