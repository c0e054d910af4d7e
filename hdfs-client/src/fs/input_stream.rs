use crate::error::Result;
use std::io::{Read, Write};

/// Readable handle to one file. Released when dropped.
pub trait FsInputStream: Read {
  /// Path the stream was opened on.
  fn path(&self) -> &str;
}

/// Writable handle to one file. Data is only guaranteed durable after [`FsOutputStream::close`].
pub trait FsOutputStream: Write {
  fn path(&self) -> &str;

  fn close(self: Box<Self>) -> Result<()>;
}
