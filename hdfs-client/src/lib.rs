#[macro_use]
extern crate failure;
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate url;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
extern crate uuid;

pub mod client;
pub mod config;
pub mod connection;
#[macro_use]
pub mod error;
pub mod fs;
pub mod hdfs;
pub mod observer;
pub mod security;

pub use client::{HdfsClient, HdfsClientBuilder};
