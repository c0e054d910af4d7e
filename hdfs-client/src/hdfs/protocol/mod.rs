pub mod client_protocol;
pub mod message;
#[cfg(test)]
pub(crate) mod test_utils;
