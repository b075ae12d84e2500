pub mod adoptium;
pub mod def;
mod http_failure;
