#[macro_use]
extern crate log;

pub mod error;
pub mod models;
pub mod pagination;
pub mod prelude;
pub mod retry;
pub mod traits;

/// Version of the source contract, reported by adapters in their `SourceInfo`
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
