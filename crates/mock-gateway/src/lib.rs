pub mod bucket;
pub mod config;
pub mod server;

pub use bucket::*;
pub use config::*;
pub use server::*;
