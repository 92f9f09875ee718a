pub mod classify;
pub mod config;
pub mod error;
pub mod types;
pub mod verdict;

pub use classify::*;
pub use config::{Config, NewsSource};
pub use error::CrisisTruthError;
pub use types::*;
pub use verdict::*;
