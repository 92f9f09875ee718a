//! SQLite access to the two persistent stores.
//!
//! Nothing here holds a connection across calls. Callers open a session, run
//! their queries, and close it; a session dropped on an error path releases its
//! connection the same way.

pub mod claims;
pub mod error;
pub mod location;
pub mod news;
mod schema;
mod time;

pub use claims::{CategoryCount, ClaimSession, ClaimStore, PlatformCount};
pub use error::{Result, StoreError};
pub use location::StoreLocation;
pub use news::{NewsSession, NewsStore};
