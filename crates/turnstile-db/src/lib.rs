//! Turnstile DB - Subscription storage
//!
//! SQLx-based database layer for the channel subscription service.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/turnstile").await?;
//! let repos = Repositories::new(pool);
//!
//! let expired = repos.subscriptions.find_expired(today).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
