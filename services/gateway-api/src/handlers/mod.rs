//! REST API handlers

pub mod callbacks;
pub mod health;
pub mod payments;

pub use callbacks::*;
pub use health::*;
pub use payments::*;
