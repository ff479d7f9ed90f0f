//! HTTP request handlers.

pub mod common;
pub mod health;
pub mod metadata;

pub use common::*;
pub use health::*;
pub use metadata::*;
