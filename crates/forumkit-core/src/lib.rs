//! # forumkit-core
//!
//! Core crate for Forumkit. Contains configuration schemas, the unified
//! error system, and shared result types used by every other crate.
//!
//! This crate has **no** internal dependencies on other Forumkit crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
