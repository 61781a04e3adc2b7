//! Core domain types and utilities for the Instar dashboard.
//!
//! This crate provides the identifier types and the error handling
//! foundation shared by the server and the session client.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
