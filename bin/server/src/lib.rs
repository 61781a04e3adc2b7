//! Instar dashboard API server.
//!
//! This crate provides the HTTP API behind the dashboard: password login,
//! token refresh, registration and admin-only user management.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod user;
