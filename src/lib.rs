//! Sentra: client-management dashboard backend and its client-side mirror.
//!
//! The HTTP service (`routes`, `services`) is a thin layer over Postgres,
//! whose migrations own the rollup triggers and row policies. `mirror` is
//! the typed client that keeps observable copies of the same rows.

pub mod access;
pub mod config;
pub mod db;
pub mod mirror;
pub mod models;
pub mod rollup;
pub mod routes;
pub mod services;
pub mod state;
