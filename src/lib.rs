//! Non-personalized recommendations over a course ratings dataset.
//!
//! The engine in [`services`] joins users, items and ratings into a fact
//! table, computes grouped statistics and popularity rankings over it, and
//! scores items by how often they share raters with a reference item. The
//! [`api`] module wraps those operations in a small axum service.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
