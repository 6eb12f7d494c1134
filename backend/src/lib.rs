//! # Dealership Catalogue Backend
//!
//! REST backend for a dealership car catalogue: inventory browsing with
//! filters and facets, user accounts, favorites, and threaded comments
//! with likes.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and the public DTO surface
//! - [`models`]: Domain records stored by the repositories
//! - [`routes`]: Response payload types for each endpoint family
//! - [`db`]: Repository traits, error types, and the local/Postgres backends
//! - [`services`]: Comment tree builder, toggle engine, catalogue queries,
//!   accounts, and the legacy dealer proxy
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`config`]: Server and upstream service configuration

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
