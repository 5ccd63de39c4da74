//! # Taskboard API Server Library
//!
//! Core functionality for the Taskboard API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `pagination`: Page-number pagination for list endpoints
//! - `serializers`: Wire representations and validation
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod pagination;
pub mod routes;
pub mod serializers;
