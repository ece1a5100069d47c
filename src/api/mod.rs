//! HTTP module
//!
//! This module provides the HTTP server and page routes including:
//! - Routing and request handling
//! - Session cookies and flash notices
//! - JSON page rendering
//! - Trace, security-header and timeout middleware

pub mod server;
pub mod routes;
pub mod middleware;
pub mod handlers;
pub mod models;
pub mod cookies;
pub mod flash;
pub mod views;

pub use server::ApiServer;
pub use middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
