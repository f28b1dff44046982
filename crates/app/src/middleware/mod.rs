//! HTTP middleware for the survey app.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Install guard (pages only: send uninstalled shops into OAuth)

pub mod install;
pub mod request_id;

pub use install::require_installed_shop;
pub use request_id::request_id_middleware;
