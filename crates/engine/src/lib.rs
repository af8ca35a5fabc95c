//! Covenant engine library.
//!
//! Server-side orchestration for the resource economy: submissions, reviews,
//! skill casts and punishments on top of `covenant-domain`.
//!
//! ## Structure
//!
//! - `use_cases/` - one struct per player or staff story
//! - `infrastructure/` - port traits and the SQLite adapter
//! - `api/` - HTTP entry points
//! - `app` - application composition
//! - `config` - environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
pub use config::AppConfig;
