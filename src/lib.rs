// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod auth;
pub mod config;
pub mod controller;
pub mod extract;
pub mod keymap;
pub mod library;
pub mod logging;
pub mod metrics;
pub mod pagination;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod ui;
pub mod upload;

pub use app::App;
