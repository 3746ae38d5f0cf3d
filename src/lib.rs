//! sygt: terminal dashboard for a municipal collections backend.
//!
//! Every screen is the same generic CRUD flow over a JSON REST resource:
//! the [`resource`] registry describes each resource, the [`controller`]
//! drives list/create/update/delete against the [`api`] client, and
//! [`view`], [`nav`] and [`ui`] present it in the terminal.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod event;
pub mod nav;
pub mod resource;
pub mod ui;
pub mod view;

/// Version injected at compile time via SYGT_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("SYGT_VERSION") {
    Some(v) => v,
    None => "dev",
};
