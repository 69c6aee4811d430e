//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled            |
//! |-----------|-----------------------------|
//! | `auth`    | `Login`, `Auth`, `Logout`   |
//! | `repos`   | `Repos`                     |
//! | `issues`  | `Issues`, `Command`         |
//! | `config`  | `Config`                    |
//!
//! `context` holds the configuration, session and backend wiring they share.

pub mod auth;
pub mod config;
pub mod context;
pub mod issues;
pub mod repos;

pub use auth::{cmd_auth, cmd_login, cmd_logout};
pub use config::cmd_config;
pub use issues::{cmd_command, cmd_issues};
pub use repos::cmd_repos;
