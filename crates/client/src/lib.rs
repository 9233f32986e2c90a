//! `supplierdesk-client`
//!
//! **Responsibility:** Embeddable front door for the supplier review
//! dashboard.
//!
//! This crate provides:
//! - Process configuration and telemetry setup
//! - The [`Dashboard`] facade wiring session, authorization, polling sync
//!   and inactivity monitoring together for a UI shell
//!
//! The dashboard is a **thin shell** around the backend API; the server
//! copy of every record stays authoritative.

pub mod app;
pub mod config;
pub mod telemetry;

pub use app::Dashboard;
pub use config::ClientConfig;
