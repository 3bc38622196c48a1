//! Scraping and normalization core for Cudy router web admin pages.
//!
//! The router exposes dozens of undocumented, inconsistently-formatted
//! status pages. This crate turns them into a typed snapshot:
//!
//! - **[`CudyRouter`]** -- the poll orchestrator: one
//!   [`get_data()`](CudyRouter::get_data) call per tick fetches every
//!   page the [feature matrix](features) allows for the hardware model
//!   and merges the parser outputs into a [`Snapshot`].
//! - **[`pages`]** -- one parser per status page (modem, WAN, LAN, DHCP,
//!   VPN, WiFi, SMS, data usage, devices, mesh), built on the generic
//!   [table extractor](scrape::tables) and the
//!   [unit normalizers](scrape::text).
//! - **[`mesh`]** -- identity reconciliation for mesh units reported by
//!   three partially-overlapping sources.
//! - **Domain model** ([`model`]) -- [`Field`]/[`Module`]/[`Snapshot`],
//!   plus [`MacAddress`], [`Device`], and [`MeshDevice`].
//!
//! Scraping absence is not an error: unknown layouts and missing fields
//! degrade to `None` values or omitted modules, never failures.

pub mod collector;
pub mod config;
pub mod error;
pub mod features;
pub mod mesh;
pub mod model;
pub mod pages;
pub mod scrape;

pub use collector::{CudyRouter, PollOptions};
pub use config::RouterConfig;
pub use error::CoreError;
pub use model::{
    Device, Field, FieldMap, MacAddress, MeshDevice, MeshReport, MeshStatus, Module, Snapshot,
    Value,
};
