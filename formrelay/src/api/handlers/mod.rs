//! HTTP request handlers.
//!
//! - [`contact`]: Contact form submission and relay
//! - [`static_assets`]: The embedded browser script

pub mod contact;
pub mod static_assets;
