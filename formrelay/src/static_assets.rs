//! Browser-side assets compiled into the binary.

use rust_embed::RustEmbed;

/// Files under `static/`, served below `/assets/`.
#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;
