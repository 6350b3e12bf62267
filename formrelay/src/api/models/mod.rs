//! API request and response data models.
//!
//! - [`contact`]: The normalized `{success, message}` relay outcome and attachment summary

pub mod contact;
