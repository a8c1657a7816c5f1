//! Concrete agent implementations.

pub mod chromium;

pub use chromium::{ChromiumBrowser, ChromiumConfig, ChromiumSearchSession};
