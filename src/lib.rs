// Public library interface for grovemap-rs
// The CLI and the debug-layout tool both build on these modules

pub mod app;
pub mod config;
pub mod layout;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod tree;
pub mod ui;
pub mod validate;
