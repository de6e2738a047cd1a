pub mod drill;
pub mod focus;
pub mod input;
pub mod tooltip;
