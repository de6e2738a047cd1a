pub mod colors;
pub mod format;
pub mod scene;
pub mod text;
