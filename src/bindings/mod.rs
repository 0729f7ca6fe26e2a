pub mod c_api;

// Re-export the exported entry points
pub use c_api::*;
