pub mod client;
pub mod context;
pub mod prompts;

// Re-export common types
pub use client::*;
pub use context::*;
pub use prompts::*;
