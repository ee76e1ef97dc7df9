mod client;
pub mod generator;
mod types;

pub use client::*;
pub use generator::{Generation, GenerationSource, Locale, generate_flowchart};
pub use types::*;
