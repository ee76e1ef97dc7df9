pub mod fallback;
mod flowchart;
mod sanitize;

pub use fallback::generate_fallback;
pub use flowchart::*;
pub use sanitize::*;
