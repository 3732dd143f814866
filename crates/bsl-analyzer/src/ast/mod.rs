pub mod build;
pub mod nodes;
pub mod walk;

pub use nodes::*;
