pub mod runtime;
pub mod manager;

pub use runtime::*;
pub use manager::*;
