pub mod column;
pub mod trade;
pub mod schema;

pub use column::*;
pub use trade::*;
pub use schema::*;
