pub mod date_filter;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use date_filter::*;
pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use store::*;
pub use types::*;
