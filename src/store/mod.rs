pub mod memory;
pub mod postgres;
pub mod rate_cache;
pub mod traits;

pub use memory::*;
pub use postgres::*;
pub use rate_cache::*;
pub use traits::*;
