pub mod common;
pub mod desired;
pub mod price;
pub mod product;
pub mod property;
pub mod rate;
pub mod value;

pub use common::*;
pub use desired::*;
pub use price::*;
pub use product::*;
pub use property::*;
pub use rate::*;
pub use value::*;
