pub mod combinations;
pub mod price_matrix;
pub mod reconcile;
pub mod variants;

pub use combinations::*;
pub use price_matrix::*;
pub use reconcile::*;
pub use variants::*;
