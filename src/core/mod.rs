pub mod error;
pub mod ids;

pub use error::{AdminError, Result};
pub use ids::{DatabaseId, PeerId, ServerId, TableId};
