pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, AnatomyConfig};
pub use error::{AnatomyError, ErrorClass, Result};
pub use types::{PartId, SlotCardinality, SlotId, SocketCardinality, SocketOwner};
