pub mod audit;
pub mod decision;
pub mod diff;
pub mod entry;
pub mod error;
pub mod executor;
pub mod gate;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod registry;
pub mod stats;
pub mod tags;
pub mod types;

pub use error::{PublishError, Result};
