pub mod engine;

pub use engine::{EngineConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_TRIES, MAX_BATCH_SIZE};
