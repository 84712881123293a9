pub mod buffer;
pub mod credentials;
pub mod engine;
pub mod error;

pub use credentials::Credentials;
pub use engine::{Engine, EngineConfig, EngineInfo, EngineLifecycle, EngineState, ProjectionEngine, TableRef};
pub use error::OrchestratorError;
