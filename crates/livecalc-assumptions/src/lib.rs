pub mod attrs;
pub mod error;
pub mod local;
pub mod resolver;

pub use attrs::AttrValue;
pub use error::ResolutionError;
pub use resolver::AssumptionResolver;
