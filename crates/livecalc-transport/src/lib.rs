pub mod client;
pub mod error;

pub use client::{HttpResponse, HttpTransport};
pub use error::TransportError;
