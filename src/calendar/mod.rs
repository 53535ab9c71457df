pub mod aggregate;
pub mod service;

pub use aggregate::*;
pub use service::*;
