// Protocol module - TeamCity service message wire format

pub mod escape;
pub mod message;

pub use escape::escape;
pub use message::{MessageName, ServiceMessage};
