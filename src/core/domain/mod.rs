//! Domain types.

mod address;
mod credential;
mod resource;

pub use address::{Address, Origin};
pub use credential::Credential;
pub use resource::{ResourceHandle, ResourceKind};
