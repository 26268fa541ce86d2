//! Shared host state.

mod store;

pub use store::HostState;
