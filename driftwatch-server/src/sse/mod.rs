//! Server-sent incident event streaming

pub mod registry;

pub use registry::{SubscriptionRegistry, ViewerGuard};
