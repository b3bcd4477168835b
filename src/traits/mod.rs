//! Core traits for declaring services and their dependencies.

mod dependency;
mod service;

pub use dependency::{Dependencies, Dependency};
pub use service::{Construct, Implements, Service};
