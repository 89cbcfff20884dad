pub mod builders;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod filter;
pub mod informer;
pub mod observer;
pub mod owner;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use crd::{FrontendPage, FrontendPageSpec, FrontendPageStatus};
pub use error::Error;
