#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod healthcheck;
pub mod port;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use healthcheck::{healthcheck, healthcheck_with_port};
