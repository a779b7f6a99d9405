//! Shared library surface for the aspect server and its tests.

pub mod api;
pub mod config;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod state;
