pub mod batch;
pub mod compat;
pub mod config;
pub mod logging;
pub mod output;
pub mod provider;
