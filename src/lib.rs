pub mod classify;
pub mod components;
pub mod config;
pub mod error;
pub mod flow;
pub mod shutdown;
pub mod startup;
pub mod utils;
