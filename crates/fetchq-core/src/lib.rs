pub mod config;
pub mod logging;

pub mod control;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod job;
pub mod locator;
pub mod queue;
pub mod registry;
pub mod store;
pub mod title;
pub mod tool;
