pub mod client;
pub mod diff;
pub mod engine;
pub mod indexer;
pub mod lifecycle;
pub mod mapping;
#[cfg(test)]
pub(crate) mod mock;
pub mod model;
pub mod poller;
