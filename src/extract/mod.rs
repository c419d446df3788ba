pub mod batch;
pub mod categories;
pub mod chain;
pub mod classify;
pub mod orchestrator;
pub mod price;
pub mod strategies;
