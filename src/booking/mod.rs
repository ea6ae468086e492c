pub mod driver;
pub mod orchestrator;
pub mod strategy;
