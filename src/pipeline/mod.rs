pub(crate) mod checkpoint;
pub(crate) mod config;
pub(crate) mod orchestrator;
pub(crate) mod progress;
pub(crate) mod report;
