pub mod action;
pub mod app;
pub mod cli;
pub mod drag;
pub mod editor;
pub mod execution;
pub mod features;
pub mod models;
pub mod plan;
pub mod preview;
pub mod squash;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
