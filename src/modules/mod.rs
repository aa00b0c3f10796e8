pub mod agent;
pub mod config;
pub mod conflict;
pub mod error;
pub mod event;
pub mod grid;
pub mod skeleton;
pub mod stats;
pub mod world;
