//! Shared types used across the controller, the model clients and the tools.

pub mod message;
pub mod tool;
