//! imghost - a minimal image hosting service
//!
//! Uploads arrive as `multipart/form-data`, are stored on the filesystem under
//! a generated identifier and are served back through a view page and a raw
//! pass-through.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod render;
pub mod routing;
pub mod server;
pub mod storage;
