//! Middleware for the health server

pub mod logging;
