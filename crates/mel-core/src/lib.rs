//! Types de base pour melsparse : échelle mel, configuration, matrices denses.

pub mod config;
pub mod matrix;
pub mod scale;
