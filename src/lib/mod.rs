//! Shared library modules providing error types, environment access, file utilities and telemetry.

pub mod env;
pub mod errors;
pub mod fs;
pub mod leet;
pub mod paths;
pub mod process;
pub mod telemetry;
