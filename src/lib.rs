pub mod commands;
pub mod config;
pub mod error;
pub mod materialize;
pub mod package;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod specifier;
