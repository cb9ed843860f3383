// src/cli/handlers/mod.rs

pub mod check;
pub mod commons;
pub mod exec;
pub mod list;
pub mod repl;
