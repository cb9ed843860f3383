// src/core/mod.rs

pub mod argument;
pub mod assignment;
pub mod canon;
pub mod config_loader;
pub mod conversion;
pub mod interpolator;
pub mod parameters;
pub mod requisition;
pub mod tokenizer;
pub mod types;
