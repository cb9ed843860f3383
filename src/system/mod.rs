//! # System Interaction Layer
//!
//! The boundary between the parsing engine and the code commands run.
//!
//! ## Modules
//!
//! - **`context`**: The execution context handed to every command, and the
//!   deferred result a command can return when its output arrives later.
//! - **`executor`**: Runs a command's exec function, waits for its result and
//!   records the outcome as a `Report`.

pub mod context;
pub mod executor;
