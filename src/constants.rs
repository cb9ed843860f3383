// src/constants.rs

/// The name of the directory holding gcli configuration (inside the system config dir).
pub const GCLI_DIR: &str = "gcli";

/// The name of the command declaration file.
pub const CONFIG_FILENAME: &str = "gcli.toml";

/// The default number of predictions a conversion carries.
pub const MAX_PREDICTIONS: usize = 10;

/// Hard ceiling for the configurable prediction cap.
pub const MAX_PREDICTIONS_LIMIT: usize = 20;

/// Maximum edit distance for "did you mean" suggestions.
pub const MAX_CORRECTION_DISTANCE: usize = 2;

/// Name of the synthetic parameter behind the command assignment.
pub const COMMAND_PARAM_NAME: &str = "__command";

/// Name of the synthetic parameter behind unassigned arguments.
pub const UNASSIGNED_PARAM_NAME: &str = "__unassigned";

// Private-use placeholders standing in for escaped delimiters during tokenization.
pub const ESCAPED_SPACE: char = '\u{F000}';
pub const ESCAPED_SINGLE_QUOTE: char = '\u{F001}';
pub const ESCAPED_DOUBLE_QUOTE: char = '\u{F002}';
