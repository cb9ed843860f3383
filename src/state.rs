// src/state.rs

use crate::{
    constants::{MAX_PREDICTIONS, MAX_PREDICTIONS_LIMIT},
    core::{
        canon::Canon,
        types::{CommandType, Type, Types},
    },
    models::Settings,
    system::executor::ReportLog,
};
use std::sync::Arc;

/// Everything a requisition resolves against: the type and command
/// registries, the report log and the engine settings.
///
/// Shared behind an `Arc`; the registries use interior locking so commands
/// can be registered while requisitions are alive.
#[derive(Debug)]
pub struct System {
    types: Types,
    canon: Arc<Canon>,
    command_type: Arc<CommandType>,
    reports: ReportLog,
    settings: Settings,
}

impl System {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let canon = Arc::new(Canon::new());
        Self {
            types: Types::new(),
            command_type: Arc::new(CommandType::new(canon.clone())),
            canon,
            reports: ReportLog::new(),
            settings,
        }
    }

    pub fn types(&self) -> &Types {
        &self.types
    }

    pub fn canon(&self) -> &Arc<Canon> {
        &self.canon
    }

    /// The type resolving the command part of the input.
    pub fn command_type(&self) -> Arc<dyn Type> {
        self.command_type.clone()
    }

    pub fn reports(&self) -> &ReportLog {
        &self.reports
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Predictions per conversion, never above `MAX_PREDICTIONS_LIMIT`.
    pub fn max_predictions(&self) -> usize {
        self.settings
            .max_predictions
            .unwrap_or(MAX_PREDICTIONS)
            .min(MAX_PREDICTIONS_LIMIT)
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

// MARK: --- UNIT TESTS ---
