// src/system/executor.rs

use crate::{
    core::canon::{Command, Exec},
    system::context::ExecutionContext,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, SystemTime},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecError {
    #[error("Unknown command: '{0}'.")]
    UnknownCommand(String),
    #[error("Command '{0}' is a group and cannot be executed.")]
    NotExecutable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// The record of one execution. Failures are recorded too, with `error` set
/// and the error text as output.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub command: String,
    pub args: Map<String, Value>,
    /// What the user typed.
    pub typed: String,
    /// The normalized form of the input.
    pub canonical: String,
    pub error: bool,
    pub output: Value,
    pub start: SystemTime,
    pub end: SystemTime,
    pub duration: Duration,
}

/// Reports of past executions, oldest first.
#[derive(Debug, Default)]
pub struct ReportLog {
    reports: Mutex<Vec<Report>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, report: Report) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }

    pub fn all(&self) -> Vec<Report> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Runs a command's exec function and waits for its (possibly deferred) result.
///
/// # Logic:
/// - Functional commands receive their values positionally, in declaration order.
/// - An `Err` from the exec function, or a rejected deferred result, does not
///   propagate: it becomes a report with `error` set.
/// - Group commands have nothing to run and are rejected before this point.
pub async fn execute(
    command: &Command,
    args: Map<String, Value>,
    ctx: &ExecutionContext,
    canonical: String,
) -> Result<Report, ExecError> {
    let exec = command
        .exec
        .as_ref()
        .ok_or_else(|| ExecError::NotExecutable(command.name.clone()))?;

    log::info!("Executing '{}'", canonical);
    let start = SystemTime::now();
    let timer = std::time::Instant::now();

    let reply = match exec {
        Exec::Args(run) => run(&args, ctx),
        Exec::Functional(run) => {
            let values: Vec<Value> = command
                .params
                .iter()
                .map(|p| args.get(p.name()).cloned().unwrap_or(Value::Null))
                .collect();
            run(&values, ctx)
        }
    };
    let outcome = match reply {
        Ok(reply) => reply.into_value().await,
        Err(e) => Err(e),
    };

    let (error, output) = match outcome {
        Ok(value) => (false, value),
        Err(e) => {
            log::warn!("Command '{}' failed: {:#}", command.name, e);
            (true, Value::String(format!("{:#}", e)))
        }
    };
    let duration = timer.elapsed();
    log::debug!("Command '{}' finished in {:?}", command.name, duration);

    Ok(Report {
        id: Uuid::new_v4(),
        command: command.name.clone(),
        args,
        typed: ctx.typed.clone(),
        canonical,
        error,
        output,
        start,
        end: SystemTime::now(),
        duration,
    })
}

// MARK: --- UNIT TESTS ---
