// src/system/context.rs

use anyhow::{Result, anyhow};
use serde_json::Value;
use std::{collections::HashMap, fmt, path::PathBuf};
use tokio::sync::oneshot;

/// The capability bag handed to every command's exec function.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    /// The input the command was parsed from.
    pub typed: String,
}

impl ExecutionContext {
    /// A context for the current process: its working directory and environment.
    pub fn from_process(typed: impl Into<String>) -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_default(),
            env: std::env::vars().collect(),
            typed: typed.into(),
        }
    }

    /// Creates a pending result. The exec function returns the `Pending` half
    /// and resolves the `Deferred` half later, from anywhere.
    pub fn defer(&self) -> (Deferred, Pending) {
        let (sender, receiver) = oneshot::channel();
        (Deferred { sender }, Pending { receiver })
    }
}

type Outcome = std::result::Result<Value, String>;

/// The resolving side of a pending result.
#[derive(Debug)]
pub struct Deferred {
    sender: oneshot::Sender<Outcome>,
}

impl Deferred {
    pub fn resolve(self, value: Value) {
        if self.sender.send(Ok(value)).is_err() {
            log::debug!("Deferred result resolved after its receiver was dropped");
        }
    }

    pub fn reject(self, message: impl Into<String>) {
        if self.sender.send(Err(message.into())).is_err() {
            log::debug!("Deferred result rejected after its receiver was dropped");
        }
    }
}

/// The awaiting side of a pending result.
#[derive(Debug)]
pub struct Pending {
    receiver: oneshot::Receiver<Outcome>,
}

impl Pending {
    /// Waits for the result. A rejection, or a `Deferred` dropped without
    /// resolving, becomes an error.
    pub async fn wait(self) -> Result<Value> {
        match self.receiver.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(anyhow!(message)),
            Err(_) => Err(anyhow!("Deferred result was dropped before it was resolved.")),
        }
    }
}

/// What an exec function hands back.
pub enum Reply {
    Value(Value),
    Pending(Pending),
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Pending> for Reply {
    fn from(pending: Pending) -> Self {
        Self::Pending(pending)
    }
}

impl Reply {
    /// Resolves the reply to its final value.
    pub async fn into_value(self) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Pending(pending) => pending.wait().await,
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_deferred_resolves_later() {
        let ctx = ExecutionContext::default();
        let (deferred, pending) = ctx.defer();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            deferred.resolve(json!("done"));
        });
        assert_eq!(pending.wait().await.unwrap(), json!("done"));
    }

    #[tokio::test]
    async fn test_rejected_and_dropped_results_are_errors() {
        let ctx = ExecutionContext::default();

        let (deferred, pending) = ctx.defer();
        deferred.reject("boom");
        assert_eq!(pending.wait().await.unwrap_err().to_string(), "boom");

        let (deferred, pending) = ctx.defer();
        drop(deferred);
        assert!(pending.wait().await.unwrap_err().to_string().contains("dropped"));
    }

    #[tokio::test]
    async fn test_reply_into_value() {
        let reply = Reply::from(json!(3));
        assert_eq!(reply.into_value().await.unwrap(), json!(3));
    }

    #[test]
    fn test_process_context_has_environment() {
        let ctx = ExecutionContext::from_process("echo hi");
        assert_eq!(ctx.typed, "echo hi");
        assert!(!ctx.env.is_empty());
    }
}
