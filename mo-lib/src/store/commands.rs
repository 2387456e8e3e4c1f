use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parameter::ParameterValue;

/// A parameter change requested through SetParameterValues, awaiting uplink.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub request_id: String,
    pub parameter_id: String,
    pub value: ParameterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    pub queued_at: DateTime<Utc>,
}

/// Commands in the order they were queued. Nothing is ever executed or removed.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Mutex<Vec<Command>>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: Command) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    /// The last `limit` queued commands, oldest first.
    #[must_use]
    pub fn pending(&self, limit: usize) -> Vec<Command> {
        let commands = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        let start = commands.len().saturating_sub(limit);
        commands[start..].to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
