//! Process lifetime state shared by the receiver and the MO services.
mod commands;
mod parameters;
mod telemetry;

use std::sync::Arc;

use serde::Serialize;

use crate::spacepacket::Apid;

pub use commands::{Command, CommandQueue};
pub use parameters::ParameterStore;
pub use telemetry::{TelemetryLog, TelemetryRecord};

/// Handles to the shared stores. Cloning shares the same underlying stores.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub parameters: Arc<ParameterStore>,
    pub telemetry: Arc<TelemetryLog>,
    pub commands: Arc<CommandQueue>,
}

/// Point in time summary of the stores.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_packets: usize,
    pub unique_apids: Vec<Apid>,
    pub latest_packet: Option<u16>,
    pub oldest_packet: Option<u16>,
    pub total_parameters: usize,
    pub valid_parameters: usize,
    pub pending_commands: usize,
}

impl Stores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize the stores. Each store is read separately, so the figures may come
    /// from slightly different moments.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let span = self.telemetry.span();
        Statistics {
            total_packets: self.telemetry.count(),
            unique_apids: self.telemetry.apids().into_iter().collect(),
            latest_packet: span.map(|(_, max)| max),
            oldest_packet: span.map(|(min, _)| min),
            total_parameters: self.parameters.len(),
            valid_parameters: self.parameters.count_valid(),
            pending_commands: self.commands.len(),
        }
    }
}
