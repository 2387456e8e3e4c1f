use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spacepacket::{Apid, Integrity, Packet, Payload, PrimaryHeader, SecondaryHeader};
use crate::{Error, Result};

/// A decoded packet as kept by the [TelemetryLog].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub sequence_count: u16,
    pub header: PrimaryHeader,
    pub secondary_header: Option<SecondaryHeader>,
    /// Decoded telemetry document, or `{"raw": <hex>}`.
    pub telemetry: Payload,
    pub integrity: Integrity,
    /// Size of the datagram in bytes.
    pub size: usize,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SocketAddr>,
}

impl TelemetryRecord {
    #[must_use]
    pub fn new(packet: Packet, size: usize, source: Option<SocketAddr>) -> Self {
        Self {
            sequence_count: packet.header.sequence_count,
            header: packet.header,
            secondary_header: packet.secondary_header,
            telemetry: packet.payload,
            integrity: packet.integrity,
            size,
            received_at: Utc::now(),
            source,
        }
    }
}

/// Most recent packet for each sequence count.
///
/// Sequence counts wrap at 16384, so a later packet with the same count replaces the
/// earlier one. This is a snapshot cache of recent telemetry, not an append log.
#[derive(Debug, Default)]
pub struct TelemetryLog {
    records: RwLock<HashMap<u16, TelemetryRecord>>,
}

impl TelemetryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record`, returning the record it replaced, if any.
    pub fn insert(&self, record: TelemetryRecord) -> Option<TelemetryRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.sequence_count, record)
    }

    /// # Errors
    /// [Error::TelemetryNotFound] if no packet with `sequence_count` has been stored.
    pub fn get(&self, sequence_count: u16) -> Result<TelemetryRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&sequence_count)
            .cloned()
            .ok_or(Error::TelemetryNotFound(sequence_count))
    }

    /// Record with the highest sequence count.
    #[must_use]
    pub fn latest(&self) -> Option<TelemetryRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .max_by_key(|(seq, _)| **seq)
            .map(|(_, rec)| rec.clone())
    }

    /// Up to `limit` records, highest sequence count first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<TelemetryRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut seqs: Vec<u16> = records.keys().copied().collect();
        seqs.sort_unstable_by(|a, b| b.cmp(a));
        seqs.into_iter()
            .take(limit)
            .filter_map(|seq| records.get(&seq).cloned())
            .collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Distinct APIDs among stored packets.
    #[must_use]
    pub fn apids(&self) -> BTreeSet<Apid> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().map(|rec| rec.header.apid).collect()
    }

    /// Lowest and highest stored sequence counts.
    #[must_use]
    pub fn span(&self) -> Option<(u16, u16)> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let min = records.keys().min()?;
        let max = records.keys().max()?;
        Some((*min, *max))
    }
}
