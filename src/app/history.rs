//! Recent-lookup list.
//!
//! Most recent first, one entry per address, at most [`HISTORY_CAPACITY`]
//! entries.

use chrono::Local;
use uuid::Uuid;

use crate::domain::{AppError, IpRecord, LookupHistoryEntry, RiskAssessment};

pub const HISTORY_CAPACITY: usize = 50;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CSV_HEADER: [&str; 5] = ["ID", "IP Address", "Timestamp", "Location", "Risk"];

impl LookupHistoryEntry {
    /// Summarize a successful lookup. The id is a time-ordered UUIDv7.
    #[must_use]
    pub fn from_lookup(record: &IpRecord, risk: &RiskAssessment) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            address: record.address.clone(),
            timestamp_display: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            location_summary: record.location_summary(),
            threat_level: risk.threat_level,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupHistory {
    entries: Vec<LookupHistoryEntry>,
}

impl LookupHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries, enforcing dedup and the cap.
    #[must_use]
    pub fn from_entries(entries: Vec<LookupHistoryEntry>) -> Self {
        let mut history = Self::new();
        // Oldest first, so the newest duplicate wins and ends at the head.
        for entry in entries.into_iter().rev() {
            history.record(entry);
        }
        history
    }

    /// Insert at the head, dropping any older entry for the same address and
    /// anything beyond the cap.
    pub fn record(&mut self, entry: LookupHistoryEntry) {
        self.entries.retain(|e| e.address != entry.address);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LookupHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose address contains `term`, or whose location contains it
    /// case-insensitively. A blank term matches everything.
    #[must_use]
    pub fn filter(&self, term: &str) -> Vec<&LookupHistoryEntry> {
        let term = term.trim();
        let lowered = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.address.contains(term) || e.location_summary.to_lowercase().contains(&lowered)
            })
            .collect()
    }

    /// Export every entry as CSV.
    pub fn to_csv(&self) -> Result<String, AppError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(CSV_HEADER)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        for entry in &self.entries {
            writer
                .write_record([
                    entry.id.as_str(),
                    entry.address.as_str(),
                    entry.timestamp_display.as_str(),
                    entry.location_summary.as_str(),
                    entry.threat_level.as_str(),
                ])
                .map_err(|e| AppError::Serialization(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Serialization(e.to_string()))
    }
}
