//! Application service running one full lookup cycle.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::{
    AppError, DeviceInfo, DeviceInfoProvider, HistoryStore, IpRecord, LookupError,
    LookupHistoryEntry, RiskAssessment,
};

use super::history::LookupHistory;
use super::lookup_service::LookupService;
use super::narrative::{NarrativeHandle, NarrativeService};
use super::risk;

/// Everything produced by one successful lookup
#[derive(Debug)]
pub struct LookupReport {
    pub record: IpRecord,
    pub risk: RiskAssessment,
    pub device: DeviceInfo,
    /// Pending enrichment, `None` when no narrative service is attached
    pub narrative: Option<NarrativeHandle>,
}

/// Application service: resolve, score, record history, start enrichment
pub struct AppService {
    lookup: LookupService,
    history_store: Arc<dyn HistoryStore>,
    device_info: Arc<dyn DeviceInfoProvider>,
    narrative: Option<NarrativeService>,
}

impl AppService {
    #[must_use]
    pub fn new(
        lookup: LookupService,
        history_store: Arc<dyn HistoryStore>,
        device_info: Arc<dyn DeviceInfoProvider>,
    ) -> Self {
        Self {
            lookup,
            history_store,
            device_info,
            narrative: None,
        }
    }

    /// Attach narrative enrichment (builder pattern)
    #[must_use]
    pub fn with_narrative(mut self, narrative: NarrativeService) -> Self {
        self.narrative = Some(narrative);
        self
    }

    /// Run one lookup cycle.
    ///
    /// Only the terminal lookup errors fail the cycle. A history write
    /// failure is logged and the report is still returned.
    #[instrument(skip(self), fields(query = ?query))]
    pub async fn lookup(&self, query: Option<&str>) -> Result<LookupReport, LookupError> {
        let record = self.lookup.resolve(query).await?;
        let risk = risk::score(&record);
        let device = self.device_info.device_info();

        info!(
            address = %record.address,
            risk_score = risk.risk_score,
            threat_level = %risk.threat_level,
            restricted = record.is_restricted(),
            "Lookup complete"
        );

        let entry = LookupHistoryEntry::from_lookup(&record, &risk);
        if let Err(e) = self.record_history(entry).await {
            warn!(error = %e, "Failed to record lookup history, continuing");
        }

        let narrative = self
            .narrative
            .as_ref()
            .map(|service| service.spawn(&record, &risk));

        Ok(LookupReport {
            record,
            risk,
            device,
            narrative,
        })
    }

    /// Current history, most recent first
    pub async fn history(&self) -> Result<LookupHistory, AppError> {
        let entries = self.history_store.load().await?;
        Ok(LookupHistory::from_entries(entries))
    }

    pub async fn clear_history(&self) -> Result<(), AppError> {
        self.history_store.clear().await?;
        info!("Lookup history cleared");
        Ok(())
    }

    async fn record_history(&self, entry: LookupHistoryEntry) -> Result<(), AppError> {
        let mut history = self.history().await?;
        history.record(entry);
        self.history_store.save(history.entries()).await
    }
}
