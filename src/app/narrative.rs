//! Narrative enrichment, decoupled from the lookup result.
//!
//! [`NarrativeService::spawn`] starts generation on the runtime and returns
//! immediately. The caller shows the lookup right away and awaits the
//! [`NarrativeHandle`] separately; a failure there never touches the result
//! it describes.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{IpRecord, NarrativeGenerator, RiskAssessment};

/// Final state of one enrichment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    Ready(String),
    /// Enrichment could not be produced; carries the reason
    Unavailable(String),
}

/// Pending enrichment
#[derive(Debug)]
pub struct NarrativeHandle {
    task: JoinHandle<NarrativeOutcome>,
}

impl NarrativeHandle {
    /// Wait for the narrative. A panicked or cancelled task reads as unavailable.
    pub async fn outcome(self) -> NarrativeOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Narrative task did not complete");
                NarrativeOutcome::Unavailable(format!("enrichment task failed: {}", e))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Build the analyst prompt from already computed fields.
#[must_use]
pub fn build_prompt(record: &IpRecord, risk: &RiskAssessment) -> String {
    let organization = record.organization.as_deref().unwrap_or("Unknown");
    let asn = record.autonomous_system_number.as_deref().unwrap_or("Unknown");
    format!(
        "Act as a senior cybersecurity analyst. Analyze the following IP intelligence data and \
         provide a concise security summary (2-3 paragraphs) including:\n\
         1. Geopolitical context of the location ({city}, {country}).\n\
         2. Network analysis for {org} (ASN: {asn}).\n\
         3. Potential risks based on a risk score of {score}/100 and threat level {level}.\n\
         4. Actionable recommendations for a user interacting with this IP.\n\
         \n\
         Data:\n\
         - IP: {ip}\n\
         - ISP/Org: {org}\n\
         - Security: Hosting={hosting}, VPN={vpn}, Proxy={proxy}, Tor={tor}\n\
         - Location: Lat {lat}, Long {lon}\n",
        city = record.city,
        country = record.country_name,
        org = organization,
        asn = asn,
        score = risk.risk_score,
        level = risk.threat_level,
        ip = record.address,
        hosting = risk.is_hosting,
        vpn = risk.is_vpn,
        proxy = risk.is_proxy,
        tor = risk.is_tor,
        lat = record.latitude,
        lon = record.longitude,
    )
}

#[derive(Clone)]
pub struct NarrativeService {
    generator: Arc<dyn NarrativeGenerator>,
}

impl NarrativeService {
    pub fn new(generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self { generator }
    }

    /// Start generation in the background. Must be called inside a Tokio runtime.
    pub fn spawn(&self, record: &IpRecord, risk: &RiskAssessment) -> NarrativeHandle {
        let prompt = build_prompt(record, risk);
        let generator = Arc::clone(&self.generator);
        let address = record.address.clone();

        let task = tokio::spawn(async move {
            match generator.generate(&prompt).await {
                Ok(text) => {
                    debug!(address = %address, chars = text.len(), "Narrative ready");
                    NarrativeOutcome::Ready(text)
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Narrative enrichment unavailable");
                    NarrativeOutcome::Unavailable(e.to_string())
                }
            }
        });

        NarrativeHandle { task }
    }
}
