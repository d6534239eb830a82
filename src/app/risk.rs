//! Heuristic risk scoring.
//!
//! Additive weights over four provider indicators, clamped to 0..=100, then
//! bucketed into a [`ThreatLevel`]. Pure and total: no I/O, no state.
//!
//! The weights and breakpoints are tunable prototype values, not derived
//! from a documented risk model.

use crate::domain::{IpRecord, RiskAssessment, SecurityFlags, ThreatLevel};

pub const VPN_WEIGHT: u32 = 35;
pub const PROXY_WEIGHT: u32 = 25;
pub const TOR_WEIGHT: u32 = 50;
pub const HOSTING_WEIGHT: u32 = 20;

pub const MAX_SCORE: u32 = 100;

/// Scores above this are Critical
pub const CRITICAL_ABOVE: u8 = 75;
/// Scores above this are at least High
pub const HIGH_ABOVE: u8 = 45;
/// Scores above this are at least Medium
pub const MEDIUM_ABOVE: u8 = 15;
/// Scores above this are reported as blacklisted
pub const BLACKLIST_ABOVE: u8 = 80;

/// Fixed score for a record from own-address discovery, whose flags are unknown
pub const RESTRICTED_SCORE: u8 = 10;

/// The four indicators the scorer consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RiskSignals {
    pub vpn: bool,
    pub proxy: bool,
    pub tor: bool,
    pub hosting: bool,
}

impl From<&SecurityFlags> for RiskSignals {
    fn from(flags: &SecurityFlags) -> Self {
        Self {
            vpn: flags.vpn(),
            proxy: flags.proxy(),
            tor: flags.tor(),
            hosting: flags.hosting(),
        }
    }
}

/// Assess a lookup result.
#[must_use]
pub fn score(record: &IpRecord) -> RiskAssessment {
    if record.is_restricted() {
        return RiskAssessment {
            risk_score: RESTRICTED_SCORE,
            threat_level: threat_level(RESTRICTED_SCORE),
            is_blacklisted: is_blacklisted(RESTRICTED_SCORE),
            ..Default::default()
        };
    }

    let signals = record
        .raw_security_flags
        .as_ref()
        .map(RiskSignals::from)
        .unwrap_or_default();
    score_signals(signals)
}

/// Assess a set of indicators directly.
#[must_use]
pub fn score_signals(signals: RiskSignals) -> RiskAssessment {
    let weighted = [
        (signals.vpn, VPN_WEIGHT),
        (signals.proxy, PROXY_WEIGHT),
        (signals.tor, TOR_WEIGHT),
        (signals.hosting, HOSTING_WEIGHT),
    ];
    let raw: u32 = weighted
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, weight)| weight)
        .sum();
    // Clamped to MAX_SCORE, so the narrowing cannot truncate.
    let risk_score = raw.min(MAX_SCORE) as u8;

    RiskAssessment {
        is_proxy: signals.proxy,
        is_vpn: signals.vpn,
        is_tor: signals.tor,
        is_hosting: signals.hosting,
        is_blacklisted: is_blacklisted(risk_score),
        risk_score,
        threat_level: threat_level(risk_score),
    }
}

/// Step function from score to level; each band includes its upper bound.
#[must_use]
pub fn threat_level(score: u8) -> ThreatLevel {
    if score > CRITICAL_ABOVE {
        ThreatLevel::Critical
    } else if score > HIGH_ABOVE {
        ThreatLevel::High
    } else if score > MEDIUM_ABOVE {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

#[must_use]
pub fn is_blacklisted(score: u8) -> bool {
    score > BLACKLIST_ABOVE
}
