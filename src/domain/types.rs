//! Domain types for IP intelligence lookups.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder written into geographic and organization fields of a record
/// produced by own-address discovery, where no enrichment was available.
pub const RESTRICTED_PLACEHOLDER: &str = "Restricted (enrichment blocked)";

/// Coarse classification of the network an address belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NetworkType {
    Mobile,
    #[default]
    Broadband,
    Hosting,
    Corporate,
}

const HOSTING_KEYWORDS: &[&str] = &[
    "hosting",
    "server",
    "cloud",
    "datacenter",
    "data center",
    "amazon",
    "google",
    "microsoft",
    "digitalocean",
    "ovh",
    "hetzner",
    "linode",
];

const CORPORATE_KEYWORDS: &[&str] = &[
    "corporation",
    "enterprise",
    "bank",
    "university",
    "government",
];

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Broadband => "Broadband",
            Self::Hosting => "Hosting",
            Self::Corporate => "Corporate",
        }
    }

    /// Classify from explicit provider signals first, then the names of the
    /// owning organization and ISP.
    #[must_use]
    pub fn classify(organization: &str, isp: &str, mobile: bool, hosting: bool) -> Self {
        if mobile {
            return Self::Mobile;
        }
        if hosting {
            return Self::Hosting;
        }
        let names = format!("{} {}", organization, isp).to_lowercase();
        if HOSTING_KEYWORDS.iter().any(|k| names.contains(k)) {
            Self::Hosting
        } else if CORPORATE_KEYWORDS.iter().any(|k| names.contains(k)) {
            Self::Corporate
        } else {
            Self::Broadband
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discrete threat classification derived from a risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::str::FromStr for ThreatLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid threat level: {}", s)),
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provider's own security classification, carried through unmodified.
///
/// Providers disagree on key naming (`vpn` vs `is_vpn`), so lookups accept
/// both. Anything that is not a JSON boolean reads as `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct SecurityFlags(Map<String, Value>);

impl SecurityFlags {
    #[must_use]
    pub fn new(raw: Map<String, Value>) -> Self {
        Self(raw)
    }

    /// Read one boolean indicator; absent means `false`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.0
            .get(name)
            .or_else(|| self.0.get(&format!("is_{}", name)))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn vpn(&self) -> bool {
        self.flag("vpn")
    }

    #[must_use]
    pub fn proxy(&self) -> bool {
        self.flag("proxy")
    }

    #[must_use]
    pub fn tor(&self) -> bool {
        self.flag("tor")
    }

    #[must_use]
    pub fn hosting(&self) -> bool {
        self.flag("hosting")
    }
}

/// Where a record came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum RecordSource {
    /// A full enrichment provider answered
    Provider(String),
    /// Only the bare address was discovered; enrichment was unavailable
    SelfDiscovery(String),
}

impl Default for RecordSource {
    fn default() -> Self {
        Self::Provider(String::new())
    }
}

/// Canonical, provider-agnostic lookup result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IpRecord {
    pub address: String,
    pub city: String,
    pub region: String,
    pub country_name: String,
    pub country_code: String,
    pub postal_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub time_zone_id: String,
    pub utc_offset: String,
    pub currency_code: Option<String>,
    pub autonomous_system_number: Option<String>,
    pub organization: Option<String>,
    pub isp: Option<String>,
    pub network_type: NetworkType,
    pub reverse_hostname: Option<String>,
    /// Provider security object, consumed by the risk scorer only and never
    /// written out
    #[serde(default, skip_serializing)]
    pub raw_security_flags: Option<SecurityFlags>,
    pub source: RecordSource,
}

impl IpRecord {
    /// Minimal record for an address found by own-address discovery.
    #[must_use]
    pub fn restricted(address: String, service: &str) -> Self {
        Self {
            address,
            city: RESTRICTED_PLACEHOLDER.to_string(),
            region: RESTRICTED_PLACEHOLDER.to_string(),
            country_name: RESTRICTED_PLACEHOLDER.to_string(),
            organization: Some(RESTRICTED_PLACEHOLDER.to_string()),
            isp: Some(RESTRICTED_PLACEHOLDER.to_string()),
            source: RecordSource::SelfDiscovery(service.to_string()),
            ..Default::default()
        }
    }

    /// True for the minimal own-address record.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        matches!(self.source, RecordSource::SelfDiscovery(_))
    }

    /// "City, Country" summary, with a fallback when both are unknown
    #[must_use]
    pub fn location_summary(&self) -> String {
        match (self.city.is_empty(), self.country_name.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.country_name),
            (false, true) => self.city.clone(),
            (true, false) => self.country_name.clone(),
            (true, true) => "Unknown location".to_string(),
        }
    }
}

/// Derived security assessment of one record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RiskAssessment {
    pub is_proxy: bool,
    pub is_vpn: bool,
    pub is_tor: bool,
    pub is_hosting: bool,
    pub is_blacklisted: bool,
    pub risk_score: u8,
    pub threat_level: ThreatLevel,
}

/// Audit trail summary of one successful lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupHistoryEntry {
    pub id: String,
    pub address: String,
    pub timestamp_display: String,
    pub location_summary: String,
    pub threat_level: ThreatLevel,
}

/// Form factor inferred from screen width
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeviceType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceType {
    #[must_use]
    pub fn from_screen_width(width: u32) -> Self {
        if width < 768 {
            Self::Mobile
        } else if width < 1024 {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Tablet => "Tablet",
            Self::Desktop => "Desktop",
        }
    }
}

/// Description of the client device performing a lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub browser: String,
    pub os: String,
    pub device_type: DeviceType,
    pub resolution: String,
    pub user_agent: String,
    pub language: String,
}
