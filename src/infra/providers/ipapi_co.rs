//! ipapi.co adapter. Simplest schema, no security data.

use serde::Deserialize;

use super::{non_empty, normalize_asn, normalize_utc_offset, parse_body, reject, require_address};
use crate::domain::{ExternalServiceError, IpRecord, NetworkType, RecordSource};

pub const PROVIDER_NAME: &str = "ipapi.co";
pub const DEFAULT_BASE_URL: &str = "https://ipapi.co";

#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    ip: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    postal: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    utc_offset: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    asn: Option<String>,
    #[serde(default)]
    org: Option<String>,
}

pub(super) fn request_url(base_url: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}/json/", base_url)
    } else {
        format!("{}/{}/json/", base_url, query)
    }
}

pub(super) fn normalize(body: &str, query: &str) -> Result<IpRecord, ExternalServiceError> {
    let response: IpApiCoResponse = parse_body(PROVIDER_NAME, body)?;

    if response.error {
        return Err(reject(
            PROVIDER_NAME,
            response.reason.unwrap_or_else(|| "error=true".to_string()),
        ));
    }
    let address = require_address(PROVIDER_NAME, response.ip, query)?;

    let organization = non_empty(response.org);
    let network_type =
        NetworkType::classify(organization.as_deref().unwrap_or_default(), "", false, false);

    Ok(IpRecord {
        address,
        city: response.city.unwrap_or_default(),
        region: response.region.unwrap_or_default(),
        country_name: response.country_name.unwrap_or_default(),
        country_code: response.country_code.unwrap_or_default(),
        postal_code: non_empty(response.postal),
        latitude: response.latitude.unwrap_or_default(),
        longitude: response.longitude.unwrap_or_default(),
        time_zone_id: response.timezone.unwrap_or_default(),
        utc_offset: normalize_utc_offset(&response.utc_offset.unwrap_or_default()),
        currency_code: non_empty(response.currency),
        autonomous_system_number: response.asn.as_deref().and_then(normalize_asn),
        // ipapi.co reports a single organization name; it doubles as the ISP.
        isp: organization.clone(),
        organization,
        network_type,
        reverse_hostname: None,
        raw_security_flags: None,
        source: RecordSource::Provider(PROVIDER_NAME.to_string()),
    })
}
