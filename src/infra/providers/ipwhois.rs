//! ipwho.is adapter.
//!
//! Richest free schema: timezone, connection and (on some plans) security
//! data arrive as nested objects.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{non_empty, normalize_asn, normalize_utc_offset, parse_body, reject, require_address};
use crate::domain::{ExternalServiceError, IpRecord, NetworkType, RecordSource, SecurityFlags};

pub const PROVIDER_NAME: &str = "ipwho.is";
pub const DEFAULT_BASE_URL: &str = "https://ipwho.is";

#[derive(Debug, Deserialize)]
struct IpWhoIsResponse {
    success: Option<bool>,
    message: Option<String>,
    ip: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    postal: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    timezone: Option<Timezone>,
    #[serde(default)]
    connection: Option<Connection>,
    #[serde(default)]
    currency: Option<Currency>,
    #[serde(default)]
    security: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct Timezone {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    utc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Connection {
    #[serde(default)]
    asn: Option<Value>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    isp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Currency {
    #[serde(default)]
    code: Option<String>,
}

pub(super) fn request_url(base_url: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}/", base_url)
    } else {
        format!("{}/{}", base_url, query)
    }
}

pub(super) fn normalize(body: &str, query: &str) -> Result<IpRecord, ExternalServiceError> {
    let response: IpWhoIsResponse = parse_body(PROVIDER_NAME, body)?;

    if response.success == Some(false) {
        return Err(reject(
            PROVIDER_NAME,
            response
                .message
                .unwrap_or_else(|| "success=false".to_string()),
        ));
    }
    let address = require_address(PROVIDER_NAME, response.ip, query)?;

    let timezone = response.timezone.unwrap_or_default();
    let connection = response.connection.unwrap_or_default();
    let security = response.security.map(SecurityFlags::new);

    let organization = non_empty(connection.org);
    let isp = non_empty(connection.isp);
    let hosting = security.as_ref().is_some_and(SecurityFlags::hosting);
    let network_type = NetworkType::classify(
        organization.as_deref().unwrap_or_default(),
        isp.as_deref().unwrap_or_default(),
        false,
        hosting,
    );

    let autonomous_system_number = connection.asn.and_then(|asn| match asn {
        Value::Number(n) => normalize_asn(&n.to_string()),
        Value::String(s) => normalize_asn(&s),
        _ => None,
    });

    Ok(IpRecord {
        address,
        city: response.city.unwrap_or_default(),
        region: response.region.unwrap_or_default(),
        country_name: response.country.unwrap_or_default(),
        country_code: response.country_code.unwrap_or_default(),
        postal_code: non_empty(response.postal),
        latitude: response.latitude.unwrap_or_default(),
        longitude: response.longitude.unwrap_or_default(),
        time_zone_id: timezone.id.unwrap_or_default(),
        utc_offset: normalize_utc_offset(&timezone.utc.unwrap_or_default()),
        currency_code: non_empty(response.currency.and_then(|c| c.code)),
        autonomous_system_number,
        organization,
        isp,
        network_type,
        reverse_hostname: None,
        raw_security_flags: security,
        source: RecordSource::Provider(PROVIDER_NAME.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn google_dns() -> Value {
        json!({
            "ip": "8.8.8.8",
            "success": true,
            "type": "IPv4",
            "country": "United States",
            "country_code": "US",
            "region": "California",
            "city": "Mountain View",
            "latitude": 37.3860517,
            "longitude": -122.0838511,
            "postal": "94039",
            "connection": {"asn": 15169, "org": "Google LLC", "isp": "Google LLC", "domain": "google.com"},
            "timezone": {"id": "America/Los_Angeles", "abbr": "PDT", "utc": "-07:00"},
            "security": {"anonymous": false, "proxy": false, "vpn": false, "tor": false, "hosting": true}
        })
    }

    #[test]
    fn test_nested_fields_are_flattened() {
        let record = normalize(&google_dns().to_string(), "8.8.8.8").unwrap();
        assert_eq!(record.address, "8.8.8.8");
        assert_eq!(record.city, "Mountain View");
        assert_eq!(record.country_code, "US");
        assert_eq!(record.time_zone_id, "America/Los_Angeles");
        assert_eq!(record.utc_offset, "-0700");
        assert_eq!(record.autonomous_system_number.as_deref(), Some("AS15169"));
        assert_eq!(record.organization.as_deref(), Some("Google LLC"));
        assert_eq!(record.network_type, NetworkType::Hosting);
        assert_eq!(record.postal_code.as_deref(), Some("94039"));
        assert!(record.raw_security_flags.unwrap().hosting());
        assert_eq!(record.source, RecordSource::Provider("ipwho.is".into()));
    }

    #[test]
    fn test_missing_optional_objects_default_to_empty() {
        let body = json!({"ip": "203.0.113.5", "success": true}).to_string();
        let record = normalize(&body, "").unwrap();
        assert_eq!(record.city, "");
        assert_eq!(record.utc_offset, "");
        assert_eq!(record.organization, None);
        assert_eq!(record.raw_security_flags, None);
        assert_eq!(record.network_type, NetworkType::Broadband);
    }

    #[test]
    fn test_failure_flag_rejects_before_address_check() {
        let body = json!({"ip": "999.1.1.1", "success": false, "message": "Invalid IP address"});
        let err = normalize(&body.to_string(), "999.1.1.1").unwrap_err();
        assert_eq!(
            err,
            ExternalServiceError::Rejected {
                provider: PROVIDER_NAME,
                reason: "Invalid IP address".into()
            }
        );
    }

    #[test]
    fn test_missing_address_rejects() {
        let body = json!({"success": true, "city": "Nowhere"}).to_string();
        assert!(matches!(
            normalize(&body, ""),
            Err(ExternalServiceError::Rejected { .. })
        ));
    }

    #[test]
    fn test_request_url() {
        assert_eq!(request_url("https://ipwho.is", ""), "https://ipwho.is/");
        assert_eq!(
            request_url("https://ipwho.is", "1.2.3.4"),
            "https://ipwho.is/1.2.3.4"
        );
    }
}
