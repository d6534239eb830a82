//! ip-api.com adapter.
//!
//! Flat camelCase schema selected with the `fields` parameter. The free
//! endpoint is plain HTTP only.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{non_empty, normalize_asn, parse_body, reject, require_address, utc_offset_from_seconds};
use crate::domain::{ExternalServiceError, IpRecord, NetworkType, RecordSource, SecurityFlags};

pub const PROVIDER_NAME: &str = "ip-api.com";
pub const DEFAULT_BASE_URL: &str = "http://ip-api.com";

const FIELDS: &str = "status,message,query,country,countryCode,regionName,city,zip,lat,lon,\
                      timezone,offset,currency,isp,org,as,reverse,mobile,proxy,hosting";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    query: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    zip: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default, rename = "as")]
    autonomous_system: Option<String>,
    #[serde(default)]
    reverse: Option<String>,
    #[serde(default)]
    mobile: Option<bool>,
    #[serde(default)]
    proxy: Option<bool>,
    #[serde(default)]
    hosting: Option<bool>,
}

impl IpApiResponse {
    /// The provider's own flags, exactly as reported
    fn security_flags(&self) -> Option<SecurityFlags> {
        let mut raw = Map::new();
        for (key, value) in [
            ("proxy", self.proxy),
            ("hosting", self.hosting),
            ("mobile", self.mobile),
        ] {
            if let Some(value) = value {
                raw.insert(key.to_string(), Value::Bool(value));
            }
        }
        (!raw.is_empty()).then(|| SecurityFlags::new(raw))
    }
}

pub(super) fn request_url(base_url: &str, query: &str) -> String {
    format!("{}/json/{}?fields={}", base_url, query, FIELDS)
}

pub(super) fn normalize(body: &str, query: &str) -> Result<IpRecord, ExternalServiceError> {
    let response: IpApiResponse = parse_body(PROVIDER_NAME, body)?;

    if response.status.as_deref() == Some("fail") {
        return Err(reject(
            PROVIDER_NAME,
            response
                .message
                .clone()
                .unwrap_or_else(|| "status=fail".to_string()),
        ));
    }
    let security = response.security_flags();
    let address = require_address(PROVIDER_NAME, response.query, query)?;

    let organization = non_empty(response.org);
    let isp = non_empty(response.isp);
    let network_type = NetworkType::classify(
        organization.as_deref().unwrap_or_default(),
        isp.as_deref().unwrap_or_default(),
        response.mobile.unwrap_or(false),
        response.hosting.unwrap_or(false),
    );

    Ok(IpRecord {
        address,
        city: response.city.unwrap_or_default(),
        region: response.region_name.unwrap_or_default(),
        country_name: response.country.unwrap_or_default(),
        country_code: response.country_code.unwrap_or_default(),
        postal_code: non_empty(response.zip),
        latitude: response.lat.unwrap_or_default(),
        longitude: response.lon.unwrap_or_default(),
        time_zone_id: response.timezone.unwrap_or_default(),
        utc_offset: response
            .offset
            .map(utc_offset_from_seconds)
            .unwrap_or_default(),
        currency_code: non_empty(response.currency),
        autonomous_system_number: response
            .autonomous_system
            .as_deref()
            .and_then(normalize_asn),
        organization,
        isp,
        network_type,
        reverse_hostname: non_empty(response.reverse),
        raw_security_flags: security,
        source: RecordSource::Provider(PROVIDER_NAME.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_schema_mapping() {
        let body = json!({
            "status": "success",
            "query": "1.1.1.1",
            "country": "Australia",
            "countryCode": "AU",
            "regionName": "Queensland",
            "city": "South Brisbane",
            "zip": "4101",
            "lat": -27.4766,
            "lon": 153.0166,
            "timezone": "Australia/Brisbane",
            "offset": 36000,
            "currency": "AUD",
            "isp": "Cloudflare, Inc",
            "org": "APNIC and Cloudflare DNS Resolver project",
            "as": "AS13335 Cloudflare, Inc.",
            "reverse": "one.one.one.one",
            "mobile": false,
            "proxy": false,
            "hosting": true
        })
        .to_string();

        let record = normalize(&body, "1.1.1.1").unwrap();
        assert_eq!(record.address, "1.1.1.1");
        assert_eq!(record.region, "Queensland");
        assert_eq!(record.utc_offset, "+1000");
        assert_eq!(record.currency_code.as_deref(), Some("AUD"));
        assert_eq!(record.autonomous_system_number.as_deref(), Some("AS13335"));
        assert_eq!(record.reverse_hostname.as_deref(), Some("one.one.one.one"));
        assert_eq!(record.network_type, NetworkType::Hosting);

        let flags = record.raw_security_flags.unwrap();
        assert!(flags.hosting());
        assert!(!flags.proxy());
        assert!(!flags.vpn());
    }

    #[test]
    fn test_fail_status_rejects() {
        let body = json!({"status": "fail", "message": "invalid query", "query": "nope"});
        let err = normalize(&body.to_string(), "nope").unwrap_err();
        assert_eq!(
            err,
            ExternalServiceError::Rejected {
                provider: PROVIDER_NAME,
                reason: "invalid query".into()
            }
        );
    }

    #[test]
    fn test_mobile_flag_classifies_network() {
        let body = json!({"status": "success", "query": "100.64.0.1", "mobile": true, "isp": "T-Mobile USA"});
        let record = normalize(&body.to_string(), "").unwrap();
        assert_eq!(record.network_type, NetworkType::Mobile);
    }

    #[test]
    fn test_request_url_self_lookup() {
        assert!(request_url("http://ip-api.com", "").starts_with("http://ip-api.com/json/?fields="));
        assert!(request_url("http://ip-api.com", "8.8.8.8").starts_with("http://ip-api.com/json/8.8.8.8?fields="));
    }
}
