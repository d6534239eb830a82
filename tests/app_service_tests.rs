//! Full lookup cycle: resolve, score, history, narrative.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use guardia_ip::app::{AppService, HISTORY_CAPACITY, LookupService, NarrativeOutcome, NarrativeService};
use guardia_ip::domain::{
    DeviceInfo, DeviceType, HistoryStore, HttpFetcher, LookupError, ThreatLevel,
};
use guardia_ip::infra::{
    DiscoveryService, JsonFileHistoryStore, OwnAddressResolver, ProviderAdapter, ProviderEndpoint,
};
use guardia_ip::test_utils::{
    MockDeviceInfo, MockHistoryStore, MockHttpFetcher, MockNarrativeGenerator,
};

const PROVIDER: &str = "http://provider.test";
const IPIFY: &str = "http://ipify.test";

fn lookup_service(fetcher: MockHttpFetcher) -> LookupService {
    let fetcher: Arc<dyn HttpFetcher> = Arc::new(fetcher);
    let resolver = OwnAddressResolver::with_services(
        Arc::clone(&fetcher),
        vec![(DiscoveryService::Ipify, IPIFY.to_string())],
    );
    LookupService::with_endpoints(
        fetcher,
        vec![ProviderEndpoint::new(ProviderAdapter::IpWhoIs, PROVIDER)],
        resolver,
    )
}

/// Answers every address with a record carrying the given security object
fn provider_answering(ip: &str, security: serde_json::Value) -> MockHttpFetcher {
    MockHttpFetcher::new().respond_json(
        PROVIDER,
        json!({
            "ip": ip,
            "success": true,
            "city": "Reykjavik",
            "country": "Iceland",
            "connection": {"asn": 44735, "org": "Example Hosting ehf", "isp": "Example"},
            "security": security
        }),
    )
}

fn device() -> Arc<MockDeviceInfo> {
    Arc::new(MockDeviceInfo(DeviceInfo {
        browser: "Firefox".into(),
        os: "Linux".into(),
        device_type: DeviceType::Desktop,
        resolution: "1920x1080".into(),
        user_agent: "test".into(),
        language: "is-IS".into(),
    }))
}

#[tokio::test]
async fn test_lookup_scores_and_records_history() {
    let history = Arc::new(MockHistoryStore::new());
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({"vpn": true, "hosting": true}))),
        history.clone(),
        device(),
    );

    let report = service.lookup(Some("185.1.1.1")).await.unwrap();

    assert_eq!(report.risk.risk_score, 55);
    assert_eq!(report.risk.threat_level, ThreatLevel::High);
    assert_eq!(report.device.browser, "Firefox");
    assert!(report.narrative.is_none());

    let entries = history.get_all_items();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].address, "185.1.1.1");
    assert_eq!(entries[0].location_summary, "Reykjavik, Iceland");
    assert_eq!(entries[0].threat_level, ThreatLevel::High);
}

#[tokio::test]
async fn test_repeated_lookup_keeps_one_entry_per_address() {
    let history = Arc::new(MockHistoryStore::new());
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({}))),
        history.clone(),
        device(),
    );

    service.lookup(Some("185.1.1.1")).await.unwrap();
    service.lookup(Some("185.1.1.1")).await.unwrap();

    assert_eq!(history.get_all_items().len(), 1);
}

#[tokio::test]
async fn test_failed_lookup_records_nothing() {
    let history = Arc::new(MockHistoryStore::new());
    let service = AppService::new(
        lookup_service(MockHttpFetcher::new()),
        history.clone(),
        device(),
    );

    let err = service.lookup(Some("185.1.1.1")).await.unwrap_err();

    assert!(matches!(err, LookupError::BlockedNetwork { .. }));
    assert!(history.get_all_items().is_empty());
}

#[tokio::test]
async fn test_history_failure_does_not_fail_lookup() {
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({}))),
        Arc::new(MockHistoryStore::failing("disk full")),
        device(),
    );

    let report = service.lookup(Some("185.1.1.1")).await.unwrap();
    assert_eq!(report.record.address, "185.1.1.1");
}

#[tokio::test]
async fn test_restricted_self_lookup_is_recorded() {
    let history = Arc::new(MockHistoryStore::new());
    let service = AppService::new(
        lookup_service(MockHttpFetcher::new().respond_json(IPIFY, json!({"ip": "100.64.1.1"}))),
        history.clone(),
        device(),
    );

    let report = service.lookup(None).await.unwrap();

    assert!(report.record.is_restricted());
    assert_eq!(report.risk.threat_level, ThreatLevel::Low);
    assert_eq!(history.get_all_items()[0].address, "100.64.1.1");
}

#[tokio::test]
async fn test_narrative_does_not_gate_result() {
    let generator =
        Arc::new(MockNarrativeGenerator::new("Looks like a VPN exit.").with_delay(Duration::from_millis(200)));
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({"vpn": true}))),
        Arc::new(MockHistoryStore::new()),
        device(),
    )
    .with_narrative(NarrativeService::new(generator.clone()));

    let report = service.lookup(Some("185.1.1.1")).await.unwrap();
    let handle = report.narrative.expect("narrative attached");

    assert!(!handle.is_finished());
    assert_eq!(report.risk.risk_score, 35);

    assert_eq!(
        handle.outcome().await,
        NarrativeOutcome::Ready("Looks like a VPN exit.".to_string())
    );
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("185.1.1.1"));
    assert!(prompts[0].contains("risk score of 35/100"));
}

#[tokio::test]
async fn test_narrative_failure_is_distinct_unavailable_state() {
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({}))),
        Arc::new(MockHistoryStore::new()),
        device(),
    )
    .with_narrative(NarrativeService::new(Arc::new(MockNarrativeGenerator::failing(
        "quota exceeded",
    ))));

    let report = service.lookup(Some("185.1.1.1")).await.unwrap();
    let outcome = report.narrative.unwrap().outcome().await;

    match outcome {
        NarrativeOutcome::Unavailable(reason) => assert!(reason.contains("quota exceeded")),
        other => panic!("expected Unavailable, got {:?}", other),
    }
    assert_eq!(report.record.address, "185.1.1.1");
}

#[tokio::test]
async fn test_history_cap_across_lookups() {
    let history = Arc::new(MockHistoryStore::new());
    let fetcher = (0..=HISTORY_CAPACITY).fold(MockHttpFetcher::new(), |fetcher, n| {
        let ip = format!("10.1.{}.1", n);
        fetcher.respond_json(
            format!("{}/{}", PROVIDER, ip),
            json!({"ip": ip, "success": true}),
        )
    });
    let service = AppService::new(lookup_service(fetcher), history.clone(), device());

    for n in 0..=HISTORY_CAPACITY {
        service
            .lookup(Some(&format!("10.1.{}.1", n)))
            .await
            .unwrap();
    }

    let entries = history.get_all_items();
    assert_eq!(entries.len(), HISTORY_CAPACITY);
    assert_eq!(entries[0].address, format!("10.1.{}.1", HISTORY_CAPACITY));
    assert!(entries.iter().all(|e| e.address != "10.1.0.1"));
}

#[tokio::test]
async fn test_clear_history() {
    let history = Arc::new(MockHistoryStore::new());
    let service = AppService::new(
        lookup_service(provider_answering("185.1.1.1", json!({}))),
        history.clone(),
        device(),
    );

    service.lookup(Some("185.1.1.1")).await.unwrap();
    service.clear_history().await.unwrap();

    assert!(service.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lookups_recover_from_corrupt_history_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, br#"{"truncated"#).unwrap();
    let store = Arc::new(JsonFileHistoryStore::new(&path));

    let fetcher = ["185.1.1.1", "185.1.1.2", "185.1.1.3"]
        .iter()
        .fold(MockHttpFetcher::new(), |fetcher, ip| {
            fetcher.respond_json(
                format!("{}/{}", PROVIDER, ip),
                json!({"ip": ip, "success": true, "city": "Reykjavik", "country": "Iceland"}),
            )
        });
    let service = AppService::new(lookup_service(fetcher), store.clone(), device());

    for ip in ["185.1.1.1", "185.1.1.2", "185.1.1.3"] {
        service.lookup(Some(ip)).await.unwrap();
    }

    let entries = store.load().await.unwrap();
    let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(addresses, ["185.1.1.3", "185.1.1.2", "185.1.1.1"]);
    assert_eq!(service.history().await.unwrap().len(), 3);
}
