//! Command line entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use secrecy::SecretString;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use guardia_ip::app::{AppService, LookupReport, LookupService, NarrativeOutcome, NarrativeService};
use guardia_ip::domain::{ConfigError, DeviceInfoProvider, RESTRICTED_PLACEHOLDER};
use guardia_ip::infra::http::DEFAULT_TIMEOUT_SECS;
use guardia_ip::infra::{
    GeminiNarrativeClient, HostDeviceInfo, JsonFileHistoryStore, ReqwestFetcher,
    UserAgentDeviceInfo,
};

#[derive(Debug, Parser)]
#[command(name = "guardia-ip", version, about = "IP intelligence lookups with risk scoring")]
struct Cli {
    /// History file (default: <data dir>/guardia-ip/history.json)
    #[arg(long, global = true, env = "GUARDIA_HISTORY_PATH")]
    history_path: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "GUARDIA_HTTP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up an address, or your own when none is given
    Lookup {
        query: Option<String>,

        /// Print the record and assessment as JSON
        #[arg(long)]
        json: bool,

        /// Skip narrative enrichment
        #[arg(long)]
        no_narrative: bool,

        /// Describe the client device from this user agent instead of the host
        #[arg(long, requires = "screen")]
        user_agent: Option<String>,

        /// Client screen size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_screen)]
        screen: Option<(u32, u32)>,
    },
    /// Show recent lookups
    History {
        /// Match against address or location
        #[arg(long)]
        filter: Option<String>,
    },
    /// Export history as CSV
    Export { path: PathBuf },
    /// Delete all history
    Clear,
}

fn parse_screen(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok((width, height))
}

/// Application configuration
struct Config {
    history_path: PathBuf,
    timeout: Duration,
    /// Gemini API key (optional - narrative is reported unavailable if not set)
    gemini_api_key: Option<SecretString>,
    gemini_api_url: Option<String>,
    gemini_model: Option<String>,
}

impl Config {
    fn from_env(cli: &Cli) -> Result<Self> {
        let history_path = match &cli.history_path {
            Some(path) => path.clone(),
            None => JsonFileHistoryStore::default_path()?,
        };
        let timeout_secs = cli.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "GUARDIA_HTTP_TIMEOUT_SECS",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        let gemini_api_url = env::var("GEMINI_API_URL").ok().filter(|u| !u.is_empty());
        let gemini_model = env::var("GEMINI_MODEL").ok().filter(|m| !m.is_empty());

        Ok(Self {
            history_path,
            timeout: Duration::from_secs(timeout_secs),
            gemini_api_key,
            gemini_api_url,
            gemini_model,
        })
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_service(config: &Config, device: Arc<dyn DeviceInfoProvider>) -> Result<AppService> {
    let fetcher = Arc::new(ReqwestFetcher::new(config.timeout)?);
    let history_store = Arc::new(JsonFileHistoryStore::new(&config.history_path));
    Ok(AppService::new(
        LookupService::new(fetcher),
        history_store,
        device,
    ))
}

fn print_report(report: &LookupReport) {
    let record = &report.record;
    let risk = &report.risk;

    println!("IP address      {}", record.address);
    println!("Location        {}", record.location_summary());
    if !record.region.is_empty() {
        println!("Region          {}", record.region);
    }
    if !record.country_code.is_empty() {
        println!("Country code    {}", record.country_code);
    }
    if let Some(postal) = &record.postal_code {
        println!("Postal code     {}", postal);
    }
    println!("Coordinates     {:.4}, {:.4}", record.latitude, record.longitude);
    if !record.time_zone_id.is_empty() {
        println!("Time zone       {} (UTC{})", record.time_zone_id, record.utc_offset);
    }
    if let Some(currency) = &record.currency_code {
        println!("Currency        {}", currency);
    }
    println!(
        "Organization    {}",
        record.organization.as_deref().unwrap_or("Unknown")
    );
    println!("ISP             {}", record.isp.as_deref().unwrap_or("Unknown"));
    println!(
        "ASN             {}",
        record.autonomous_system_number.as_deref().unwrap_or("Unknown")
    );
    println!("Network type    {}", record.network_type);
    if let Some(host) = &record.reverse_hostname {
        println!("Hostname        {}", host);
    }
    println!();
    println!("Risk score      {}/100", risk.risk_score);
    println!("Threat level    {}", risk.threat_level);
    println!(
        "Indicators      vpn={} proxy={} tor={} hosting={} blacklisted={}",
        risk.is_vpn, risk.is_proxy, risk.is_tor, risk.is_hosting, risk.is_blacklisted
    );
    println!();
    println!(
        "Device          {} on {} ({}, {}, {})",
        report.device.browser,
        report.device.os,
        report.device.device_type.as_str(),
        report.device.resolution,
        report.device.language
    );

    if record.is_restricted() {
        println!();
        println!(
            "Note: every enrichment provider was blocked, so only your address could be \
             discovered. Fields marked '{}' are unavailable from this network.",
            RESTRICTED_PLACEHOLDER
        );
    }
}

async fn run_lookup(
    config: &Config,
    query: Option<String>,
    json: bool,
    no_narrative: bool,
    device: Arc<dyn DeviceInfoProvider>,
) -> Result<ExitCode> {
    let mut service = build_service(config, device)?;
    if !no_narrative {
        let client = GeminiNarrativeClient::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
        )?;
        if !client.is_configured() {
            warn!("Narrative enrichment disabled (no GEMINI_API_KEY)");
        }
        service = service.with_narrative(NarrativeService::new(Arc::new(client)));
    }

    let report = match service.lookup(query.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e.message());
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        let value = serde_json::json!({
            "record": report.record,
            "risk": report.risk,
            "device": report.device,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_report(&report);
    }

    if let Some(handle) = report.narrative {
        info!("Waiting for narrative enrichment");
        match handle.outcome().await {
            NarrativeOutcome::Ready(text) => {
                println!();
                println!("Analyst summary");
                println!("{}", text);
            }
            NarrativeOutcome::Unavailable(reason) => {
                println!();
                println!("Analyst summary unavailable: {}", reason);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env(&cli)?;

    match cli.command {
        Command::Lookup {
            query,
            json,
            no_narrative,
            user_agent,
            screen,
        } => {
            let device: Arc<dyn DeviceInfoProvider> = match (user_agent, screen) {
                (Some(ua), Some((width, height))) => {
                    let language = env::var("LANG").unwrap_or_else(|_| "en-US".to_string());
                    Arc::new(UserAgentDeviceInfo::new(ua, width, height, language))
                }
                _ => Arc::new(HostDeviceInfo),
            };
            run_lookup(&config, query, json, no_narrative, device).await
        }
        Command::History { filter } => {
            let service = build_service(&config, Arc::new(HostDeviceInfo))?;
            let history = service.history().await?;
            let entries = history.filter(filter.as_deref().unwrap_or_default());
            if entries.is_empty() {
                println!("No lookups recorded.");
            }
            for entry in entries {
                println!(
                    "{:<20} {:<40} {:<32} {}",
                    entry.timestamp_display, entry.address, entry.location_summary, entry.threat_level
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Export { path } => {
            let service = build_service(&config, Arc::new(HostDeviceInfo))?;
            let history = service.history().await?;
            let csv = history.to_csv()?;
            std::fs::write(&path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} entries to {}", history.len(), path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear => {
            let service = build_service(&config, Arc::new(HostDeviceInfo))?;
            service.clear_history().await?;
            println!("History cleared.");
            Ok(ExitCode::SUCCESS)
        }
    }
}
