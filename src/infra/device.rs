//! Device information providers.

use crate::domain::{DeviceInfo, DeviceInfoProvider, DeviceType};

/// Browser tokens in match order. Chrome's UA contains "Safari" and Edge's
/// contains "Chrome", so the more specific tokens come first.
const BROWSERS: &[(&[&str], &str)] = &[
    (&["Firefox"], "Firefox"),
    (&["SamsungBrowser"], "Samsung Browser"),
    (&["Opera", "OPR"], "Opera"),
    (&["Edge", "Edg/"], "Edge"),
    (&["Chrome"], "Chrome"),
    (&["Safari"], "Safari"),
];

/// Android UAs contain "Linux"; iOS UAs contain "Mac OS".
const OPERATING_SYSTEMS: &[(&[&str], &str)] = &[
    (&["Windows"], "Windows"),
    (&["iPhone", "iPad"], "iOS"),
    (&["Android"], "Android"),
    (&["Mac OS"], "macOS"),
    (&["Linux"], "Linux"),
];

fn first_match(ua: &str, table: &[(&[&str], &'static str)]) -> Option<&'static str> {
    table
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|t| ua.contains(t)))
        .map(|(_, name)| *name)
}

/// Device description derived from a browser's user agent and screen
#[derive(Debug, Clone)]
pub struct UserAgentDeviceInfo {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub language: String,
}

impl UserAgentDeviceInfo {
    pub fn new(
        user_agent: impl Into<String>,
        screen_width: u32,
        screen_height: u32,
        language: impl Into<String>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            screen_width,
            screen_height,
            language: language.into(),
        }
    }
}

impl DeviceInfoProvider for UserAgentDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        let ua = self.user_agent.as_str();
        DeviceInfo {
            browser: first_match(ua, BROWSERS).unwrap_or("Unknown").to_string(),
            os: first_match(ua, OPERATING_SYSTEMS)
                .unwrap_or("Unknown OS")
                .to_string(),
            device_type: DeviceType::from_screen_width(self.screen_width),
            resolution: format!("{}x{}", self.screen_width, self.screen_height),
            user_agent: self.user_agent.clone(),
            language: self.language.clone(),
        }
    }
}

/// The machine the CLI runs on
#[derive(Debug, Clone, Default)]
pub struct HostDeviceInfo;

impl DeviceInfoProvider for HostDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        let os = match std::env::consts::OS {
            "windows" => "Windows",
            "macos" => "macOS",
            "linux" => "Linux",
            "android" => "Android",
            "ios" => "iOS",
            _ => "Unknown OS",
        };
        let language = std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(|l| l.replace('_', "-")))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "en-US".to_string());

        DeviceInfo {
            browser: "guardia-ip CLI".to_string(),
            os: os.to_string(),
            device_type: DeviceType::Desktop,
            resolution: "n/a".to_string(),
            user_agent: concat!("guardia-ip/", env!("CARGO_PKG_VERSION")).to_string(),
            language,
        }
    }
}
