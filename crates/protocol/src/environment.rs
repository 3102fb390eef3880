//! Device and environment facts attached to every published message.
//!
//! Collection is platform specific, so the client only sees the
//! [`EnvironmentProvider`] trait. [`SystemEnvironment`] covers the portable
//! subset; embedders with richer information (device model, reachability)
//! supply their own provider or a fixed [`EnvironmentInfo`].

use chrono::{Local, Offset};

/// One snapshot of environment facts. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentInfo {
    pub device_id: Option<String>,
    pub device_model: Option<String>,
    pub serial_number: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    /// Local offset from UTC in seconds.
    pub utc_offset_secs: Option<i32>,
    pub language: Option<String>,
    pub network_status: Option<String>,
}

pub trait EnvironmentProvider: Send + Sync {
    fn snapshot(&self) -> EnvironmentInfo;
}

/// A fixed snapshot is its own provider.
impl EnvironmentProvider for EnvironmentInfo {
    fn snapshot(&self) -> EnvironmentInfo {
        self.clone()
    }
}

/// Reads what the Rust runtime can see portably.
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    app_name: Option<String>,
    app_version: Option<String>,
    device_id: Option<String>,
}

impl SystemEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self.app_version = Some(version.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

impl EnvironmentProvider for SystemEnvironment {
    fn snapshot(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            device_id: self.device_id.clone(),
            device_model: Some(std::env::consts::ARCH.to_string()),
            serial_number: None,
            os_name: Some(std::env::consts::OS.to_string()),
            os_version: None,
            app_name: self.app_name.clone(),
            app_version: self.app_version.clone(),
            utc_offset_secs: Some(Local::now().offset().fix().local_minus_utc()),
            language: system_language(),
            network_status: None,
        }
    }
}

/// Language from the POSIX locale variables: `ru_RU.UTF-8` becomes `ru-RU`.
fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .and_then(|v| parse_locale(&v))
}

fn parse_locale(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?;
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("ru_RU.UTF-8").as_deref(), Some("ru-RU"));
        assert_eq!(parse_locale("en_US@euro").as_deref(), Some("en-US"));
        assert_eq!(parse_locale("de").as_deref(), Some("de"));
        assert_eq!(parse_locale("C.UTF-8"), None);
        assert_eq!(parse_locale("POSIX"), None);
    }

    #[test]
    fn test_system_snapshot() {
        let env = SystemEnvironment::new().with_app("demo", "1.2.3").with_device_id("dev-1");
        let info = env.snapshot();
        assert_eq!(info.os_name.as_deref(), Some(std::env::consts::OS));
        assert_eq!(info.app_name.as_deref(), Some("demo"));
        assert_eq!(info.app_version.as_deref(), Some("1.2.3"));
        assert_eq!(info.device_id.as_deref(), Some("dev-1"));
        assert!(info.utc_offset_secs.is_some());
    }

    #[test]
    fn test_static_snapshot_is_identity() {
        let info = EnvironmentInfo { os_name: Some("linux".into()), ..Default::default() };
        assert_eq!(info.snapshot(), info);
    }
}
