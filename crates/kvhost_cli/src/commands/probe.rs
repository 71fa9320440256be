//! Probe command implementation.

use kvhost_core::HostPlatform;
use serde::Serialize;

/// Host capability report.
#[derive(Debug, Serialize)]
pub struct ProbeResult {
    /// Platform name (`browser` or the OS name).
    pub platform: String,
    /// Whether a native storage engine can run on this platform.
    pub native_engine: bool,
}

impl From<HostPlatform> for ProbeResult {
    fn from(platform: HostPlatform) -> Self {
        Self {
            platform: platform.name().to_string(),
            native_engine: platform.has_native_engine(),
        }
    }
}

/// Runs the probe command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let platform = HostPlatform::current();
    let result = ProbeResult::from(platform);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Host platform: {platform}");
            if result.native_engine {
                println!("Native storage engine: available");
            } else {
                println!("Native storage engine: unavailable on this host");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_report() {
        let result = ProbeResult::from(HostPlatform::Browser);
        assert_eq!(result.platform, "browser");
        assert!(!result.native_engine);
    }

    #[test]
    fn native_report() {
        let result = ProbeResult::from(HostPlatform::Native { os: "macos" });
        assert_eq!(result.platform, "macos");
        assert!(result.native_engine);
    }
}
