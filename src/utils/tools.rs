use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::config::ToolkitConfig;

// Structure to represent an external tool
#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub name: String,
    pub path: PathBuf,
    pub version: Option<Version>,
    pub min_version: Version,
}

/// What `/health` reports about a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: String,
    pub version: Option<String>,
    pub supported: bool,
}

impl ExternalTool {
    /// Unknown versions are given the benefit of the doubt
    pub fn is_supported(&self) -> bool {
        self.version.as_ref().map_or(true, |v| *v >= self.min_version)
    }

    pub fn status(&self) -> ToolStatus {
        ToolStatus {
            name: self.name.clone(),
            path: self.path.display().to_string(),
            version: self.version.as_ref().map(Version::to_string),
            supported: self.is_supported(),
        }
    }
}

// Global storage for tools
static TOOLS: Lazy<Mutex<Vec<ExternalTool>>> = Lazy::new(|| Mutex::new(Vec::new()));

static FFMPEG_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ffmpeg version n?(\d+)\.(\d+)(?:\.(\d+))?").expect("valid ffmpeg version pattern"));
static ANY_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version pattern"));

const FFMPEG_MIN_VERSION: Version = Version::new(4, 0, 0);
const SVC_MIN_VERSION: Version = Version::new(4, 0, 0);

/// Locate ffmpeg and the toolkit launcher and remember them for later lookups.
///
/// Nothing here is fatal: a missing tool is logged and left out, and the
/// request that needs it fails later with a proper error.
pub fn init_tools(toolkit: &ToolkitConfig) -> Result<Vec<ExternalTool>> {
    info!("Initializing external tools...");
    let mut found = Vec::new();

    match which::which("ffmpeg") {
        Ok(path) => {
            let version = check_ffmpeg_version(&path)
                .map_err(|e| debug!("Could not read ffmpeg version: {}", e))
                .ok();
            found.push(ExternalTool {
                name: "ffmpeg".to_string(),
                path,
                version,
                min_version: FFMPEG_MIN_VERSION,
            });
        }
        Err(_) => warn!("ffmpeg not found in PATH, text-to-speech will only produce MP3 sources"),
    }

    let launcher = toolkit.launcher();
    match which::which(launcher) {
        Ok(path) => {
            // Версию спрашиваем только у самого svc, а не у обёртки вроде conda
            let version = if toolkit.prefix_args.is_empty() {
                check_svc_version(&path)
                    .map_err(|e| debug!("Could not read svc version: {}", e))
                    .ok()
            } else {
                None
            };
            found.push(ExternalTool {
                name: "svc".to_string(),
                path,
                version,
                min_version: SVC_MIN_VERSION,
            });
        }
        Err(_) => warn!("'{}' not found in PATH, training and inference will fail", launcher),
    }

    for tool in &found {
        match &tool.version {
            Some(version) if !tool.is_supported() => warn!(
                "{} {} at {} is older than {}",
                tool.name,
                version,
                tool.path.display(),
                tool.min_version
            ),
            Some(version) => info!("Found {} {} at {}", tool.name, version, tool.path.display()),
            None => info!("Found {} at {}", tool.name, tool.path.display()),
        }
    }

    let mut tools = TOOLS.lock().map_err(|_| anyhow!("Tool registry is poisoned"))?;
    tools.clear();
    tools.extend(found.iter().cloned());
    Ok(found)
}

fn version_output(path: &Path, flag: &str) -> Result<String> {
    let output = Command::new(path)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to execute {}", path.display()))?;

    if !output.status.success() {
        return Err(anyhow!("{} {} exited with {}", path.display(), flag, output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check ffmpeg version
fn check_ffmpeg_version(path: &Path) -> Result<Version> {
    parse_ffmpeg_version(&version_output(path, "-version")?)
}

/// Check svc version
fn check_svc_version(path: &Path) -> Result<Version> {
    parse_plain_version(&version_output(path, "--version")?)
}

fn parse_ffmpeg_version(output: &str) -> Result<Version> {
    let caps = FFMPEG_VERSION
        .captures(output)
        .ok_or_else(|| anyhow!("Could not parse ffmpeg version"))?;
    let part = |i: usize| caps.get(i).map_or(Ok(0), |m| m.as_str().parse::<u64>());
    Ok(Version::new(part(1)?, part(2)?, part(3)?))
}

fn parse_plain_version(output: &str) -> Result<Version> {
    let found = ANY_VERSION
        .find(output)
        .ok_or_else(|| anyhow!("No version number in '{}'", output.trim()))?;
    Ok(Version::parse(found.as_str())?)
}

/// Get tool path by name
pub fn get_tool_path(name: &str) -> Option<PathBuf> {
    TOOLS
        .lock()
        .ok()?
        .iter()
        .find(|tool| tool.name == name)
        .map(|tool| tool.path.clone())
}

/// Snapshot of the registry
pub fn registered_tools() -> Vec<ExternalTool> {
    TOOLS.lock().map(|tools| tools.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffmpeg_versions() {
        let release = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers";
        assert_eq!(parse_ffmpeg_version(release).unwrap(), Version::new(6, 1, 1));

        let short = "ffmpeg version 7.0 Copyright (c) 2000-2024";
        assert_eq!(parse_ffmpeg_version(short).unwrap(), Version::new(7, 0, 0));

        let nightly = "ffmpeg version n5.1.2 Copyright";
        assert_eq!(parse_ffmpeg_version(nightly).unwrap(), Version::new(5, 1, 2));

        assert!(parse_ffmpeg_version("ffmpeg version N-112345-gdeadbeef").is_err());
    }

    #[test]
    fn test_parse_svc_version() {
        assert_eq!(parse_plain_version("svc, version 4.1.61\n").unwrap(), Version::new(4, 1, 61));
        assert!(parse_plain_version("unknown").is_err());
    }

    #[test]
    fn test_unknown_version_is_supported() {
        let mut tool = ExternalTool {
            name: "ffmpeg".into(),
            path: PathBuf::from("/usr/bin/ffmpeg"),
            version: None,
            min_version: FFMPEG_MIN_VERSION,
        };
        assert!(tool.is_supported());
        tool.version = Some(Version::new(3, 4, 0));
        assert!(!tool.status().supported);
        tool.version = Some(Version::new(6, 0, 0));
        assert_eq!(tool.status().version.as_deref(), Some("6.0.0"));
    }
}
