//! Downloads and launches the NI-DAQmx driver installer.
//!
//! Release metadata is a JSON document listing releases per platform:
//!
//! ```json
//! {
//!     "Windows": [{"Version": "24.5.0", "Release": "2024Q3", "Location": "https://...", "supportedOS": ["Windows 11"]}],
//!     "Linux": [{"Version": "24.5.0", "Release": "2024Q3", "Location": "https://...", "supportedOS": ["ubuntu 22.04"]}]
//! }
//! ```
//!
//! The first entry for the running platform is the release to install.

use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::DriverVersion;

pub const DEFAULT_METADATA_URL: &str = "https://www.ni.com/content/dam/web/product-documentation/nidaqmx/installer_metadata.json";

/// Command-line switches for an unattended Windows install.
const WINDOWS_INSTALLER_ARGS: [&str; 3] = ["--passive", "--accept-eulas", "--prevent-reboot"];

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("installer metadata is malformed: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("no NI-DAQmx release is listed for {0}")]
    NoRelease(Platform),
    #[error("release {0} has no download location")]
    MissingDownloadUrl(String),
    #[error("invalid version string {0:?}")]
    InvalidVersion(String),
    #[error("the installer is not available for this operating system")]
    UnsupportedPlatform,
    #[error("installer exited with {0}")]
    InstallerFailed(ExitStatus),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Option<Self> {
        if cfg!(windows) {
            Some(Platform::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    fn installer_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Linux => ".zip",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct InstallerMetadata {
    #[serde(rename = "Windows", default)]
    pub windows: Vec<Release>,
    #[serde(rename = "Linux", default)]
    pub linux: Vec<Release>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Release {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Release")]
    pub release: String,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "supportedOS", default)]
    pub supported_os: Vec<String>,
}

impl Release {
    pub fn driver_version(&self) -> Result<DriverVersion, InstallError> {
        parse_version(&self.version)
    }

    /// The download URL; a missing or blank location aborts the install.
    pub fn download_url(&self) -> Result<&str, InstallError> {
        match self.location.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(InstallError::MissingDownloadUrl(self.release.clone())),
        }
    }
}

impl InstallerMetadata {
    pub fn parse(json: &str) -> Result<Self, InstallError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn fetch(url: &str) -> Result<Self, InstallError> {
        debug!(url, "fetching installer metadata");
        let body = ureq::get(url)
            .call()
            .map_err(|source| InstallError::Http {
                url: url.to_string(),
                source: Box::new(source),
            })?
            .into_string()?;
        Self::parse(&body)
    }

    pub fn latest(&self, platform: Platform) -> Result<&Release, InstallError> {
        let releases = match platform {
            Platform::Windows => &self.windows,
            Platform::Linux => &self.linux,
        };
        releases.first().ok_or(InstallError::NoRelease(platform))
    }
}

/// Parses `"major[.minor[.update]]"`; missing components are zero.
pub fn parse_version(text: &str) -> Result<DriverVersion, InstallError> {
    let invalid = || InstallError::InvalidVersion(text.to_string());
    let parts = text
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    Ok(DriverVersion {
        major_version: part(0),
        minor_version: part(1),
        update_version: part(2),
    })
}

/// What `install` should do given the installed and the latest version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallAction {
    Install,
    Upgrade { from: DriverVersion },
    UpToDate,
}

pub fn plan(installed: Option<DriverVersion>, latest: DriverVersion) -> InstallAction {
    match installed {
        None => InstallAction::Install,
        Some(current) if current < latest => InstallAction::Upgrade { from: current },
        Some(_) => InstallAction::UpToDate,
    }
}

#[derive(Debug, PartialEq)]
pub enum InstallOutcome {
    UpToDate(DriverVersion),
    Installed(DriverVersion),
    /// The Linux archive was saved here for the distribution's package manager.
    Downloaded(PathBuf),
}

/// Installs or upgrades the driver from the release listed at `metadata_url`.
pub fn install(metadata_url: &str, installed: Option<DriverVersion>) -> Result<InstallOutcome, InstallError> {
    let platform = Platform::current().ok_or(InstallError::UnsupportedPlatform)?;
    let metadata = InstallerMetadata::fetch(metadata_url)?;
    let release = metadata.latest(platform)?;
    let latest = release.driver_version()?;

    match plan(installed, latest) {
        InstallAction::UpToDate => {
            info!(%latest, "NI-DAQmx is already up to date");
            return Ok(InstallOutcome::UpToDate(latest));
        }
        InstallAction::Upgrade { from } => info!(%from, to = %latest, "upgrading NI-DAQmx"),
        InstallAction::Install => info!(%latest, release = %release.release, "installing NI-DAQmx"),
    }

    let url = release.download_url()?;
    let installer = download(url, platform)?;

    match platform {
        Platform::Windows => {
            info!(path = %installer.display(), "launching installer");
            let status = Command::new(&*installer).args(WINDOWS_INSTALLER_ARGS).status()?;
            if let Err(err) = installer.close() {
                warn!(%err, "could not remove the downloaded installer");
            }
            if !status.success() {
                return Err(InstallError::InstallerFailed(status));
            }
            Ok(InstallOutcome::Installed(latest))
        }
        Platform::Linux => {
            let path = installer.keep().map_err(|err| err.error)?;
            info!(path = %path.display(), "saved driver archive; install it with the distribution's package manager");
            Ok(InstallOutcome::Downloaded(path))
        }
    }
}

fn download(url: &str, platform: Platform) -> Result<tempfile::TempPath, InstallError> {
    debug!(url, "downloading installer");
    let response = ureq::get(url).call().map_err(|source| InstallError::Http {
        url: url.to_string(),
        source: Box::new(source),
    })?;
    let mut file = tempfile::Builder::new()
        .prefix("ni-daqmx-")
        .suffix(platform.installer_suffix())
        .tempfile()?;
    let bytes = io::copy(&mut response.into_reader(), file.as_file_mut())?;
    debug!(bytes, "installer downloaded");
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"{
        "Windows": [
            {"Version": "24.5.0", "Release": "2024Q3", "Location": "https://download.example/ni-daqmx_24.5_online.exe",
             "supportedOS": ["Windows 11", "Windows 10 64-bit"]}
        ],
        "Linux": [
            {"Version": "24.5", "Release": "2024Q3", "supportedOS": ["ubuntu 22.04"]}
        ]
    }"#;

    #[test]
    fn parses_release_metadata() {
        let metadata = InstallerMetadata::parse(METADATA).unwrap();
        let windows = metadata.latest(Platform::Windows).unwrap();
        assert_eq!(windows.release, "2024Q3");
        assert_eq!(windows.supported_os.len(), 2);
        assert_eq!(
            windows.driver_version().unwrap(),
            DriverVersion { major_version: 24, minor_version: 5, update_version: 0 }
        );
        assert!(windows.download_url().unwrap().ends_with(".exe"));
    }

    #[test]
    fn missing_location_aborts() {
        let metadata = InstallerMetadata::parse(METADATA).unwrap();
        let linux = metadata.latest(Platform::Linux).unwrap();
        assert!(matches!(linux.download_url(), Err(InstallError::MissingDownloadUrl(r)) if r == "2024Q3"));
    }

    #[test]
    fn empty_platform_list() {
        let metadata = InstallerMetadata::parse(r#"{"Windows": []}"#).unwrap();
        assert!(matches!(metadata.latest(Platform::Linux), Err(InstallError::NoRelease(Platform::Linux))));
    }

    #[test]
    fn version_parsing() {
        assert_eq!(parse_version("23").unwrap().to_string(), "23.0.0");
        assert_eq!(parse_version(" 8.9.1 ").unwrap().to_string(), "8.9.1");
        assert!(parse_version("24.x").is_err());
        assert!(parse_version("1.2.3.4").is_err());
    }

    #[test]
    fn install_plan() {
        let latest = parse_version("24.5.0").unwrap();
        assert_eq!(plan(None, latest), InstallAction::Install);
        let old = parse_version("23.8.0").unwrap();
        assert_eq!(plan(Some(old), latest), InstallAction::Upgrade { from: old });
        assert_eq!(plan(Some(latest), latest), InstallAction::UpToDate);
    }
}
