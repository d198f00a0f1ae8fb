//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ParseError: Malformed identifiers, versions, or constraints
//! - ScanError: Issues reading the local module tree
//! - CatalogError: Issues with Forge communication
//! - InstallError: Issues applying a plan to disk
//! - ConfigError: Issues with CLI configuration
//!
//! Resolution outcomes (conflicts, missing versions and the like) are not
//! errors in this sense; they travel as data inside `UpgradeResult`.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Identifier, version, or constraint parsing errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Module tree scanning errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Forge communication errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Plan application errors
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors for text that failed to parse into a domain value
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed module identifier
    #[error("invalid module name '{input}': {reason}")]
    ModuleId { input: String, reason: String },

    /// Malformed version string
    #[error("invalid version '{input}': {reason}")]
    Version { input: String, reason: String },

    /// Malformed version requirement
    #[error("invalid version requirement '{input}': {reason}")]
    Constraint { input: String, reason: String },
}

/// Errors related to reading the local module tree
#[derive(Error, Debug)]
pub enum ScanError {
    /// A modulepath entry exists but is not a directory
    #[error("modulepath entry is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Failed to read a modulepath directory
    #[error("failed to read module directory {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to Forge communication
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Module unknown to the Forge
    #[error("module '{module}' not found on the Forge")]
    ModuleNotFound { module: String },

    /// Network request failed
    #[error("failed to fetch module '{module}' from the Forge: {message}")]
    NetworkError { module: String, message: String },

    /// Rate limit exceeded after retries
    #[error("Forge rate limit exceeded while fetching '{module}'")]
    RateLimitExceeded { module: String },

    /// Response body did not match the expected shape
    #[error("invalid Forge response for '{module}': {message}")]
    InvalidResponse { module: String, message: String },

    /// Timeout
    #[error("timeout while fetching '{module}' from the Forge")]
    Timeout { module: String },
}

/// Errors related to applying a plan to disk
#[derive(Error, Debug)]
pub enum InstallError {
    /// Release missing from the Forge although its version was listed
    #[error("release {module} {version} not found on the Forge")]
    ReleaseNotFound { module: String, version: String },

    /// Tarball download failed
    #[error("failed to download {module} {version}: {message}")]
    DownloadError {
        module: String,
        version: String,
        message: String,
    },

    /// Tarball could not be unpacked
    #[error("failed to unpack archive for {module}: {message}")]
    ArchiveError { module: String, message: String },

    /// File system operation failed
    #[error("install step failed at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Modulepath has no entries
    #[error("no modulepath directories configured")]
    EmptyModulepath,

    /// Base directory missing or unusable
    #[error("invalid modulepath entry '{path}': {message}")]
    InvalidModulePath { path: PathBuf, message: String },

    /// Forge base URL did not parse
    #[error("invalid forge URL '{value}': {message}")]
    InvalidForgeUrl { value: String, message: String },
}

impl ParseError {
    /// Creates a new ModuleId parse error
    pub fn module_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::ModuleId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new Version parse error
    pub fn version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Version {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new Constraint parse error
    pub fn constraint(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Constraint {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl ScanError {
    /// Creates a new NotADirectory error
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        ScanError::NotADirectory { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::ReadError {
            path: path.into(),
            source,
        }
    }
}

impl CatalogError {
    /// Creates a new ModuleNotFound error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        CatalogError::ModuleNotFound {
            module: module.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(module: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::NetworkError {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(module: impl Into<String>) -> Self {
        CatalogError::RateLimitExceeded {
            module: module.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(module: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::InvalidResponse {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(module: impl Into<String>) -> Self {
        CatalogError::Timeout {
            module: module.into(),
        }
    }
}

impl InstallError {
    /// Creates a new ReleaseNotFound error
    pub fn release_not_found(module: impl Into<String>, version: impl Into<String>) -> Self {
        InstallError::ReleaseNotFound {
            module: module.into(),
            version: version.into(),
        }
    }

    /// Creates a new DownloadError
    pub fn download_error(
        module: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        InstallError::DownloadError {
            module: module.into(),
            version: version.into(),
            message: message.into(),
        }
    }

    /// Creates a new ArchiveError
    pub fn archive_error(module: impl Into<String>, message: impl Into<String>) -> Self {
        InstallError::ArchiveError {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a new Filesystem error
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
