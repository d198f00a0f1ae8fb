//! CLI argument parsing module for modup

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::catalog::DEFAULT_FORGE_URL;
use crate::domain::{ModuleId, Version};
use crate::error::ConfigError;
use crate::output::{OutputConfig, OutputFormat};
use crate::plan::UpgradeRequest;

/// Parse a module name in `owner-name` or `owner/name` form
fn parse_module(s: &str) -> Result<ModuleId, String> {
    ModuleId::parse(s).map_err(|e| e.to_string())
}

/// Parse an exact semantic version
fn parse_version(s: &str) -> Result<Version, String> {
    Version::parse(s).map_err(|e| e.to_string())
}

/// Output format choices exposed on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    Text,
    /// Machine-readable JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Puppet module upgrade tool
#[derive(Parser, Debug, Clone)]
#[command(
    name = "modup",
    about = "Upgrade an installed Puppet module and its dependencies"
)]
pub struct CliArgs {
    /// Module to upgrade, as owner-name or owner/name
    #[arg(value_name = "MODULE", value_parser = parse_module)]
    pub module: ModuleId,

    // Resolution options
    /// Upgrade to this exact version instead of the newest acceptable one
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    pub version: Option<Version>,

    /// Upgrade anyway, overriding version requirements of dependent modules
    #[arg(long)]
    pub force: bool,

    /// Upgrade only the named module, skipping dependency checks entirely
    #[arg(long)]
    pub ignore_dependencies: bool,

    // Environment options
    /// Colon-separated directories holding installed modules; the first
    /// entry receives upgrades
    #[arg(long, value_delimiter = ':', default_value = "modules")]
    pub modulepath: Vec<PathBuf>,

    /// Forge API base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_FORGE_URL)]
    pub forge: String,

    // General options
    /// Dry run mode - show the upgrade plan without touching the disk
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    // Output options
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl CliArgs {
    /// Output configuration derived from the flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::from_cli(
            self.format.into(),
            self.verbose,
            self.quiet,
            self.dry_run,
            self.no_color,
        )
    }

    /// First modulepath entry; new module versions are installed here
    pub fn install_dir(&self) -> Result<PathBuf, ConfigError> {
        self.modulepath
            .first()
            .cloned()
            .ok_or(ConfigError::EmptyModulepath)
    }

    /// Assemble the planner request from the parsed flags
    pub fn upgrade_request(&self) -> Result<UpgradeRequest, ConfigError> {
        Ok(UpgradeRequest {
            target: self.module.clone(),
            version: self.version.clone(),
            force: self.force,
            ignore_dependencies: self.ignore_dependencies,
            base_dir: self.install_dir()?,
        })
    }
}
