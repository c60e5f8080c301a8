//! Configuration for the orgpulse command
//!
//! Settings come from three places, merged in this order:
//!
//! 1. Command-line flags (with environment fallbacks)
//! 2. The `[GitConfig]` section of an INI file, whose values override the
//!    flags, except `deploy_dir` which yields to an explicit `-d`
//! 3. Interactive prompts for whatever is still missing
//!
//! The result is a [`ResolvedConfig`] holding a complete [`RunConfig`].

use std::path::{Path, PathBuf};

use clap::Parser;
use config::Source;
use tracing::{debug, info, warn};

use crate::pipeline::RunConfig;
use crate::prompt::Prompter;
use crate::report::OutputFormat;
use crate::summarize::{DEFAULT_BASE_URL, DEFAULT_MODEL, SummarizerConfig};

/// Working-copy directory used when none is configured
pub const DEFAULT_DEPLOY_DIR: &str = "deploy";

/// File name used by a bare `-s`
pub const DEFAULT_REPORT_FILE: &str = "git_report.md";

/// INI section holding the settings
pub const INI_SECTION: &str = "GitConfig";

/// Attempts allowed for an interactive months answer
const MONTHS_ATTEMPTS: usize = 3;

/// orgpulse - monthly engineering digests from repository history
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "orgpulse")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Comma-separated list of repository URLs
    #[arg(short, long, env = "ORGPULSE_REPO_URLS")]
    pub repo_urls: Option<String>,

    /// Identifier for organization commits (e.g. an email domain)
    ///
    /// Matched case-insensitively as a substring of the author name or email.
    #[arg(short, long, env = "ORGPULSE_COMPANY")]
    pub company_identifier: Option<String>,

    /// Number of 30-day months to look back
    #[arg(short, long, env = "ORGPULSE_MONTHS_BACK", value_parser = clap::value_parser!(u32).range(1..))]
    pub months_back: Option<u32>,

    /// Path to an INI configuration file
    ///
    /// Defaults to orgpulse/orgpulse.ini under the platform config directory,
    /// when that file exists.
    #[arg(short = 'f', long, env = "ORGPULSE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Save the article to a file (bare flag saves to git_report.md)
    #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_REPORT_FILE)]
    pub save_to_file: Option<PathBuf>,

    /// Directory holding working copies between runs [default: deploy]
    #[arg(short, long, env = "ORGPULSE_DEPLOY_DIR")]
    pub deploy_dir: Option<PathBuf>,

    /// OpenAI API key; enables per-author summaries
    #[arg(short = 'k', long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Chat model used for summaries
    #[arg(long, env = "ORGPULSE_OPENAI_MODEL")]
    pub openai_model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "ORGPULSE_OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Maximum commits listed per repository
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Clone into a temporary directory removed after the run
    #[arg(long, default_value = "false")]
    pub ephemeral: bool,

    /// Never prompt for missing values
    #[arg(long, default_value = "false")]
    pub no_input: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - only warnings and errors are logged
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Everything needed to run and publish one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Pipeline input
    pub run: RunConfig,
    /// Summarizer settings, when a key is available
    pub summarizer: Option<SummarizerConfig>,
    /// Output format
    pub format: OutputFormat,
    /// Destination file, when saving was requested up front
    pub save_to_file: Option<PathBuf>,
}

/// Values read from the `[GitConfig]` INI section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSettings {
    /// `repo_urls`, split on commas
    pub repo_urls: Option<Vec<String>>,
    /// `company_identifier`
    pub company_identifier: Option<String>,
    /// `months_back`
    pub months_back: Option<u32>,
    /// `deploy_dir`
    pub deploy_dir: Option<PathBuf>,
    /// `openai_apikey`
    pub openai_apikey: Option<String>,
}

impl IniSettings {
    /// Load the `[GitConfig]` section of `path`
    ///
    /// Section and key names are matched case-insensitively. A file without
    /// the section yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::IniLoad` when the file is missing or unreadable,
    /// or when `months_back` is not an integer.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini_err = |detail: String| ConfigError::IniLoad(path.to_path_buf(), detail);

        let built = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .build()
            .map_err(|e| ini_err(e.to_string()))?;
        let sections = built.collect().map_err(|e| ini_err(e.to_string()))?;

        let Some(section) = sections
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(INI_SECTION))
            .map(|(_, value)| value)
        else {
            debug!(path = %path.display(), "No [{INI_SECTION}] section");
            return Ok(Self::default());
        };

        let mut settings = Self::default();
        for (key, value) in section.into_table().map_err(|e| ini_err(e.to_string()))? {
            let value = value.into_string().map_err(|e| ini_err(e.to_string()))?;
            let value = value.trim();
            match key.to_ascii_lowercase().as_str() {
                "repo_urls" => {
                    settings.repo_urls = Some(split_list(value)).filter(|urls| !urls.is_empty());
                }
                "company_identifier" => settings.company_identifier = non_blank(value),
                "months_back" if !value.is_empty() => {
                    let months = value
                        .parse()
                        .map_err(|_| ini_err(format!("months_back is not an integer: {value:?}")))?;
                    settings.months_back = Some(months);
                }
                "deploy_dir" => settings.deploy_dir = non_blank(value).map(PathBuf::from),
                "openai_apikey" => settings.openai_apikey = non_blank(value),
                other => debug!(key = other, "Ignoring INI key"),
            }
        }
        Ok(settings)
    }
}

/// Command line and INI merged, before prompting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSettings {
    /// Repository URLs, possibly empty
    pub repo_urls: Vec<String>,
    /// Organization identifier
    pub company_identifier: Option<String>,
    /// Lookback months
    pub months_back: Option<u32>,
    /// Working-copy directory
    pub deploy_dir: PathBuf,
    /// OpenAI API key
    pub openai_key: Option<String>,
}

impl Config {
    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// INI file to read: `-f`, else the default location if it exists
    #[must_use]
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.config_file
            .clone()
            .or_else(|| default_config_path().filter(|p| p.is_file()))
    }

    /// Load the INI file, logging and discarding any failure
    #[must_use]
    pub fn load_ini(&self) -> Option<IniSettings> {
        let path = self.config_file_path()?;
        match IniSettings::load(&path) {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded configuration file");
                Some(settings)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring configuration file");
                None
            }
        }
    }

    /// Merge the command line with INI settings
    #[must_use]
    pub fn merged(&self, ini: Option<&IniSettings>) -> MergedSettings {
        let ini = ini.cloned().unwrap_or_default();

        let repo_urls = ini
            .repo_urls
            .unwrap_or_else(|| self.repo_urls.as_deref().map(split_list).unwrap_or_default());
        let company_identifier = ini
            .company_identifier
            .or_else(|| self.company_identifier.as_deref().and_then(non_blank));
        let deploy_dir = self
            .deploy_dir
            .clone()
            .or(ini.deploy_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOY_DIR));
        let openai_key = ini
            .openai_apikey
            .or_else(|| self.openai_key.as_deref().and_then(non_blank));

        MergedSettings {
            repo_urls,
            company_identifier,
            months_back: ini.months_back.or(self.months_back),
            deploy_dir,
            openai_key,
        }
    }

    /// Produce a complete configuration, asking `prompter` for gaps
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required value is still missing or
    /// invalid after prompting.
    pub fn resolve(&self, prompter: &mut dyn Prompter) -> Result<ResolvedConfig, ConfigError> {
        let ini = self.load_ini();
        self.resolve_with(ini.as_ref(), prompter)
    }

    /// [`Config::resolve`] with already-loaded INI settings
    ///
    /// # Errors
    ///
    /// See [`Config::resolve`].
    pub fn resolve_with(
        &self,
        ini: Option<&IniSettings>,
        prompter: &mut dyn Prompter,
    ) -> Result<ResolvedConfig, ConfigError> {
        let merged = self.merged(ini);

        let repo_urls = if merged.repo_urls.is_empty() {
            prompter
                .ask("Enter comma-separated Git repository URLs: ")
                .map(|answer| split_list(&answer))
                .unwrap_or_default()
        } else {
            merged.repo_urls
        };
        if repo_urls.is_empty() {
            return Err(ConfigError::MissingRepoUrls);
        }

        let company_identifier = match merged.company_identifier {
            Some(identifier) => identifier,
            None => prompter
                .ask("Enter company identifier (e.g., '@mycompany.com' or 'My Company'): ")
                .as_deref()
                .and_then(non_blank)
                .ok_or(ConfigError::MissingCompanyIdentifier)?,
        };

        let months_back = match merged.months_back {
            Some(0) => return Err(ConfigError::InvalidMonths("0".to_string())),
            Some(months) => months,
            None => ask_months(prompter)?,
        };

        let summarizer = merged.openai_key.map(|key| {
            SummarizerConfig::new(key)
                .model(self.openai_model.as_deref().unwrap_or(DEFAULT_MODEL))
                .base_url(self.openai_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
        });

        let run = RunConfig {
            repo_urls,
            org_identifier: company_identifier,
            months_back,
            deploy_dir: merged.deploy_dir,
            limit: self.limit,
            ephemeral: self.ephemeral,
        };
        debug!(?run, summaries = summarizer.is_some(), "Resolved configuration");

        Ok(ResolvedConfig {
            run,
            summarizer,
            format: self.format,
            save_to_file: self.save_to_file.clone(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// INI file could not be used
    #[error("Failed to read configuration file {0}: {1}")]
    IniLoad(PathBuf, String),

    /// No repository URLs from any source
    #[error("No repository URLs provided")]
    MissingRepoUrls,

    /// No organization identifier from any source
    #[error("Company identifier cannot be empty")]
    MissingCompanyIdentifier,

    /// Months missing, zero, or not a number
    #[error("Invalid number of months: {0:?} (expected a positive integer)")]
    InvalidMonths(String),
}

/// `orgpulse/orgpulse.ini` under the platform config directory
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orgpulse").join("orgpulse.ini"))
}

/// Split a comma-separated list, dropping blank entries
#[must_use]
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn ask_months(prompter: &mut dyn Prompter) -> Result<u32, ConfigError> {
    let mut last = String::new();
    for _ in 0..MONTHS_ATTEMPTS {
        let Some(answer) = prompter.ask("Enter number of months back to analyze (e.g., 3): ") else {
            break;
        };
        match answer.parse::<u32>() {
            Ok(months) if months > 0 => return Ok(months),
            _ => {
                warn!(answer = %answer, "Months back must be a positive integer");
                last = answer;
            }
        }
    }
    Err(ConfigError::InvalidMonths(last))
}
