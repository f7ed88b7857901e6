// glrestore/src/config/mod.rs
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::SpeedTier;

pub const DEFAULT_REPORT_PATH: &str = "glrestore_report.csv";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const POLL_INTERVAL_ENV: &str = "GLRESTORE_POLL_INTERVAL";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about = "Restore objects from S3 Glacier and Deep Archive")]
pub struct Args {
    /// S3 URIs, prefixes, wildcards (s3://bucket/prefix*) or local files listing S3 URIs one per line
    #[arg(short = 'f', long = "files", num_args = 1.., required = true)]
    pub files: Vec<String>,

    /// Number of days restored copies remain available
    #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(i32).range(1..))]
    pub days: i32,

    /// Restore speed tier
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = SpeedTier::Expedited)]
    pub speed: SpeedTier,

    /// AWS credentials profile
    #[arg(long)]
    pub profile: Option<String>,

    /// AWS region (defaults to the profile or environment region)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint URL
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Only report object status and cost; issue no restore requests
    #[arg(long)]
    pub report: bool,

    /// Path of the CSV report written in report mode
    #[arg(short, long, default_value = DEFAULT_REPORT_PATH)]
    pub output: PathBuf,

    /// Wait until all requested restores have completed
    #[arg(long)]
    pub wait: bool,

    /// Seconds between status polls while waiting (overrides GLRESTORE_POLL_INTERVAL)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up waiting after this many polls (default: wait indefinitely)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_polls: Option<u32>,

    /// What to do when an object's metadata cannot be read
    #[arg(long, value_enum, default_value_t = ClassifyErrorPolicy::Abort)]
    pub on_classify_error: ClassifyErrorPolicy,

    /// Verbose diagnostic output
    #[arg(long)]
    pub debug: bool,
}

/// How a failed metadata query during classification is handled.
/// Restore requests are always best-effort, independently of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifyErrorPolicy {
    /// Stop the run with an error.
    Abort,
    /// Log a warning and leave the object out of the table.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePolicy {
    pub days: i32,
    pub speed: SpeedTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Write the classification table to `output` and stop.
    Report { output: PathBuf },
    /// Issue restore requests, then optionally poll until they finish.
    Restore { wait: Option<PollSettings> },
}

/// Everything a run needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inputs: Vec<String>,
    pub policy: RestorePolicy,
    pub store: StoreSettings,
    pub mode: RunMode,
    pub classify_errors: ClassifyErrorPolicy,
    pub debug: bool,
}

impl AppConfig {
    /// Parse CLI args and merge environment fallbacks.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        let env_interval = match env::var(POLL_INTERVAL_ENV) {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .with_context(|| format!("parsing {} value `{}`", POLL_INTERVAL_ENV, value))?,
            ),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context(format!("reading {}", POLL_INTERVAL_ENV)),
        };
        Ok(Self::from_args(args, env_interval))
    }

    pub fn from_args(args: Args, env_poll_interval: Option<u64>) -> Self {
        let mode = if args.report {
            RunMode::Report {
                output: args.output,
            }
        } else {
            let interval_secs = args
                .poll_interval
                .or(env_poll_interval)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
            RunMode::Restore {
                wait: args.wait.then(|| PollSettings {
                    interval: Duration::from_secs(interval_secs),
                    max_polls: args.max_polls,
                }),
            }
        };

        Self {
            inputs: args.files,
            policy: RestorePolicy {
                days: args.days,
                speed: args.speed,
            },
            store: StoreSettings {
                profile: args.profile,
                region: args.region,
                endpoint_url: args.endpoint_url,
            },
            mode,
            classify_errors: args.on_classify_error,
            debug: args.debug,
        }
    }

    /// Tracing filter directive used when RUST_LOG is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "glrestore=debug,aws_config=info"
        } else {
            "glrestore=info"
        }
    }
}
