//! Walkthrough configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SampleError, SampleResult};
use crate::models::{encode_block_id, validate_container_name, DEFAULT_CONTENT_TYPE, PAGE_SIZE};
use crate::storage::DEFAULT_REQUEST_TIMEOUT;

/// Default account name for development storage.
pub const DEFAULT_ACCOUNT: &str = "devstoreaccount1";

/// Default account key for development storage (base64 encoded).
pub const DEFAULT_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Default blob service port of the local emulator.
pub const DEFAULT_BLOB_PORT: u16 = 10000;

/// Environment variable holding the storage account name.
pub const ACCOUNT_NAME_VAR: &str = "ACCOUNT_NAME";

/// Environment variable holding the storage account key.
pub const ACCOUNT_KEY_VAR: &str = "ACCOUNT_KEY";

/// Command-line arguments for the walkthrough.
#[derive(Parser, Debug, Clone)]
#[command(name = "azure-blob-samples")]
#[command(about = "Walks through append, block and page blob operations")]
#[command(version)]
pub struct Args {
    /// Use the local storage emulator instead of ACCOUNT_NAME/ACCOUNT_KEY.
    #[arg(long)]
    pub emulator: bool,

    /// Blob service endpoint (defaults to the emulator address or the public cloud).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Container to create for the walkthrough.
    #[arg(long, default_value = "demoblobconatiner")]
    pub container: String,

    /// Name of the append blob.
    #[arg(long, default_value = "demoAppendBlob")]
    pub append_blob: String,

    /// Name of the block blob.
    #[arg(long, default_value = "demoBlockBlob")]
    pub block_blob: String,

    /// Name of the page blob.
    #[arg(long, default_value = "demoPageBlob")]
    pub page_blob: String,

    /// Directory receiving the downloaded blobs.
    #[arg(long, short = 'o', default_value = ".")]
    pub output_dir: PathBuf,

    /// Deadline for each storage call, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Seed for the generated payloads.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Clean up without waiting for confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Keep the container and the downloaded files.
    #[arg(long)]
    pub keep: bool,

    /// Enable debug logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Enable silent mode (minimal logging).
    #[arg(long, short = 's')]
    pub silent: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            emulator: false,
            endpoint: None,
            container: "demoblobconatiner".to_string(),
            append_blob: "demoAppendBlob".to_string(),
            block_blob: "demoBlockBlob".to_string(),
            page_blob: "demoPageBlob".to_string(),
            output_dir: PathBuf::from("."),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            seed: None,
            yes: false,
            keep: false,
            debug: false,
            silent: false,
        }
    }
}

/// Account configuration.
#[derive(Clone)]
pub struct AccountConfig {
    pub name: String,
    pub key: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl AccountConfig {
    /// Well-known development storage account.
    pub fn emulator() -> Self {
        Self {
            name: DEFAULT_ACCOUNT.to_string(),
            key: DEFAULT_ACCOUNT_KEY.to_string(),
        }
    }
}

/// Names and sizes for the append blob walkthrough.
#[derive(Debug, Clone)]
pub struct AppendSettings {
    pub blob: String,
    pub content_type: String,
    pub payload_len: usize,
    pub output_file: PathBuf,
}

/// Names and sizes for the block blob walkthrough.
#[derive(Debug, Clone)]
pub struct BlockSettings {
    pub blob: String,
    pub block_id: String,
    pub payload_len: usize,
    pub output_file: PathBuf,
}

/// Names and sizes for the page blob walkthrough.
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub blob: String,
    pub content_type: String,
    pub blob_len: u64,
    pub write_len: u64,
    pub output_file: PathBuf,
}

/// Fully resolved configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub account: AccountConfig,
    /// Custom blob endpoint; `None` means the public cloud.
    pub endpoint: Option<String>,
    pub emulator: bool,
    pub container: String,
    pub append: AppendSettings,
    pub block: BlockSettings,
    pub page: PageSettings,
    pub request_timeout: Duration,
    pub seed: Option<u64>,
    pub confirm_cleanup: bool,
    pub cleanup: bool,
}

impl Config {
    /// Sample defaults for the given account, writing into `output_dir`.
    pub fn new(account: AccountConfig, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            account,
            endpoint: None,
            emulator: false,
            container: "demoblobconatiner".to_string(),
            append: AppendSettings {
                blob: "demoAppendBlob".to_string(),
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                payload_len: 42,
                output_file: output_dir.join("appendBlob.txt"),
            },
            block: BlockSettings {
                blob: "demoBlockBlob".to_string(),
                block_id: encode_block_id("00000"),
                payload_len: 1984,
                output_file: output_dir.join("blockBlob.txt"),
            },
            page: PageSettings {
                blob: "demoPageBlob".to_string(),
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                blob_len: 5 * PAGE_SIZE,
                write_len: 3 * PAGE_SIZE,
                output_file: output_dir.join("pageBlob.txt"),
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            seed: None,
            confirm_cleanup: true,
            cleanup: true,
        }
    }

    /// Resolves arguments and the process environment into a configuration.
    pub fn from_args(args: Args) -> SampleResult<Self> {
        Self::from_args_with_env(args, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_args`], reading variables through `env`.
    pub fn from_args_with_env(
        args: Args,
        env: impl Fn(&str) -> Option<String>,
    ) -> SampleResult<Self> {
        let account = if args.emulator {
            AccountConfig::emulator()
        } else {
            AccountConfig {
                name: require_var(&env, ACCOUNT_NAME_VAR)?,
                key: require_var(&env, ACCOUNT_KEY_VAR)?,
            }
        };

        validate_container_name(&args.container)?;
        for blob in [&args.append_blob, &args.block_blob, &args.page_blob] {
            if blob.is_empty() || blob.len() > 1024 {
                return Err(SampleError::Config(format!(
                    "blob name '{}' must be between 1 and 1024 characters",
                    blob
                )));
            }
        }
        if args.timeout_secs == 0 {
            return Err(SampleError::Config(
                "timeout must be at least one second".to_string(),
            ));
        }

        let endpoint = match args.endpoint {
            Some(endpoint) => Some(parse_endpoint(&endpoint)?),
            None if args.emulator => Some(format!(
                "http://127.0.0.1:{}/{}",
                DEFAULT_BLOB_PORT, account.name
            )),
            None => None,
        };

        let mut config = Config::new(account, args.output_dir);
        config.endpoint = endpoint;
        config.emulator = args.emulator;
        config.container = args.container;
        config.append.blob = args.append_blob;
        config.block.blob = args.block_blob;
        config.page.blob = args.page_blob;
        config.request_timeout = Duration::from_secs(args.timeout_secs);
        config.seed = args.seed;
        config.confirm_cleanup = !args.yes;
        config.cleanup = !args.keep;
        Ok(config)
    }

    /// Local files produced by a run, in workflow order.
    pub fn output_files(&self) -> [&PathBuf; 3] {
        [
            &self.append.output_file,
            &self.block.output_file,
            &self.page.output_file,
        ]
    }
}

fn require_var(env: &impl Fn(&str) -> Option<String>, name: &str) -> SampleResult<String> {
    match env(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SampleError::Config(format!(
            "Missing environment variable {}",
            name
        ))),
    }
}

fn parse_endpoint(endpoint: &str) -> SampleResult<String> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| SampleError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(endpoint.trim_end_matches('/').to_string()),
        other => Err(SampleError::Config(format!(
            "endpoint scheme '{}' is not supported",
            other
        ))),
    }
}
