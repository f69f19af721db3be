//! Marcload CLI - register catalogued media files in a Onedata space
//!
//! ```bash
//! marcload -H provider.example.org -s $SPACE_ID -S $STORAGE_ID -t $TOKEN \
//!     -c https://catalog.example.org/record/1/export/marcxml \
//!     -c https://catalog.example.org/record/2/export/marcxml \
//!     -l 100
//! ```
//!
//! The host and token may also come from `ONEDATA_HOST` / `ONEDATA_TOKEN`,
//! including via a `.env` file.

use std::time::Duration;

use clap::Parser;
use marcload::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use marcload::logs::log_info;
use marcload::{
    CollectionErrorPolicy, FileMode, Registrar, RegistrationConfig, RunOptions, DEFAULT_FILE_MODE,
};

#[derive(Parser)]
#[command(name = "marcload")]
#[command(about = "Register files in the Onedata system", long_about = None)]
struct Cli {
    /// Oneprovider host.
    #[arg(short = 'H', long, env = "ONEDATA_HOST")]
    host: String,

    /// Id of the space in which the files will be registered.
    #[arg(short = 's', long)]
    space_id: String,

    /// Id of the storage on which the files are located. Storage must be created as an
    /// `imported` storage with path type equal to `canonical`.
    #[arg(short = 'S', long)]
    storage_id: String,

    /// Onedata access token.
    #[arg(short = 't', long, env = "ONEDATA_TOKEN", hide_env_values = true)]
    token: String,

    /// Open data collection URL. Many collections can be passed (e.g. `-c URL1 -c URL2`).
    #[arg(short = 'c', long = "collection-url", required = true)]
    collections: Vec<String>,

    /// POSIX mode with which files will be registered, represented as an octal string.
    #[arg(short = 'm', long, default_value = DEFAULT_FILE_MODE)]
    file_mode: FileMode,

    /// Disable automatic detection of file attributes and verification whether file exists
    /// on storage. Faster, but files missing from storage get registered anyway and will be
    /// visible in the space but not accessible.
    #[arg(short = 'd', long)]
    disable_auto_detection: bool,

    /// Log after registering every N files.
    #[arg(short = 'l', long)]
    logging_frequency: Option<u64>,

    /// Disable verification of the provider's SSL certificate.
    #[arg(short = 'k', long)]
    disable_cert_verification: bool,

    /// Timeout of each network call, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Timeout for establishing a connection, in seconds.
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Keep going with the next collection when one cannot be processed.
    #[arg(long)]
    continue_on_error: bool,
}

impl Cli {
    fn registration_config(&self) -> RegistrationConfig {
        RegistrationConfig::new(&self.host, &self.space_id, &self.storage_id, &self.token)
            .with_file_mode(self.file_mode.clone())
            .with_auto_detection(!self.disable_auto_detection)
            .with_certificate_verification(!self.disable_cert_verification)
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            logging_frequency: self.logging_frequency,
            timeout: Duration::from_secs(self.timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            error_policy: if self.continue_on_error {
                CollectionErrorPolicy::Continue
            } else {
                CollectionErrorPolicy::Abort
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registrar = Registrar::new(cli.registration_config(), cli.run_options())?;

    log_info(format!(
        "Registering files from {} collection(s) in space {}",
        cli.collections.len(),
        cli.space_id
    ));

    registrar.run(&cli.collections).await?;
    Ok(())
}
