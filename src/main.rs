//! Azure blob samples: walks through append, block and page blobs.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use azure_blob_samples::{
    run, Args, AzureBlobStore, Config, EventSink, PayloadSource, RandomPayload, SilentSink,
    TimeoutStore, TracingSink,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug {
        Level::DEBUG
    } else if args.silent {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let silent = args.silent;
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let backend = match &config.endpoint {
        Some(endpoint) => AzureBlobStore::with_endpoint(&config.account, endpoint),
        None => AzureBlobStore::new(&config.account),
    };
    let store = TimeoutStore::new(backend, config.request_timeout);

    let payload: Box<dyn PayloadSource> = match config.seed {
        Some(seed) => Box::new(RandomPayload::seeded(seed)),
        None => Box::new(RandomPayload::new()),
    };
    let sink: Box<dyn EventSink> = if silent {
        Box::new(SilentSink)
    } else {
        Box::new(TracingSink)
    };

    match run(&config, &store, sink.as_ref(), payload.as_ref()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
