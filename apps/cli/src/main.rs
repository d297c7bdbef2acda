//! chainvid entry point.

mod config;
mod keys;
mod prompt;
mod transcode;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chainvid_fees::{FeeGate, RpcFeeSource};
use chainvid_ledger::{LedgerClient, RecordMetadata, RpcLedgerClient};
use chainvid_progress::{FileProgressStore, ProgressStore};
use chainvid_uploader::{UploadEvent, Uploader};

use config::{Config, Network};
use prompt::ResumeDecision;

#[derive(Parser)]
#[command(name = "chainvid", version, about = "Upload videos to an immutable ledger, chunk by chunk")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured network.
    #[arg(long, global = true, value_enum)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcode a video and upload it, resuming if an upload is in flight.
    Upload {
        /// Input video file; prompted for when omitted.
        video: Option<PathBuf>,

        /// Output height in pixels; prompted for when omitted.
        #[arg(long)]
        height: Option<u32>,
    },

    /// Project upload costs for a given chunk count without uploading.
    Estimate {
        /// Number of chunks.
        chunks: u32,

        /// Ceiling price in gwei for the capped-profile figure.
        #[arg(long)]
        max_price_gwei: Option<f64>,
    },

    /// Show the state of the in-flight upload, if any.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        network = config.network.label(),
        "starting chainvid"
    );

    match cli.command {
        Command::Upload { video, height } => upload(&config, video, height).await,
        Command::Estimate {
            chunks,
            max_price_gwei,
        } => estimate(&config, chunks, max_price_gwei).await,
        Command::Status => status(&config),
    }
}

fn fee_gate(config: &Config, http: &reqwest::Client) -> FeeGate {
    let endpoints = config.endpoints();
    let source = RpcFeeSource::new(
        http.clone(),
        endpoints.fee_feed_url.clone(),
        endpoints.rpc_url.clone(),
    );
    FeeGate::new(Arc::new(source), config.fee_limits())
}

async fn upload(
    config: &Config,
    video: Option<PathBuf>,
    height: Option<u32>,
) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let store = Arc::new(FileProgressStore::new(&config.staging_dir));

    if let Some(record) = store.load()? {
        return resume(config, &http, store, record).await;
    }

    // Fresh start: transcode, stage, estimate, confirm, upload.
    let video = match video {
        Some(path) => path,
        None => prompt::video_path()?,
    };
    let filename = video
        .file_name()
        .and_then(|n| n.to_str())
        .context("video path has no file name")?
        .to_string();
    let height = match height {
        Some(h) => h,
        None => prompt::output_height()?,
    };

    let bytes = transcode::transcode(&video, height).await?;
    let chunks = chainvid_chunks::segment(&bytes, config.chunk_size);
    println!("Video chunked into {} parts.", chunks.len());

    chainvid_chunks::persist(&chunks, &config.staging_dir, &filename)?;

    let gate = fee_gate(config, &http);
    let base_price_wei = gate.gas_price().await.context("reading current price")?;
    let native_price = chainvid_fees::fetch_native_price(&http)
        .await
        .context("fetching spot price")?;

    let (profile, cost) = prompt::select_profile(chunks.len() as u32, base_price_wei, native_price)?;
    if !prompt::confirm_cost(profile, &cost)? {
        println!("Upload cancelled.");
        store.clear()?;
        return Ok(());
    }

    let meta = RecordMetadata {
        filename,
        duration_secs: 0,
        metadata: serde_json::json!({
            "codec": "video/mp4; codecs=\"avc1.64002A, mp4a.40.5\""
        })
        .to_string(),
    };

    let ledger = ledger_client(config, &http)?;
    let mut uploader = Uploader::new(ledger, gate, store, profile);
    let printer = spawn_event_printer(&mut uploader);
    hook_interrupt(&uploader);

    let result = uploader.run_fresh(&meta, &chunks).await;
    drop(uploader);
    let _ = printer.await;
    finish(result)
}

async fn resume(
    config: &Config,
    http: &reqwest::Client,
    store: Arc<FileProgressStore>,
    record: chainvid_progress::ProgressRecord,
) -> anyhow::Result<()> {
    let chunks =
        chainvid_chunks::load(&config.staging_dir, &record.filename, record.total_chunks)?;

    match prompt::confirm_resume(&record, &chunks)? {
        ResumeDecision::Resume => {}
        ResumeDecision::Decline => {
            println!("Upload cancelled.");
            return Ok(());
        }
        ResumeDecision::Mismatch => {
            bail!(
                "the staged chunk does not match the ledger. This usually happens when a \
                 submission landed but its confirmation was never observed. Edit the \
                 lastUploadedChunk value in {} and make sure you have no pending \
                 transactions before retrying.",
                config
                    .staging_dir
                    .join(chainvid_progress::PROGRESS_FILE)
                    .display()
            );
        }
    }

    let remaining = record.total_chunks - record.next_chunk();
    let gate = fee_gate(config, http);
    let base_price_wei = gate.gas_price().await.context("reading current price")?;
    let native_price = chainvid_fees::fetch_native_price(http)
        .await
        .context("fetching spot price")?;

    let (profile, cost) = prompt::select_profile(remaining, base_price_wei, native_price)?;
    if !prompt::confirm_cost(profile, &cost)? {
        println!("Upload cancelled.");
        return Ok(());
    }

    let ledger = ledger_client(config, http)?;
    let mut uploader = Uploader::new(ledger, gate, store, profile);
    let printer = spawn_event_printer(&mut uploader);
    hook_interrupt(&uploader);

    let result = uploader.resume(record, &chunks).await;
    drop(uploader);
    let _ = printer.await;
    finish(result)
}

async fn estimate(
    config: &Config,
    chunks: u32,
    max_price_gwei: Option<f64>,
) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let gate = fee_gate(config, &http);
    let base_price_wei = gate.gas_price().await.context("reading current price")?;
    let native_price = chainvid_fees::fetch_native_price(&http)
        .await
        .context("fetching spot price")?;

    let cost = chainvid_fees::project_costs(chunks, base_price_wei, native_price, max_price_gwei);
    println!(
        "Current price: {} gwei",
        chainvid_rpc::wei_to_gwei(base_price_wei)
    );
    prompt::print_figure("Instant", cost.instant);
    prompt::print_figure("Paced", cost.paced);
    if let Some(capped) = cost.capped {
        prompt::print_figure("Capped", capped);
    }
    Ok(())
}

fn status(config: &Config) -> anyhow::Result<()> {
    let store = FileProgressStore::new(&config.staging_dir);
    match store.load()? {
        Some(record) => {
            println!("In-flight upload: {}", record.filename);
            println!(
                "Progress: {}/{} chunks confirmed",
                record.next_chunk(),
                record.total_chunks
            );
            if let Some(record_id) = &record.record_id {
                println!("Record id: {record_id}");
            }
        }
        None => println!("No upload in flight."),
    }
    Ok(())
}

fn ledger_client(
    config: &Config,
    http: &reqwest::Client,
) -> anyhow::Result<Arc<dyn LedgerClient>> {
    let key = keys::acquire_signing_key()?;
    let endpoints = config.endpoints();
    Ok(Arc::new(RpcLedgerClient::new(
        http.clone(),
        endpoints.rpc_url.clone(),
        endpoints.contract_address.clone(),
        key,
    )))
}

fn spawn_event_printer(uploader: &mut Uploader) -> tokio::task::JoinHandle<()> {
    // Taken before the run starts; take_events only succeeds once.
    let Some(mut rx) = uploader.take_events() else {
        return tokio::spawn(async {});
    };
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::RecordCreated { record_id, tx_hash } => {
                    println!("Record {record_id} created ({tx_hash})");
                }
                UploadEvent::ChunkSubmitting { index, total } => {
                    println!("Submitting chunk {}/{total}...", index + 1);
                }
                UploadEvent::ChunkConfirmed {
                    index,
                    total,
                    tx_hash,
                } => {
                    println!("Chunk {}/{total} confirmed ({tx_hash})", index + 1);
                }
                UploadEvent::Completed => {
                    println!("Upload complete.");
                }
            }
        }
    })
}

fn hook_interrupt(uploader: &Uploader) {
    let cancel = uploader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current chunk");
            cancel.cancel();
        }
    });
}

fn finish(result: Result<(), chainvid_uploader::UploadError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(chainvid_uploader::UploadError::Cancelled) => {
            println!("Upload paused. Run `chainvid upload` again to resume.");
            Ok(())
        }
        Err(error) => {
            eprintln!(
                "Upload halted: {error}. Progress is saved; verify the last confirmed chunk \
                 against the ledger before resuming."
            );
            Err(error.into())
        }
    }
}
