//! ringbuf-demo - Producer/consumer hand-off through a bounded ring buffer.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use giztoy_ringbuf::{Config, Error, FullPolicy, RingBuffer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CAPACITY: usize = 10;

/// Producer/consumer hand-off through a bounded ring buffer.
///
/// One producer thread enqueues "Item 0".."Item N-1", one consumer thread
/// dequeues N items, and both print the buffer after every step.
#[derive(Parser, Debug)]
#[command(name = "ringbuf-demo")]
#[command(about = "Producer/consumer demo for a bounded ring buffer")]
#[command(version)]
struct Args {
    /// YAML config file with `capacity` and `full_policy`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Buffer capacity (overrides the config file, default 10)
    #[arg(short = 'n', long)]
    capacity: Option<usize>,

    /// Full policy: reject, overwrite or block (overrides the config file)
    #[arg(short, long)]
    policy: Option<FullPolicy>,

    /// Number of items to hand off
    #[arg(long, default_value_t = 10)]
    items: usize,

    /// Back-off between retries when full or empty, in milliseconds
    #[arg(long, default_value_t = 100)]
    retry_ms: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = load_config(&args)?;
    info!(
        capacity = config.capacity,
        policy = %config.full_policy,
        items = args.items,
        "starting hand-off"
    );

    let buf = RingBuffer::<String>::with_config(config)?;
    let retry = Duration::from_millis(args.retry_ms);

    let producer = {
        let buf = buf.clone();
        let items = args.items;
        thread::spawn(move || produce(&buf, items, retry))
    };
    let consumer = {
        let buf = buf.clone();
        let items = args.items;
        thread::spawn(move || consume(&buf, items, retry))
    };

    let produced = producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))?;
    let consumed = consumer
        .join()
        .map_err(|_| anyhow!("consumer thread panicked"))?;
    buf.close();

    produced.context("producer failed")?;
    let taken = consumed.context("consumer failed")?;
    if buf.dropped() > 0 {
        warn!(dropped = buf.dropped(), "items were overwritten before being taken");
    }
    info!(taken, "hand-off finished");
    Ok(())
}

/// Loads the config file, if any, and applies command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_yaml::from_str::<Config>(&data)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Config::new(DEFAULT_CAPACITY),
    };
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(policy) = args.policy {
        config.full_policy = policy;
    }
    config.validate()?;
    Ok(config)
}

fn produce(buf: &RingBuffer<String>, items: usize, retry: Duration) -> Result<()> {
    for i in 0..items {
        let mut item = format!("Item {}", i);
        loop {
            match buf.put(item) {
                Ok(()) => break,
                Err(rejected) if rejected.kind() == Error::BufferFull => {
                    debug!(item = i, "buffer full, retrying");
                    item = rejected.into_inner();
                    thread::sleep(retry);
                }
                Err(rejected) => bail!("put Item {}: {}", i, rejected),
            }
        }
        println!("Added: Item {}; Buffer: {}", i, buf);
    }
    Ok(())
}

fn consume(buf: &RingBuffer<String>, items: usize, retry: Duration) -> Result<usize> {
    let mut taken = 0;
    while taken < items {
        match buf.get() {
            Ok(Some(item)) => {
                taken += 1;
                println!("Taken: {}; Buffer: {}", item, buf);
            }
            Ok(None) => {
                // With the overwrite policy the producer may finish before
                // we have seen every item.
                if buf.policy() == FullPolicy::Overwrite
                    && buf.dropped() as usize + taken >= items
                {
                    break;
                }
                thread::sleep(retry);
            }
            Err(Error::Closed) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(taken)
}
