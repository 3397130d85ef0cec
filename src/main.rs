use std::env::temp_dir;
use std::fs;
use std::io::stdout;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use backtrace::Backtrace;
use clap::Parser;
use dirs::home_dir;
use flume::Sender;
use smol::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use smol::stream::StreamExt;
use smol::Unblock;

use navsync::config;
use navsync::HistoryControl;

mod cmd;
mod console;
mod journal;
mod store;

use crate::cmd::Cmd;
use crate::console::Console;
use crate::store::Store;

/// Simulates a client session against the history synchronizer.
#[derive(Parser)]
#[clap(version, author)]
struct Opts {
    /// Configuration file; defaults to ~/.config/navsync/config.toml
    #[clap(long)]
    config: Option<PathBuf>,
    /// Overrides the configured history size
    #[clap(long)]
    history_size: Option<usize>,
    /// Reads commands from this file instead of stdin
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    let default_path = home_dir().map(|home| home.join(".config/navsync/config.toml"));
    let mut config = config::load(opts.config.as_deref(), default_path)?;
    if let Some(size) = opts.history_size {
        config.history_size = size;
    }

    if config.debug {
        let temp_path = temp_dir();
        let path = temp_path.join("navsync.log");
        let log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let writer = Mutex::new(log_file);
        tracing_subscriber::fmt()
            .pretty()
            .with_writer(writer)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    panic::set_hook(Box::new(|e| {
        tracing::error!("{:?}", Backtrace::new());
        tracing::error!("{}", e);
    }));

    smol::block_on(async {
        let (tx, rx) = flume::unbounded();
        let reader = smol::spawn(read_commands(opts.script, tx));

        let control = HistoryControl::from_config(&config, Console::new(stdout()));
        let mut store = Store::new(rx, control);
        store.run().await;

        match reader.cancel().await {
            Some(result) => result,
            None => Ok(()),
        }
    })
}

async fn read_commands(script: Option<PathBuf>, tx: Sender<Cmd>) -> Result<()> {
    let input: Box<dyn AsyncBufRead + Unpin + Send> = match script {
        Some(path) => Box::new(BufReader::new(smol::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(Unblock::new(std::io::stdin()))),
    };

    let mut lines = input.lines();
    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let parsed = cmd::parse(&line).map(|(_, cmd)| cmd);
        match parsed {
            Ok(cmd) => {
                if tx.send_async(cmd).await.is_err() {
                    break;
                }
            }
            Err(_) => {
                tracing::warn!(line = %line, "unrecognized command");
                eprintln!("unrecognized command: {}", line);
            }
        }
    }
    Ok(())
}
