//! ZigTools command line.
//!
//! Usage:
//!   zigtools sniff --port /dev/ttyUSB0 --channel 15 --out capture.pcap
//!   zigtools replay --port /dev/ttyUSB0 --pcap capture.pcap --index 3
//!   zigtools dump --pcap capture.pcap
//!   zigtools next-channel --channel 26 --direction up

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zigtools_pcap::{CaptureReader, CaptureWriter};
use zigtools_protocol::{next_channel, pretty_hex, Direction, DEFAULT_CHANNEL};
use zigtools_runner::{
    CaptureFrameSink, FanoutSink, FnSink, Radio, RadioConfig, RadioError, RadioResult,
};

/// Talk to an 802.15.4 radio dongle over its serial link.
#[derive(Parser, Debug)]
#[command(name = "zigtools", version, about)]
struct Cli {
    /// YAML file with session settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the serial baud rate.
    #[arg(long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log received frames, optionally appending them to a capture file.
    Sniff {
        /// Serial port (e.g. /dev/ttyUSB0, COM3).
        #[arg(long)]
        port: String,
        /// Channel to listen on (11-26).
        #[arg(long, default_value_t = DEFAULT_CHANNEL)]
        channel: u8,
        /// Capture file to append to.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Transmit a frame taken from a capture file.
    Replay {
        /// Serial port.
        #[arg(long)]
        port: String,
        /// Capture file to read from.
        #[arg(long)]
        pcap: PathBuf,
        /// 1-based record number.
        #[arg(long)]
        index: usize,
        /// Channel to transmit on (11-26).
        #[arg(long, default_value_t = DEFAULT_CHANNEL)]
        channel: u8,
    },
    /// List the frames in a capture file.
    Dump {
        /// Capture file to read.
        #[arg(long)]
        pcap: PathBuf,
    },
    /// Print the neighboring channel.
    NextChannel {
        /// Current channel.
        #[arg(long)]
        channel: u8,
        /// `up` or `down`.
        #[arg(long, default_value = "up")]
        direction: Direction,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> RadioResult<RadioConfig> {
    let mut config = match &cli.config {
        Some(path) => RadioConfig::from_yaml_file(path)?,
        None => RadioConfig::default(),
    };
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    Ok(config)
}

fn run(cli: Cli) -> RadioResult<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Sniff { port, channel, out } => sniff(config, &port, channel, out),
        Command::Replay {
            port,
            pcap,
            index,
            channel,
        } => replay(config, &port, &pcap, index, channel),
        Command::Dump { pcap } => dump(&pcap),
        Command::NextChannel { channel, direction } => {
            println!("{}", next_channel(channel, direction));
            Ok(())
        }
    }
}

fn sniff(config: RadioConfig, port: &str, channel: u8, out: Option<PathBuf>) -> RadioResult<()> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .map_err(|e| RadioError::Config(format!("failed to install Ctrl-C handler: {}", e)))?;

    let log_sink = FnSink::new()
        .with_frames(|frame| {
            info!(
                len = frame.payload.len(),
                rssi = ?frame.rssi_percent(),
                "frame: {}",
                pretty_hex(frame.content(), 0)
            );
        })
        .with_commands(|response| {
            if response.is_ok() {
                info!("radio: {} ok", response.command);
            } else {
                warn!("radio: {} status 0x{:02X}", response.command, response.status);
            }
        });

    let mut radio = Radio::new(config);
    match out {
        Some(path) => {
            let capture = CaptureFrameSink::new(CaptureWriter::open(&path)?);
            radio.initialize(port, channel, FanoutSink(log_sink, capture))?;
        }
        None => radio.initialize(port, channel, log_sink)?,
    }
    info!("Listening on channel {}, Ctrl-C to stop", channel);

    while running.load(Ordering::SeqCst) && radio.is_active() {
        std::thread::sleep(Duration::from_millis(100));
    }

    if let Some(report) = radio.terminate() {
        info!("Stopped: {:?}", report.exit);
    }
    Ok(())
}

fn replay(
    config: RadioConfig,
    port: &str,
    pcap: &Path,
    index: usize,
    channel: u8,
) -> RadioResult<()> {
    let mut reader = CaptureReader::open(pcap)?;
    let frame = reader.get_frame(index)?;
    reader.close();

    let sink = FnSink::new().with_commands(|response| {
        info!("radio: {} status 0x{:02X}", response.command, response.status);
    });
    let mut radio = Radio::new(config);
    radio.initialize(port, channel, sink)?;
    radio.send_raw_frame(&frame)?;
    info!("Sent frame {} ({} bytes)", index, frame.payload.len());

    // Give the radio a moment to acknowledge before closing the port.
    std::thread::sleep(Duration::from_millis(200));
    radio.terminate();
    Ok(())
}

fn dump(pcap: &Path) -> RadioResult<()> {
    let mut reader = CaptureReader::open(pcap)?;
    for (i, record) in reader.frames()?.enumerate() {
        let (header, frame) = record?;
        let time = header
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "#{:<5} {} len={:<3}\n{}",
            i + 1,
            time,
            header.original_len,
            pretty_hex(frame.content(), 16)
        );
    }
    Ok(())
}
