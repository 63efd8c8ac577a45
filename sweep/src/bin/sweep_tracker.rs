use bno055::{PortConfig, ScriptedTransport};
use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use sweep::{
    extremes_row, home_row, CsvRowSink, RowSink, SweepCommand, SweepConfig, SweepEvent,
    SweepReader,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Calibrates a BNO055 home pose, maps a sweep and checks live coverage.
///
/// Commands are read from stdin, one per line: `cal`, `map`, `stop`,
/// `live`, `idle`, `quit`.
#[derive(Parser)]
struct Args {
    #[clap(short, long, default_value = "/dev/ttyUSB0")]
    device: String,
    #[clap(short, long, default_value_t = 9600)]
    baud_rate: u32,
    /// Replay a captured line stream instead of opening the port.
    #[clap(long)]
    replay: Option<PathBuf>,
    /// Append the home reference and mapped extremes to this CSV file.
    #[clap(long)]
    export: Option<PathBuf>,
    #[clap(long, default_value_t = 100)]
    sampling_rate: usize,
    #[clap(long, default_value_t = 10)]
    window_size: usize,
    /// Seconds of data averaged into the home reference.
    #[clap(long, default_value_t = 3)]
    calibration_length: usize,
    #[clap(long, default_value_t = 10)]
    sample_delay: usize,
    #[clap(long, default_value_t = 100)]
    warmup_count: usize,
    /// Exit as soon as a live sweep reaches full coverage.
    #[clap(long)]
    exit_on_coverage: bool,
}

fn parse_command(input: &str) -> Option<SweepCommand> {
    match input.trim() {
        "cal" | "calibrate" => Some(SweepCommand::StartCalibration),
        "map" => Some(SweepCommand::StartMapping),
        "stop" => Some(SweepCommand::StopMapping),
        "live" => Some(SweepCommand::StartLive),
        "idle" => Some(SweepCommand::StopLive),
        "quit" | "q" => Some(SweepCommand::Stop),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = SweepConfig {
        sampling_rate: args.sampling_rate,
        window_size: args.window_size,
        calibration_length: args.calibration_length,
        sample_delay: args.sample_delay,
        warmup_count: args.warmup_count,
        ..SweepConfig::default()
    };

    let reader = match &args.replay {
        Some(path) => {
            info!("Replaying {}", path.display());
            let transport = ScriptedTransport::from_reader(BufReader::new(File::open(path)?))?;
            SweepReader::with_transport(transport, config)?
        }
        None => {
            let port = PortConfig {
                device: args.device.clone(),
                baud_rate: args.baud_rate,
                read_timeout: Duration::from_secs(1),
            };
            info!("Attempting to connect to {} at {} baud...", port.device, port.baud_rate);
            SweepReader::new(&port, config)?
        }
    };

    let mut sink = match &args.export {
        Some(path) => Some(CsvRowSink::append_to(path)?),
        None => None,
    };

    let commands = reader.command_sender();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                None => eprintln!("Unknown command {:?} (cal, map, stop, live, idle, quit)", line),
            }
        }
    });

    for event in reader.events() {
        match event {
            SweepEvent::CalibrationStarted => println!("Calibrating... hold the sensor still"),
            SweepEvent::CalibrationProgress(p) => print!("\rCalibration {:>3}%", p),
            SweepEvent::CalibrationComplete(home) => {
                println!("\nCalibration complete. Home angles {}", home.angles());
                if let Some(sink) = sink.as_mut() {
                    sink.append_row(&home_row(&home))?;
                }
            }
            SweepEvent::Angles(a) => {
                println!("Angles: X: {:>9.3} Y: {:>9.3} Z: {:>9.3}", a.x, a.y, a.z)
            }
            SweepEvent::MappingStarted => println!("Mapping sweep started"),
            SweepEvent::ExtremesComputed(extremes) => {
                for e in &extremes {
                    println!(
                        "{}: {:?} min {:.3} max {:.3} span {:.3}",
                        e.axis, e.indicator, e.min, e.max, e.extremes_diff
                    );
                }
                if let Some(sink) = sink.as_mut() {
                    sink.append_row(&extremes_row(&extremes))?;
                }
            }
            SweepEvent::LiveStarted => println!("Live coverage sweep started"),
            SweepEvent::Coverage(state) => println!("Coverage: {}", state),
            SweepEvent::CoverageComplete => {
                println!("Coverage complete");
                if args.exit_on_coverage {
                    reader.stop();
                }
            }
            SweepEvent::LineRejected(reason) => warn!("Skipped line: {}", reason),
            SweepEvent::Rejected { command, reason } => {
                warn!("{:?} rejected: {}", command, reason)
            }
            SweepEvent::Failed(reason) => eprintln!("Tracking failed: {}", reason),
            SweepEvent::Stopped => break,
        }
    }

    reader.join()?;
    Ok(())
}
