use bno055::{PortConfig, SerialLineTransport};
use clap::Parser;
use imu_traits::LineTransport;
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use sweep::{distance_row, CsvRowSink, DistanceAcquisition, RowSink, SweepConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Records rolling-averaged time-of-flight distances for one setup and
/// appends them as a row to a CSV file.
#[derive(Parser)]
struct Args {
    #[clap(short, long, default_value = "/dev/ttyUSB0")]
    device: String,
    #[clap(short, long, default_value_t = 115200)]
    baud_rate: u32,
    /// Measurement time in seconds.
    #[clap(short, long, default_value_t = 5)]
    time: u64,
    /// Target distance of this setup, in mm.
    #[clap(long, default_value_t = 50.0)]
    distance: f32,
    /// Target angle of this setup, in degrees.
    #[clap(long, default_value_t = 5.0)]
    angle: f32,
    #[clap(short, long, default_value = "tof_verification.csv")]
    output: PathBuf,
    #[clap(long, default_value_t = 10)]
    window_size: usize,
    #[clap(long, default_value_t = 10)]
    sample_delay: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = SweepConfig {
        window_size: args.window_size,
        sample_delay: args.sample_delay,
        ..SweepConfig::default()
    };
    let acquisition = DistanceAcquisition::new(&config, Duration::from_secs(args.time))?;

    let port = PortConfig {
        device: args.device,
        baud_rate: args.baud_rate,
        read_timeout: Duration::from_secs(1),
    };
    let mut transport = SerialLineTransport::open(&port)?;

    let running = AtomicBool::new(true);
    let result = acquisition.run(&mut transport, &running);
    transport.close()?;
    let averages = result?;

    let mut sink = CsvRowSink::append_to(&args.output)?;
    sink.append_row(&distance_row(args.distance as _, args.angle as _, &averages))?;
    info!("Data appended to {}", args.output.display());
    Ok(())
}
