use bno055::{LineParser, LineTransport, PortConfig, SerialLineTransport};
use clap::Parser;
use std::io;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Dumps the raw line stream of a BNO055 bridge board.
#[derive(Parser)]
struct Args {
    #[clap(short, long, default_value = "/dev/ttyUSB0")]
    device: String,
    #[clap(short, long, default_value_t = 9600)]
    baud_rate: u32,
    /// Print the decoded angles and accelerations instead of the raw line.
    #[clap(short, long)]
    parse: bool,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = PortConfig {
        device: args.device,
        baud_rate: args.baud_rate,
        read_timeout: Duration::from_secs(1),
    };

    info!("Attempting to connect to {} at {} baud...", config.device, config.baud_rate);
    let mut transport = SerialLineTransport::open(&config).map_err(|e| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("Failed to connect to {}: {}", config.device, e),
        )
    })?;

    let mut parser = LineParser::new();
    println!("Press Ctrl+C to exit");

    loop {
        match transport.read_line() {
            Ok(Some(line)) if args.parse => match parser.parse(&line) {
                Ok(Some(sample)) => println!(
                    "#{: <6} angle: {} acc: {}",
                    sample.seq,
                    sample.angles(),
                    sample.acceleration()
                ),
                Ok(None) => println!("{}", line),
                Err(e) => warn!("Skipping line: {}", e),
            },
            Ok(Some(line)) => println!("{}", line),
            Ok(None) => continue,
            Err(e) => {
                let _ = transport.close();
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Error reading from IMU: {}", e),
                ));
            }
        }
    }
}
