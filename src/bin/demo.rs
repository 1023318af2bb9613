//! Concurrent register-read harness
//!
//! Starts one session and fans several reader tasks out over it: input
//! blocks X0..X3, output blocks Y0..Y3, and a data register, printing the
//! decoded bit fields. Exercises many producers against the single worker.

use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use fx_link::{logging, FxSerial, SerialConfig};

#[derive(Parser)]
#[command(name = "demo", about = "Read FX input/output blocks and data registers concurrently")]
struct Args {
    /// Serial device path
    #[arg(default_value = "/dev/ttyUSB0")]
    device: String,

    /// Baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Data bits (7 or 8)
    #[arg(long, default_value_t = 7)]
    data_bits: u8,

    /// Parity (None, Even, Odd)
    #[arg(long, default_value = "Even")]
    parity: String,

    /// Data register to read
    #[arg(long, default_value_t = 123)]
    register: u16,
}

fn print_bits(label: &str, block: u16, value: u16) {
    // The block's eight bits ride in the high byte of the decoded word.
    let bits = (value >> 8) & 0xFF;
    println!("{label}{block} = {bits:#04X}");
    for bit in 0..8 {
        println!("  {}{block}[{bit}] = {}", label.to_lowercase(), (bits >> bit) & 1);
    }
}

#[tokio::main]
async fn main() -> fx_link::Result<()> {
    let args = Args::parse();
    logging::init_logger("logs", "fx-demo", "info", true)?;

    let config = SerialConfig {
        port: args.device,
        baud_rate: args.baud,
        data_bits: args.data_bits,
        stop_bits: 1,
        parity: args.parity,
    };
    let session = Arc::new(FxSerial::start(config).await?);

    let mut tasks = Vec::new();

    for block in 0..4u16 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            match session.read_input_block(block).await {
                Ok(value) => print_bits("X", block, value),
                Err(e) => eprintln!("X{block}: {e}"),
            }
        }));
    }

    for block in 0..4u16 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            match session.read_output_block(block).await {
                Ok(value) => print_bits("Y", block, value),
                Err(e) => eprintln!("Y{block}: {e}"),
            }
        }));
    }

    {
        let session = session.clone();
        let register = args.register;
        tasks.push(tokio::spawn(async move {
            match session.read_data_register(register).await {
                Ok(value) => println!("D{register} = {value:#06X}"),
                Err(e) => eprintln!("D{register}: {e}"),
            }
        }));
    }

    join_all(tasks).await;

    println!("link stats: {:?}", session.stats());

    if let Ok(session) = Arc::try_unwrap(session) {
        session.stop().await?;
    }
    Ok(())
}
