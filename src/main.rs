#[macro_use]
extern crate log;
extern crate chrono;
extern crate clap;
extern crate fern;
extern crate soft_i2c;

use std::process;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use soft_i2c::port::RpiBus;
use soft_i2c::{Error, Flags, SoftI2c};

const PIN_SCL: u8 = 5; // GPIO 5
const PIN_SDA: u8 = 6; // GPIO 6

const DEFAULT_DELAY_US: u16 = 5;

#[derive(Debug, Parser)]
#[command(name = "soft-i2c", version, about = "Bit-banged I2C master on Raspberry Pi GPIO")]
struct Cli {
    /// BCM number of the data line.
    #[arg(long, default_value_t = PIN_SDA)]
    sda: u8,
    /// BCM number of the clock line.
    #[arg(long, default_value_t = PIN_SCL)]
    scl: u8,
    /// Delay unit in microseconds; one unit per clock period.
    #[arg(long, default_value_t = DEFAULT_DELAY_US)]
    delay_us: u16,
    /// More output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write bytes to a device.
    Send {
        #[arg(value_parser = parse_address)]
        address: u16,
        #[arg(value_parser = parse_byte, required = true)]
        data: Vec<u8>,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Read bytes from a device.
    Recv {
        #[arg(value_parser = parse_address)]
        address: u16,
        length: usize,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Write bytes, then read after a repeated start.
    WriteRead {
        #[arg(value_parser = parse_address)]
        address: u16,
        #[arg(long, value_parser = parse_byte, num_args = 1.., required = true)]
        tx: Vec<u8>,
        #[arg(long)]
        length: usize,
    },
    /// Write two buffers under a single address phase.
    WriteWrite {
        #[arg(value_parser = parse_address)]
        address: u16,
        #[arg(long, value_parser = parse_byte, num_args = 1.., required = true)]
        first: Vec<u8>,
        #[arg(long, value_parser = parse_byte, num_args = 1.., required = true)]
        second: Vec<u8>,
    },
    /// List the 7-bit addresses that acknowledge.
    Scan,
}

#[derive(Debug, Args)]
struct FlagArgs {
    /// Treat the address as 10 bits wide.
    #[arg(long)]
    ten_bit: bool,
    /// Keep going when the device does not acknowledge.
    #[arg(long)]
    ignore_nack: bool,
    /// Do not acknowledge received bytes.
    #[arg(long)]
    no_read_ack: bool,
}

impl FlagArgs {
    fn flags(&self) -> Flags {
        let mut flags = Flags::WRITE;
        if self.ten_bit {
            flags |= Flags::ADDR_10BIT;
        }
        if self.ignore_nack {
            flags |= Flags::IGNORE_NACK;
        }
        if self.no_read_ack {
            flags |= Flags::NO_READ_ACK;
        }
        flags
    }
}

fn parse_number(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", value, e))
}

fn parse_address(value: &str) -> Result<u16, String> {
    let address = parse_number(value)?;
    if address > 0x3ff {
        return Err(format!("address {:#x} does not fit in 10 bits", address));
    }
    Ok(address as u16)
}

fn parse_byte(value: &str) -> Result<u8, String> {
    let byte = parse_number(value)?;
    if byte > 0xff {
        return Err(format!("{:#x} is not a byte", byte));
    }
    Ok(byte as u8)
}

fn setup_logger(verbose: u8) -> Result<(), Error> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.6f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn print_bytes(bytes: &[u8]) {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:#04x}", b)).collect();
    println!("{}", hex.join(" "));
}

fn check(bus: &mut RpiBus, serviced: usize, requested: usize) -> Result<(), Error> {
    if serviced == requested {
        return Ok(());
    }

    Err(bus.take_error().unwrap_or_else(|| {
        Error::Generic(format!("serviced {} of {} messages", serviced, requested))
    }))
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut bus = RpiBus::new(cli.sda, cli.scl, cli.delay_us)?;

    match cli.command {
        Command::Send { address, data, flags } => {
            let serviced = SoftI2c::new(&mut bus).send(address, flags.flags(), &data);
            check(&mut bus, serviced, 1)
        }
        Command::Recv { address, length, flags } => {
            let mut buf = vec![0u8; length];
            let serviced = SoftI2c::new(&mut bus).recv(address, flags.flags(), &mut buf);
            check(&mut bus, serviced, 1)?;
            print_bytes(&buf);
            Ok(())
        }
        Command::WriteRead { address, tx, length } => {
            let mut rx = vec![0u8; length];
            let serviced = SoftI2c::new(&mut bus).send_then_recv(address, &tx, &mut rx);
            check(&mut bus, serviced, 2)?;
            print_bytes(&rx);
            Ok(())
        }
        Command::WriteWrite { address, first, second } => {
            let serviced = SoftI2c::new(&mut bus).send_then_send(address, &first, &second);
            check(&mut bus, serviced, 2)
        }
        Command::Scan => {
            for address in SoftI2c::new(&mut bus).scan() {
                println!("{:#04x}", address);
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = setup_logger(cli.verbose) {
        eprintln!("Error: {}", error);
        process::exit(1);
    }

    trace!("Parsed arguments: {:?}", cli);

    match run(cli) {
        Ok(()) => {}
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}
