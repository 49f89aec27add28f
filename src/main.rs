use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mbus_master::logging::init_logger_with_level;
use mbus_master::mbus::frame::{parse_frame, FrameParseOutcome};
use mbus_master::payload::data_encoding::mbus_hex2bin;
use mbus_master::xml::{mbus_frame_chain_xml, mbus_frame_xml};
use mbus_master::{
    MBusBaudRate, MBusHandle, PrimaryScanHit, ProbeResult, SecondaryMask,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mbus-master")]
#[command(about = "M-Bus master tools for reading utility meters")]
struct Cli {
    /// Enable debug tracing (frame dump on send/recv)
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping every primary address and list the devices that answer
    Scan {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        /// Serial device or host:port gateway
        device: String,
    },
    /// Scan for devices by secondary address
    ScanSecondary {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        /// 16 character address mask, F nibbles are wildcards
        #[arg(default_value = "FFFFFFFFFFFFFFFF")]
        mask: String,
    },
    /// One-shot data request, XML on stdout
    RequestData {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        address: u8,
    },
    /// Multi-telegram data request, XML of the whole chain on stdout
    RequestDataMultiReply {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        address: u8,
    },
    /// Select a device by secondary address and read it out
    SelectSecondary {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        /// Full 16 hex digit secondary address
        address: String,
    },
    /// Reprogram the primary address of a slave
    SetAddress {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        old_address: u8,
        new_address: u8,
    },
    /// Order a slave to switch baudrate
    SwitchBaudrate {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        address: u8,
        new_baudrate: u32,
    },
    /// Application layer reset, with an optional subcode
    ApplicationReset {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        address: u8,
        subcode: Option<u8>,
    },
    /// Read hex bytes, send them as a frame and print the reply
    RawSend {
        #[arg(short, long, default_value_t = 2400)]
        baudrate: u32,
        device: String,
        address: u8,
        /// Hex input file; stdin when absent
        file: Option<PathBuf>,
    },
    /// Parse hex from stdin and render the frame as XML
    InspectFrame,
}

async fn open_handle(device: &str, baudrate: u32) -> anyhow::Result<MBusHandle> {
    let handle = if device.contains(':') {
        MBusHandle::connect_tcp(device)
            .await
            .with_context(|| format!("failed to connect to gateway {device}"))?
    } else {
        let baudrate = MBusBaudRate::try_from(baudrate)?;
        MBusHandle::connect_serial(device, baudrate)
            .await
            .with_context(|| format!("failed to open serial device {device}"))?
    };
    Ok(handle)
}

fn read_hex_input(file: Option<&PathBuf>) -> anyhow::Result<Vec<u8>> {
    let text = match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("cannot read {path:?}"))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(mbus_hex2bin(&text)?)
}

fn parse_complete_frame(bytes: &[u8]) -> anyhow::Result<mbus_master::MBusFrame> {
    match parse_frame(bytes)? {
        FrameParseOutcome::Complete { frame, .. } => Ok(frame),
        FrameParseOutcome::NeedMore(n) => bail!("incomplete frame, {n} more bytes needed"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger_with_level(if cli.debug { "debug" } else { "warn" });

    match cli.command {
        Commands::Scan { baudrate, device } => {
            let mut handle = open_handle(&device, baudrate).await?;
            for hit in handle.scan_primary(0..=250).await? {
                match hit {
                    PrimaryScanHit::Found(address) => {
                        println!("Found a M-Bus device at address {address}");
                    }
                    PrimaryScanHit::Collision(address) => {
                        println!("Collision at address {address}");
                    }
                }
            }
        }

        Commands::ScanSecondary {
            baudrate,
            device,
            mask,
        } => {
            let mask = SecondaryMask::parse(&mask)?;
            let mut handle = open_handle(&device, baudrate).await?;
            for address in handle.scan_secondary(&mask.to_string()).await? {
                println!("Found a device on secondary address {address}");
            }
        }

        Commands::RequestData {
            baudrate,
            device,
            address,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            let frames = handle.sendrecv_request(address, 1).await?;
            print!("{}", mbus_frame_chain_xml(&frames)?);
        }

        Commands::RequestDataMultiReply {
            baudrate,
            device,
            address,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            let frames = handle.sendrecv_request(address, 16).await?;
            print!("{}", mbus_frame_chain_xml(&frames)?);
        }

        Commands::SelectSecondary {
            baudrate,
            device,
            address,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            match handle.select_secondary_address(&address).await? {
                ProbeResult::Single => {
                    let frames = handle
                        .sendrecv_request(mbus_master::constants::MBUS_ADDRESS_NETWORK_LAYER, 1)
                        .await?;
                    print!("{}", mbus_frame_chain_xml(&frames)?);
                }
                ProbeResult::Collision => {
                    bail!("the address mask {address} matches more than one device");
                }
                ProbeResult::Nothing => {
                    bail!("the selected secondary address does not match any device");
                }
            }
        }

        Commands::SetAddress {
            baudrate,
            device,
            old_address,
            new_address,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            handle.set_primary_address(old_address, new_address).await?;
            println!("Primary address of device {old_address} set to {new_address}");
        }

        Commands::SwitchBaudrate {
            baudrate,
            device,
            address,
            new_baudrate,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            handle.switch_baudrate(address, new_baudrate).await?;
            println!("Device {address} switched to {new_baudrate} baud");
        }

        Commands::ApplicationReset {
            baudrate,
            device,
            address,
            subcode,
        } => {
            let mut handle = open_handle(&device, baudrate).await?;
            handle.application_reset(address, subcode).await?;
            println!("Application reset sent to device {address}");
        }

        Commands::RawSend {
            baudrate,
            device,
            address,
            file,
        } => {
            let bytes = read_hex_input(file.as_ref())?;
            let mut frame = parse_complete_frame(&bytes)?;
            frame.address = address;
            frame.update_checksum();

            let mut handle = open_handle(&device, baudrate).await?;
            handle.send_frame(&frame).await?;
            match handle.recv_frame().await {
                Ok(reply) => {
                    let packed = mbus_master::mbus::frame::pack_frame(&reply);
                    println!("{}", hex::encode_upper(&packed));
                }
                Err(e) if e.is_timeout() => println!("No reply"),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::InspectFrame => {
            let bytes = read_hex_input(None)?;
            let frame = parse_complete_frame(&bytes)?;
            print!("{}", mbus_frame_xml(&frame)?);
        }
    }

    Ok(())
}
