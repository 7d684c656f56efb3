use anyhow::{Context, bail};
use clap::Parser;
use hexflake::HexFlakeId;

use crate::server::machine_id::{MachineIdSource, parse_hardware_addr};

/// Runtime configuration for the `hexflake-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hexflake-server",
    version,
    about = "An HTTP service handing out 128-bit hex Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:8080" or "127.0.0.1:3000"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Upper bound on the `count` a single request may ask for.
    ///
    /// Larger requests are silently clamped to this value. It cannot exceed
    /// the number of sequence values one millisecond can issue (65535).
    ///
    /// Environment variable: `MAX_IDS_PER_REQUEST`
    #[arg(long, env = "MAX_IDS_PER_REQUEST", default_value_t = 10)]
    pub max_ids_per_request: usize,

    /// Machine ID to stamp into every ID, as hex (separators such as `:` or
    /// `-` are ignored, so a MAC address can be passed as-is).
    ///
    /// When unset, the machine ID is derived from the first network interface
    /// with a hardware address.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID")]
    pub machine_id: Option<String>,

    /// Only consider this network interface when deriving the machine ID.
    ///
    /// Ignored when `--machine-id` is set.
    ///
    /// Environment variable: `MACHINE_INTERFACE`
    #[arg(long, env = "MACHINE_INTERFACE")]
    pub interface: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_ids_per_request: usize,
    pub machine_id: MachineIdSource,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_sequence = usize::from(HexFlakeId::max_sequence());

        if args.max_ids_per_request == 0 {
            bail!("MAX_IDS_PER_REQUEST must be greater than 0");
        }

        if args.max_ids_per_request > max_sequence {
            bail!(
                "MAX_IDS_PER_REQUEST ({}) exceeds the IDs one millisecond can issue (max = {})",
                args.max_ids_per_request,
                max_sequence
            );
        }

        let machine_id = match args.machine_id {
            Some(raw) => MachineIdSource::Fixed(
                parse_hardware_addr(&raw).with_context(|| format!("invalid MACHINE_ID {raw:?}"))?,
            ),
            None => MachineIdSource::Discover {
                interface: args.interface,
            },
        };

        Ok(Self {
            server_addr: args.server_addr,
            max_ids_per_request: args.max_ids_per_request,
            machine_id,
        })
    }
}
