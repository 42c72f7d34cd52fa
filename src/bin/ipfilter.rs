//! ipfilter: CLI tool for inspecting and producing IP list files.

use clap::{Parser, Subcommand};
use ipfilter::converter::CidrParser;
use ipfilter::{CachedResolver, Diagnostics, IpRangeList, RoutingConfig, RoutingDialer, TcpDialer};
use std::fs::File;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ipfilter")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Inspect and generate IP list files for routing dialers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether IP addresses are inside an IP list
    Check {
        /// IP list file (.gz for gzip)
        #[arg(short, long)]
        list: PathBuf,

        /// Addresses to test
        #[arg(required = true)]
        ips: Vec<IpAddr>,
    },

    /// Show which dialer each `host:port` address would be routed to
    Route {
        /// IP list file (.gz for gzip)
        #[arg(short, long, conflicts_with = "config")]
        list: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Addresses to route
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Convert CIDR notation to an IP list file
    Convert {
        /// Input file with one CIDR per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output IP list file (.gz for gzip)
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { list, ips } => check(&list, &ips),
        Commands::Route {
            list,
            config,
            addresses,
        } => route(list, config, &addresses),
        Commands::Convert {
            input,
            output,
            verbose,
        } => convert(&input, &output, verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn check(list: &Path, ips: &[IpAddr]) -> Result<(), Box<dyn std::error::Error>> {
    let list = IpRangeList::load(list)?;

    for ip in ips {
        let verdict = if list.contains(*ip) { "MATCH" } else { "MISS" };
        println!("{}\t{}", ip, verdict);
    }
    Ok(())
}

fn route(
    list: Option<PathBuf>,
    config: Option<PathBuf>,
    addresses: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => RoutingConfig::load(path)?,
        None => RoutingConfig {
            ip_list: list,
            ..RoutingConfig::default()
        },
    };

    let dialer: RoutingDialer<TcpDialer, TcpDialer, CachedResolver> =
        config.build(TcpDialer::new(), Diagnostics::global())?;

    let mut failed = false;
    for address in addresses {
        match dialer.route(address) {
            Ok(route) => println!("{}\t{}", address, route),
            Err(e) => {
                println!("{}\tERROR\t{}", address, e);
                failed = true;
            }
        }
    }

    if failed {
        return Err("some addresses could not be routed".into());
    }
    Ok(())
}

fn convert(input: &Path, output: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("Reading input file: {:?}", input);
    }

    let list = CidrParser::parse(File::open(input)?)?;

    if verbose {
        let v4 = list.iter().filter(|r| r.base().is_ipv4()).count();
        println!("Parsed {} IPv4 and {} IPv6 range(s)", v4, list.len() - v4);
    }

    list.save(output)?;

    println!("Successfully converted {:?} -> {:?}", input, output);
    Ok(())
}
