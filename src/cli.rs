use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reportbox")]
#[command(about = "Ledger report exporter", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $REPORTBOX_CONFIG, then config/reportbox.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Run one export in the foreground and print its final state
    Export,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_with_address() {
        let cli = Cli::try_parse_from(["reportbox", "server", "--address", "127.0.0.1:9000"]).unwrap();
        match cli.command {
            Commands::Server(args) => {
                assert_eq!(args.address, Some("127.0.0.1:9000".parse().unwrap()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_export_with_config() {
        let cli = Cli::try_parse_from(["reportbox", "export", "--config", "custom.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Export));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["reportbox"]).is_err());
    }
}
