use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pollchat",
    about = "Poll and chat backend",
    version = crate::version::VERSION,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server (default).
    Run,

    /// Create empty poll and chat documents under --data-dir, then exit.
    Init,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(
        long,
        global = true,
        env = "PORT",
        value_name = "PORT",
        default_value_t = 3000
    )]
    pub port: u16,

    #[arg(
        long,
        global = true,
        env = "POLLCHAT_HOST",
        value_name = "ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub host: IpAddr,

    /// Directory holding data.json (polls and votes) and chat.json.
    #[arg(
        long,
        global = true,
        env = "POLLCHAT_DATA_DIR",
        value_name = "DIR",
        default_value = "."
    )]
    pub data_dir: PathBuf,

    /// Static files served for any path not handled by the API.
    #[arg(
        long,
        global = true,
        env = "POLLCHAT_PUBLIC_DIR",
        value_name = "DIR",
        default_value = "public"
    )]
    pub public_dir: PathBuf,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_on_3000() {
        let cli = Cli::try_parse_from(["pollchat"]).unwrap();
        assert!(cli.command.is_none());
        // PORT may be set in the environment running the tests.
        if std::env::var_os("PORT").is_none() {
            assert_eq!(cli.config.port, 3000);
        }
        if std::env::var_os("POLLCHAT_HOST").is_none() {
            assert_eq!(cli.config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "pollchat",
            "init",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--data-dir",
            "/tmp/pollchat",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Init)));
        assert_eq!(
            cli.config.bind_addr(),
            SocketAddr::from(([127, 0, 0, 1], 8080))
        );
        assert_eq!(cli.config.data_dir, PathBuf::from("/tmp/pollchat"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Cli::try_parse_from(["pollchat", "--port", "70000"]).is_err());
    }
}
