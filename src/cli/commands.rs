//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::NodeConfig;
use crate::error::Result;
use crate::types::Position;

#[derive(Parser, Debug)]
#[command(name = "peertrade")]
#[command(about = "peertrade - peer-to-peer trade negotiation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a peertrade node with an interactive console
    Node(NodeArgs),

    /// Print the effective configuration as TOML
    Config(NodeArgs),
}

#[derive(Args, Debug, Default)]
pub struct NodeArgs {
    /// TOML config file
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Display name announced to peers
    #[arg(short, long)]
    pub name: Option<String>,

    /// Starting position as x,y,z
    #[arg(long, allow_hyphen_values = true)]
    pub pos: Option<Position>,

    /// Peer address to connect to (repeatable)
    #[arg(short = 'c', long)]
    pub connect: Vec<String>,
}

impl NodeArgs {
    /// Defaults, then config file, then environment, then flags
    pub fn resolve(&self) -> Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_file(path)?,
            None => NodeConfig::default(),
        };
        let mut config = base.with_env_overrides();

        if let Some(port) = self.port {
            config.node.port = port;
        }
        if let Some(name) = &self.name {
            config.node.name = name.clone();
        }
        if let Some(pos) = self.pos {
            config.node.position = pos.into();
        }
        config.node.connect.extend(self.connect.iter().cloned());

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_command() {
        let cli = Cli::try_parse_from([
            "peertrade", "node", "--port", "9001", "--name", "bob", "--pos", "-1,0,2", "-c",
            "127.0.0.1:9000",
        ])
        .unwrap();

        let Commands::Node(args) = cli.command else {
            panic!("expected node command");
        };
        assert_eq!(args.port, Some(9001));
        assert_eq!(args.pos, Some(Position::new(-1.0, 0.0, 2.0)));
        assert_eq!(args.connect, vec!["127.0.0.1:9000".to_string()]);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = NodeArgs {
            port: Some(9100),
            name: Some("carol".to_string()),
            pos: Some(Position::new(1.0, 2.0, 3.0)),
            connect: vec!["127.0.0.1:9000".to_string()],
            ..Default::default()
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.node.port, 9100);
        assert_eq!(config.node.name, "carol");
        assert_eq!(config.node.position, [1.0, 2.0, 3.0]);
        assert_eq!(config.node.connect.len(), 1);
    }

    #[test]
    fn test_bad_position_rejected() {
        let result = Cli::try_parse_from(["peertrade", "node", "--pos", "1,2"]);
        assert!(result.is_err());
    }
}
