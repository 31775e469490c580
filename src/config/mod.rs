use std::{collections::HashMap, path::Path, process::exit, str::FromStr};

use ethers::types::Address;
use figment::{
    providers::{Format, Serialized, Toml},
    value::Value,
    Figment,
};
use serde::{Deserialize, Serialize};

/// The global configuration, assembled from defaults, the config file,
/// `MELCHIOR_` prefixed environment variables, and CLI flags, in that
/// order of increasing precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The L1 RPC endpoint
    pub l1_rpc_url: String,
    /// The location of the database folder
    pub db_location: Option<std::path::PathBuf>,
    /// The port the query RPC server binds to
    pub rpc_port: u16,
    /// The chain config
    pub chain: ChainConfig,
}

impl Config {
    pub fn new(
        config_path: &Path,
        cli_provider: Serialized<HashMap<&str, Value>>,
        chain: ChainConfig,
    ) -> Self {
        let defaults = Serialized::defaults(Config {
            l1_rpc_url: "http://127.0.0.1:8545".to_string(),
            db_location: None,
            rpc_port: 9545,
            chain,
        });

        let config_res = Figment::new()
            .merge(defaults)
            .merge(Toml::file(config_path))
            .merge(figment::providers::Env::prefixed("MELCHIOR_"))
            .merge(cli_provider)
            .extract();

        match config_res {
            Ok(config) => config,
            Err(err) => {
                match err.kind {
                    figment::error::Kind::MissingField(field) => {
                        let field = field.replace('_', "-");
                        println!("\x1b[91merror\x1b[0m: missing configuration field: {field}");
                        println!("\n\ttry supplying the proper command line argument: --{field}");
                        println!("\talternatively, you can add the field to your melchior.toml file or as an environment variable");
                        println!("\nfor more information, check the github README");
                    }
                    _ => println!("cannot parse configuration: {err}"),
                }
                exit(1);
            }
        }
    }
}

/// Configuration for a specific rollup deployment: the settlement-layer
/// contract this node scans and the L2 chain it derives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The network name
    pub network: String,
    /// The L2 chain id, used for EIP-155 signature recovery
    pub l2_chain_id: u64,
    /// The address of the canonical transaction chain contract on L1
    pub ctc_address: Address,
    /// The L1 block at which batch submission begins
    pub l1_start_block: u64,
}

impl ChainConfig {
    /// Returns the chain config by network name.
    pub fn from_network_name(network: &str) -> Self {
        match network.to_lowercase().as_str() {
            "optimism" => Self::optimism(),
            "optimism-goerli" => Self::optimism_goerli(),
            _ => panic!("network not recognized"),
        }
    }

    pub fn optimism() -> Self {
        Self {
            network: "optimism".to_string(),
            l2_chain_id: 10,
            ctc_address: addr("0x5E4e65926BA27467555EB562121fac00D24E9dD2"),
            l1_start_block: 13596466,
        }
    }

    pub fn optimism_goerli() -> Self {
        Self {
            network: "optimism-goerli".to_string(),
            l2_chain_id: 420,
            ctc_address: addr("0x607F755149cFEB3a14E1Dc3A4E2450Cde7dfb04D"),
            l1_start_block: 8498058,
        }
    }
}

fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_config_from_network_name() {
        let config = ChainConfig::from_network_name("Optimism-Goerli");
        assert_eq!(config.network, "optimism-goerli");
        assert_eq!(config.l2_chain_id, 420);
    }

    #[test]
    #[should_panic(expected = "network not recognized")]
    fn test_unknown_network_panics() {
        ChainConfig::from_network_name("mainnet");
    }
}
