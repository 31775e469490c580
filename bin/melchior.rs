use std::{collections::HashMap, path::PathBuf, str::FromStr};

use clap::Parser;
use dirs::home_dir;
use eyre::Result;
use figment::{providers::Serialized, value::Value};

use melchior::{
    config::{ChainConfig, Config},
    driver::Driver,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let config = cli.to_config();

    telemetry::init(verbose)?;
    telemetry::init_metrics()?;
    telemetry::register_shutdown();

    tracing::info!(target: "melchior", "starting batch ingestion for {}", config.chain.network);

    let mut driver = Driver::from_config(config)?;

    if let Err(err) = driver.start().await {
        tracing::error!(target: "melchior", "{}", err);
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Parser)]
pub struct Cli {
    #[clap(short, long, default_value = "optimism")]
    network: String,
    #[clap(long)]
    db_location: Option<String>,
    #[clap(long)]
    l1_rpc_url: Option<String>,
    #[clap(short = 'p', long)]
    rpc_port: Option<u16>,
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    pub fn to_config(self) -> Config {
        let chain = ChainConfig::from_network_name(&self.network);

        let config_path = home_dir().unwrap().join(".melchior/melchior.toml");
        let cli_provider = self.as_provider();
        let mut config = Config::new(&config_path, cli_provider, chain);

        if config.db_location.is_none() {
            let default_db_loc = home_dir().unwrap().join(".melchior/data");
            config.db_location = Some(default_db_loc);
        }

        config
    }

    pub fn as_provider(&self) -> Serialized<HashMap<&str, Value>> {
        let mut user_dict = HashMap::new();

        if let Some(l1_rpc_url) = &self.l1_rpc_url {
            user_dict.insert("l1_rpc_url", Value::from(l1_rpc_url.clone()));
        }

        if let Some(db_location) = &self.db_location {
            if let Ok(path) = PathBuf::from_str(db_location) {
                user_dict.insert("db_location", Value::from(path.display().to_string()));
            }
        }

        if let Some(rpc_port) = self.rpc_port {
            user_dict.insert("rpc_port", Value::from(rpc_port));
        }

        Serialized::from(user_dict, "default".to_string())
    }
}
