use clap::Parser;
use std::path::PathBuf;

/// Host telemetry agent
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the YAML configuration file. Created with defaults if missing.
    #[clap(long, env = "LOGTICK_CONFIG", value_name = "FILE", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Generate (or repair) the configuration file and exit.
    #[clap(long, action)]
    pub init: bool,

    /// Run the development receiver that accepts reports and log streams.
    #[clap(long, action)]
    pub server: bool,

    /// Listen address of the development receiver.
    #[clap(long, value_name = "ADDR", default_value = "0.0.0.0:4003")]
    pub server_address: std::net::SocketAddr,

    /// Optional log level to override the stored configuration.
    #[clap(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Optional delivery target to override the stored configuration.
    #[clap(long, value_name = "URL")]
    pub target_url: Option<String>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(log_level) = &self.log_level {
                cache.insert("log_level".to_string(), log_level.clone().into());
            }
            if let Some(target_url) = &self.target_url {
                cache.insert("target_url".to_string(), target_url.clone().into());
            }
            Ok(cache)
        }
    }
}
