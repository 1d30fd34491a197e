mod args;
mod sections;

pub use args::Args;
use color_eyre::Result;
use eyre::{
    bail,
    Context as _,
};
pub use sections::{
    CollectorSection,
    HttpConfig,
    LogStreamConfig,
    MysqlConfig,
    NginxConfig,
    ProcessConfig,
    SystemConfig,
    DEFAULT_COLLECTION_INTERVAL_SECONDS,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashMap,
    path::Path,
    time::Duration,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");
const DEFAULT_LOG_LEVEL: &str = "info";
const AGENT_ID_COMMENT: &str = "# generated by the agent, do not edit or remove this line";
const ENV_PREFIX: &str = "LOGTICK";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_name: String,
    #[serde(default)]
    pub agent_id: String,
    /// Interval of the system collector.
    pub interval_seconds: u64,
    pub target_url: String,
    #[serde(default)]
    pub log_level: String,
    pub http: HttpConfig,
    pub log_stream: LogStreamConfig,
    pub system: SystemConfig,
    pub mysql: MysqlConfig,
    pub nginx: NginxConfig,
    pub process: ProcessConfig,
}

/// What [`AgentConfig::bootstrap`] did to the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bootstrap {
    /// The file did not exist before.
    pub created: bool,
    pub generated_agent_id: Option<String>,
    /// The file was written.
    pub saved: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl AgentConfig {
    /// Loads the configuration for the agent.
    ///
    /// The file at `path` is created (or repaired) first, so the agent id that
    /// ends up in memory is always the persisted one. Environment variables
    /// prefixed with `LOGTICK_` and the command line overrides are layered on
    /// top and never written back.
    pub fn load(path: impl AsRef<Path>, args: Args) -> Result<Self> {
        Self::load_with_env(path.as_ref(), args, None)
    }

    fn load_with_env(path: &Path, args: Args, env: Option<HashMap<String, String>>) -> Result<Self> {
        Self::bootstrap(path)?;

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(environment)
            .add_source(args)
            .build()?
            .try_deserialize()
            .wrap_err_with(|| format!("Failed to parse configuration file {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Makes sure the file at `path` exists and carries an agent id.
    ///
    /// Runs before logging is set up, so the outcome is returned for the
    /// caller to report.
    pub fn bootstrap(path: impl AsRef<Path>) -> Result<Bootstrap> {
        let path = path.as_ref();
        let exists = path.exists();

        let mut cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(config::File::from(path).format(config::FileFormat::Yaml).required(false))
            .build()?
            .try_deserialize()
            .wrap_err_with(|| format!("Failed to parse configuration file {}", path.display()))?;

        let mut outcome = Bootstrap {
            created: !exists,
            ..Bootstrap::default()
        };
        if cfg.agent_id.trim().is_empty() {
            cfg.agent_id = uuid::Uuid::new_v4().to_string();
            outcome.generated_agent_id = Some(cfg.agent_id.clone());
        }
        let repaired = cfg.repair() || outcome.generated_agent_id.is_some();
        if exists && !repaired {
            return Ok(outcome);
        }

        cfg.save(path)?;
        outcome.saved = true;
        Ok(outcome)
    }

    /// Defaults empty or zero values. Returns `true` when anything changed.
    fn repair(&mut self) -> bool {
        let mut changed = false;
        if self.log_level.trim().is_empty() {
            self.log_level = DEFAULT_LOG_LEVEL.to_string();
            changed = true;
        }
        changed |= self.mysql.repair_interval();
        changed |= self.nginx.repair_interval();
        changed |= self.process.repair_interval();
        changed
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_name.trim().is_empty() {
            bail!("agent_name is required and cannot be empty");
        }
        if self.agent_id.trim().is_empty() {
            bail!("agent_id cannot be empty");
        }
        if self.interval_seconds == 0 {
            bail!("interval_seconds must be a positive number");
        }
        if self.target_url.trim().is_empty() {
            bail!("target_url cannot be empty");
        }
        url::Url::parse(&self.target_url).wrap_err_with(|| format!("Invalid target_url {:?}", self.target_url))?;
        if self.mysql.enabled && self.mysql.dsn.trim().is_empty() {
            bail!("mysql collector enabled but dsn is empty");
        }
        if self.nginx.enabled && self.nginx.stub_status_url.trim().is_empty() {
            bail!("nginx collector enabled but stub_status_url is empty");
        }
        if self.log_stream.enabled && !matches!(self.log_stream.url.scheme(), "ws" | "wss") {
            bail!("log_stream.url must be a ws:// or wss:// URL, got {}", self.log_stream.url);
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_yml::to_string(self).context("Failed to serialize config")?;
        let content = content
            .lines()
            .map(|line| {
                if line.starts_with("agent_id:") {
                    format!("{line} {AGENT_ID_COMMENT}")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(path, content + "\n").wrap_err_with(|| format!("Failed to write config to {:?}", path))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("logtick").chain(extra.iter().copied()))
    }

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn missing_file_is_created_with_generated_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.yaml");

        let cfg = AgentConfig::load_with_env(&path, args(&[]), no_env()).unwrap();

        assert!(path.exists());
        assert_eq!(cfg.agent_name, "default-agent");
        assert!(uuid::Uuid::parse_str(&cfg.agent_id).is_ok());
        assert_eq!(cfg.interval(), Duration::from_secs(5));
        assert!(cfg.system.enabled);
        assert!(!cfg.mysql.enabled);

        let content = std::fs::read_to_string(&path).unwrap();
        let id_line = content.lines().find(|l| l.starts_with("agent_id:")).unwrap();
        assert!(id_line.ends_with(AGENT_ID_COMMENT));
    }

    #[test]
    fn agent_id_is_stable_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.yaml");

        let first = AgentConfig::load_with_env(&path, args(&[]), no_env()).unwrap();
        assert_eq!(AgentConfig::bootstrap(&path).unwrap(), Bootstrap::default());
        let second = AgentConfig::load_with_env(&path, args(&[]), no_env()).unwrap();

        assert_eq!(first.agent_id, second.agent_id);
    }

    #[test]
    fn empty_agent_id_and_zero_intervals_are_repaired() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.yaml");
        std::fs::write(
            &path,
            "agent_name: web-01\nagent_id: \"\"\nlog_level: \"\"\nmysql:\n  enabled: true\n  dsn: mysql://u:p@db:3306/mysql\n  collection_interval_seconds: 0\n",
        )
        .unwrap();

        let cfg = AgentConfig::load_with_env(&path, args(&[]), no_env()).unwrap();

        assert_eq!(cfg.agent_name, "web-01");
        assert!(!cfg.agent_id.is_empty());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.mysql.interval(), Duration::from_secs(DEFAULT_COLLECTION_INTERVAL_SECONDS));

        let reread: AgentConfig = serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread.agent_id, cfg.agent_id);
    }

    #[test]
    fn bootstrap_reports_creation_and_generated_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.yaml");

        let outcome = AgentConfig::bootstrap(&path).unwrap();
        assert!(outcome.created);
        assert!(outcome.saved);
        let stored: AgentConfig = serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(outcome.generated_agent_id, Some(stored.agent_id));

        std::fs::write(&path, "agent_name: web-01\nagent_id: \"\"\n").unwrap();
        let outcome = AgentConfig::bootstrap(&path).unwrap();
        assert!(!outcome.created);
        assert!(outcome.saved);
        assert!(outcome.generated_agent_id.is_some());
    }

    #[test]
    fn environment_and_args_override_the_file_without_being_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.yaml");
        AgentConfig::bootstrap(&path).unwrap();

        let env = HashMap::from([
            ("LOGTICK_AGENT_NAME".to_string(), "from-env".to_string()),
            ("LOGTICK_NGINX__ENABLED".to_string(), "true".to_string()),
        ]);
        let cfg =
            AgentConfig::load_with_env(&path, args(&["--target-url", "http://collector:8080/in"]), Some(env)).unwrap();

        assert_eq!(cfg.agent_name, "from-env");
        assert!(cfg.nginx.enabled);
        assert_eq!(cfg.target_url, "http://collector:8080/in");

        let stored: AgentConfig = serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.agent_name, "default-agent");
        assert_eq!(stored.target_url, "http://localhost:4003/metrics");
    }

    #[test]
    fn validation_rejects_invalid_settings() {
        let valid = AgentConfig {
            agent_id: "id".to_string(),
            ..AgentConfig::default()
        };
        assert!(valid.validate().is_ok());

        let cases: Vec<(&str, Box<dyn Fn(&mut AgentConfig)>)> = vec![
            ("empty name", Box::new(|c: &mut AgentConfig| c.agent_name = " ".to_string())),
            ("zero interval", Box::new(|c: &mut AgentConfig| c.interval_seconds = 0)),
            ("empty target", Box::new(|c: &mut AgentConfig| c.target_url = String::new())),
            ("bad target", Box::new(|c: &mut AgentConfig| c.target_url = "not a url".to_string())),
            (
                "mysql without dsn",
                Box::new(|c: &mut AgentConfig| {
                    c.mysql.enabled = true;
                    c.mysql.dsn = String::new();
                }),
            ),
            (
                "nginx without url",
                Box::new(|c: &mut AgentConfig| {
                    c.nginx.enabled = true;
                    c.nginx.stub_status_url = String::new();
                }),
            ),
            (
                "log stream over http",
                Box::new(|c: &mut AgentConfig| {
                    c.log_stream.enabled = true;
                    c.log_stream.url = url::Url::parse("http://localhost/ws").unwrap();
                }),
            ),
        ];

        for (name, mutate) in cases {
            let mut cfg = valid.clone();
            mutate(&mut cfg);
            assert!(cfg.validate().is_err(), "{name} should be rejected");
        }
    }
}
