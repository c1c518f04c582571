use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub elasticsearch: EsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EsConfig {
    pub host: String,
    pub port: u16,
    /// Discover cluster nodes from the seed node
    pub sniff: bool,
    /// Log every request and response status at trace level
    pub trace: bool,
    /// Shards for newly created indices, 0 means unset
    pub shards: u32,
    /// Replicas for newly created indices, 0 means unset
    pub replicas: u32,
}

impl EsConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 9200,
            sniff: false,
            trace: false,
            shards: 0,
            replicas: 0,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        // Step 1: Try loading .env file (silently ignore if not found)
        let _ = dotenvy::dotenv();

        // Step 2: Try loading TOML config as base
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            AppConfig::default()
        };

        // Step 3: Override with environment variables where present
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let es = &mut self.elasticsearch;
        if let Some(host) = var("ES_HOST") {
            es.host = host;
        }
        if let Some(val) = var("ES_PORT") {
            es.port = val.parse()?;
        }
        if let Some(val) = var("ES_SNIFF") {
            es.sniff = val.parse()?;
        }
        if let Some(val) = var("ES_TRACE") {
            es.trace = val.parse()?;
        }
        if let Some(val) = var("ES_SHARDS") {
            es.shards = val.parse()?;
        }
        if let Some(val) = var("ES_REPLICAS") {
            es.replicas = val.parse()?;
        }

        if es.host.is_empty() {
            anyhow::bail!("Elasticsearch host not configured. Set ES_HOST or elasticsearch.host");
        }
        Ok(())
    }
}
