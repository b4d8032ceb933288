use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tankobon_lib::prelude::{PaginationConfig, RetryPolicy};
use tankobon_sources::manager::BUILTIN_SOURCES;

use crate::{application::catalog::CatalogOptions, domain::entities::trust::TrustRanks};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PaginationSettings {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default)]
    pub page_delay_ms: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            page_delay_ms: 0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    /// Provider ids to query
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Trust rank per provider id, higher wins ties between unlocked chapters
    #[serde(default = "default_trust")]
    pub trust: BTreeMap<String, i32>,
    #[serde(default = "default_similarity_tolerance")]
    pub similarity_tolerance: f64,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Seconds one provider may spend on one stage
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout: u64,
    /// Seconds per HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Translated language requested from MangaDex
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: tankobon_home().join("config.yml"),
            sources: default_sources(),
            trust: default_trust(),
            similarity_tolerance: default_similarity_tolerance(),
            min_similarity: default_min_similarity(),
            provider_timeout: default_provider_timeout(),
            request_timeout: default_request_timeout(),
            pagination: PaginationSettings::default(),
            retry: RetrySettings::default(),
            language: default_language(),
        }
    }
}

fn tankobon_home() -> PathBuf {
    match std::env::var("TANKOBON_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir().unwrap_or_default().join(".tankobon"),
    }
}

fn default_sources() -> Vec<String> {
    BUILTIN_SOURCES.iter().map(|id| id.to_string()).collect()
}

fn default_trust() -> BTreeMap<String, i32> {
    [("mangadex", 40), ("mangapill", 30), ("webtoon", 20), ("arenascans", 10)]
        .into_iter()
        .map(|(id, rank)| (id.to_string(), rank))
        .collect()
}

fn default_similarity_tolerance() -> f64 {
    0.05
}

fn default_min_similarity() -> f64 {
    0.5
}

fn default_provider_timeout() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_pages() -> usize {
    200
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => tankobon_home().join("config.yml"),
        };

        match std::fs::File::open(&config_path) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                Ok(cfg)
            }
        }
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            multiplier: self.retry.multiplier,
            jitter: self.retry.jitter,
        }
    }

    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig {
            max_pages: self.pagination.max_pages.max(1),
            page_delay: Duration::from_millis(self.pagination.page_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn trust_ranks(&self) -> TrustRanks {
        TrustRanks::new(self.trust.clone())
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            trust: self.trust_ranks(),
            similarity_tolerance: self.similarity_tolerance,
            min_similarity: self.min_similarity,
            provider_timeout: Duration::from_secs(self.provider_timeout),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let yaml = "sources: [mangadex, webtoon]\ntrust:\n  webtoon: 99\nretry:\n  max_attempts: 2\n";
        let cfg: Config = serde_yml::from_str(yaml).unwrap();

        assert_eq!(cfg.sources, vec!["mangadex", "webtoon"]);
        assert_eq!(cfg.trust_ranks().rank("webtoon"), 99);
        assert_eq!(cfg.trust_ranks().rank("mangadex"), 0);
        assert_eq!(cfg.similarity_tolerance, 0.05);
        assert_eq!(cfg.language, "en");

        let retry = cfg.retry_policy();
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.initial_delay, Duration::from_millis(500));
        assert!(retry.jitter);

        assert_eq!(cfg.pagination_config(), PaginationConfig::default());
    }

    #[test]
    fn test_empty_file_matches_default() {
        let cfg: Config = serde_yml::from_str("{}").unwrap();
        let default = Config::default();

        assert_eq!(cfg.sources, default.sources);
        assert_eq!(cfg.trust, default.trust);
        assert_eq!(cfg.catalog_options().provider_timeout, Duration::from_secs(60));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_open_writes_default_config() {
        let dir = std::env::temp_dir().join(format!("tankobon-config-{}", std::process::id()));
        let path = dir.join("config.yml");
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = Config::open(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.path(), path.as_path());

        let reopened = Config::open(Some(&path)).unwrap();
        assert_eq!(reopened, cfg);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
