use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use blake3::Hasher as Blake3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{WalletError, WalletResult};
use crate::network::Network;

const CONFIG_VERSION: u16 = 1;

const ENV_ENVIRONMENT: &str = "VOLTSTELLAR_ENV";
const DEFAULT_ENVIRONMENT: &str = "development";
const ENV_TESTNET_HORIZON: &str = "VOLTSTELLAR_TESTNET_HORIZON";
const ENV_MAINNET_HORIZON: &str = "VOLTSTELLAR_MAINNET_HORIZON";
const ENV_REQUEST_TIMEOUT: &str = "VOLTSTELLAR_REQUEST_TIMEOUT_SECS";
const ENV_WATCH_INTERVAL: &str = "VOLTSTELLAR_WATCH_INTERVAL_MS";

pub const DEFAULT_TESTNET_HORIZON: &str = "https://horizon-testnet.stellar.org";
pub const DEFAULT_MAINNET_HORIZON: &str = "https://horizon.stellar.org";
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkEndpoints {
    pub testnet_horizon: String,
    pub mainnet_horizon: String,
    pub request_timeout_secs: u64,
}

impl Default for NetworkEndpoints {
    fn default() -> Self {
        Self {
            testnet_horizon: DEFAULT_TESTNET_HORIZON.to_string(),
            mainnet_horizon: DEFAULT_MAINNET_HORIZON.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl NetworkEndpoints {
    pub fn horizon_for(&self, network: Network) -> &str {
        match network {
            Network::Testnet => &self.testnet_horizon,
            Network::Mainnet => &self.mainnet_horizon,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_WATCH_INTERVAL_MS,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletConfig {
    pub network: NetworkEndpoints,
    pub watcher: WatcherConfig,
    pub environment: String,
    pub last_updated: DateTime<Utc>,
    pub version: u16,
}

impl WalletConfig {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            network: NetworkEndpoints::default(),
            watcher: WatcherConfig::default(),
            environment: environment.into(),
            last_updated: Utc::now(),
            version: CONFIG_VERSION,
        }
    }

    /// Environment named by `VOLTSTELLAR_ENV`, `development` when unset.
    pub fn environment_from_env() -> String {
        read_env(ENV_ENVIRONMENT).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    pub fn apply_env_overrides(&mut self) -> WalletResult<()> {
        if let Some(url) = read_env(ENV_TESTNET_HORIZON) {
            self.network.testnet_horizon = url;
        }
        if let Some(url) = read_env(ENV_MAINNET_HORIZON) {
            self.network.mainnet_horizon = url;
        }
        if let Some(raw) = read_env(ENV_REQUEST_TIMEOUT) {
            self.network.request_timeout_secs = parse_u64(&raw, ENV_REQUEST_TIMEOUT)?;
        }
        if let Some(raw) = read_env(ENV_WATCH_INTERVAL) {
            self.watcher.poll_interval_ms = parse_u64(&raw, ENV_WATCH_INTERVAL)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> WalletResult<()> {
        for (name, url) in [
            ("testnet", &self.network.testnet_horizon),
            ("mainnet", &self.network.mainnet_horizon),
        ] {
            if url.trim().is_empty() {
                return Err(WalletError::ValidationError(format!(
                    "{} ledger endpoint cannot be empty",
                    name
                )));
            }
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(WalletError::ValidationError(format!(
                    "{} ledger endpoint must be an http(s) URL: {}",
                    name, url
                )));
            }
        }

        if self.network.testnet_horizon.trim_end_matches('/')
            == self.network.mainnet_horizon.trim_end_matches('/')
        {
            return Err(WalletError::ValidationError(
                "Testnet and mainnet ledger endpoints must differ".to_string(),
            ));
        }

        if self.watcher.poll_interval_ms == 0 {
            return Err(WalletError::ValidationError(
                "Watcher poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

fn read_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => {
            log::warn!("Environment variable {} is empty", key);
            None
        }
        Err(_) => None,
    }
}

fn parse_u64(raw: &str, key: &str) -> WalletResult<u64> {
    raw.parse::<u64>().map_err(|_| {
        WalletError::ValidationError(format!(
            "Configuration key '{}' must be an unsigned integer, got '{}'",
            key, raw
        ))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u16,
    checksum: [u8; 32],
    payload: WalletConfig,
    modified_at_unix: i64,
}

/// Handles persistence of wallet configuration with integrity checks.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load_or_default(&self, environment: impl Into<String>) -> WalletResult<WalletConfig> {
        if !self.path.exists() {
            let config = WalletConfig::new(environment);
            self.save(&config)?;
            return Ok(config);
        }

        let bytes = fs::read(&self.path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != CONFIG_VERSION {
            return Err(WalletError::ValidationError(format!(
                "Unsupported config version {}",
                envelope.version
            )));
        }

        if checksum(&envelope.payload)? != envelope.checksum {
            return Err(WalletError::ValidationError(
                "Config integrity verification failed".to_string(),
            ));
        }

        envelope.payload.validate()?;
        Ok(envelope.payload)
    }

    pub fn save(&self, config: &WalletConfig) -> WalletResult<()> {
        config.validate()?;
        let mut payload = config.clone();
        payload.touch();

        let envelope = ConfigEnvelope {
            version: CONFIG_VERSION,
            checksum: checksum(&payload)?,
            modified_at_unix: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_err(|e| WalletError::StorageError(e.to_string()))?
                .as_secs() as i64,
            payload,
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    pub fn update<F>(
        &self,
        environment: impl Into<String>,
        updater: F,
    ) -> WalletResult<WalletConfig>
    where
        F: FnOnce(&mut WalletConfig) -> WalletResult<()>,
    {
        let mut config = self.load_or_default(environment)?;
        updater(&mut config)?;
        config.touch();
        self.save(&config)?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(config: &WalletConfig) -> WalletResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    let encoded = serde_json::to_vec(config)?;
    hasher.update(&encoded);
    let mut output = [0u8; 32];
    output.copy_from_slice(hasher.finalize().as_bytes());
    Ok(output)
}
