// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Host Configuration Types
//
// Defines the configuration schema for an agent host process, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Manager identity (wallet credential, signing key, membase id)
// - Registry network and Memory Hub endpoint
// - Optional LLM provider backing the local agent runtime
// - API bind address and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::agent::{MemoryHubAddress, DEFAULT_MEMORY_HUB_ADDRESS};
use crate::domain::credential::{ChainNetwork, Credential};

pub const API_VERSION: &str = "agent-host/v1";
pub const KIND: &str = "HostConfig";

const MASK: &str = "**********";

/// Top-level Kubernetes-style host configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfigManifest {
    /// API version (must be "agent-host/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "HostConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: HostConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable host name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Host configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfigSpec {
    /// Credentials of the lifecycle manager
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub memory_hub: MemoryHubConfig,

    /// LLM backing the local runtime; agents answer with a canned error
    /// when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Wallet address, `0x` + 40 hex characters
    #[serde(default)]
    pub wallet_address: String,

    /// Signing key for registry writes (supports "env:VAR_NAME")
    #[serde(default)]
    pub secret_key: String,

    /// Membase identifier of this manager
    #[serde(default)]
    pub membase_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Network selector; anything other than "bsc-testnet" selects mainnet
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { network: default_network() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHubConfig {
    /// Default `host:port` for agents initialized without one
    #[serde(default = "default_memory_hub_address")]
    pub address: String,

    /// Pause between generating a response and re-reading memory
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for MemoryHubConfig {
    fn default() -> Self {
        Self {
            address: default_memory_hub_address(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProviderType {
    Openai,
    OpenaiCompatible,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,

    /// API endpoint URL
    pub endpoint: String,

    /// Model identifier for the provider API
    pub model: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_network() -> String {
    ChainNetwork::BscTestnet.as_str().to_string()
}

fn default_memory_hub_address() -> String {
    DEFAULT_MEMORY_HUB_ADDRESS.to_string()
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for HostConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "agent-host".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: HostConfigSpec::default(),
        }
    }
}

impl HostConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AGENT_HOST_CONFIG_PATH environment variable
    /// 2. ./agent-host.yaml (working directory)
    /// 3. ~/.agent-host/config.yaml (user home)
    /// 4. /etc/agent-host/config.yaml (system, Unix) or C:\ProgramData\AgentHost\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AGENT_HOST_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./agent-host.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agent-host").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/agent-host/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\AgentHost\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source. Empty values are
    /// ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = get("MEMBASE_ACCOUNT") {
            tracing::info!("Environment override: MEMBASE_ACCOUNT={}", val);
            self.spec.identity.wallet_address = val;
        }
        if let Some(val) = get("MEMBASE_SECRET_KEY") {
            tracing::info!("Environment override: MEMBASE_SECRET_KEY={}", MASK);
            self.spec.identity.secret_key = val;
        }
        if let Some(val) = get("MEMBASE_ID") {
            tracing::info!("Environment override: MEMBASE_ID={}", val);
            self.spec.identity.membase_id = val;
        }
        if let Some(val) = get("MEMORY_HUB_ADDRESS") {
            tracing::info!("Environment override: MEMORY_HUB_ADDRESS={}", val);
            self.spec.memory_hub.address = val;
        }
        if let Some(val) = get("MEMBASE_NETWORK") {
            tracing::info!("Environment override: MEMBASE_NETWORK={}", val);
            self.spec.chain.network = val;
        }
        if let Some(val) = get("AGENT_HOST_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: AGENT_HOST_PORT={}", port);
                    self.spec.api.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for AGENT_HOST_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    pub fn network(&self) -> ChainNetwork {
        ChainNetwork::from_selector(&self.spec.chain.network)
    }

    /// Resolved signing key; "env:VAR" indirection is followed.
    pub fn secret_key(&self) -> anyhow::Result<String> {
        resolve_env_reference(&self.spec.identity.secret_key)
    }

    /// Copy suitable for printing: secrets are masked.
    pub fn display_masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.spec.identity.secret_key.is_empty() {
            masked.spec.identity.secret_key = MASK.to_string();
        }
        if let Some(llm) = masked.spec.llm.as_mut() {
            if let Some(key) = llm.api_key.as_mut() {
                if !key.starts_with("env:") {
                    *key = MASK.to_string();
                }
            }
        }
        masked
    }

    /// Validate configuration, reporting every problem at once
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut problems = Vec::new();

        if self.api_version != API_VERSION {
            problems.push(format!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version, API_VERSION
            ));
        }
        if self.kind != KIND {
            problems.push(format!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND));
        }
        if self.metadata.name.is_empty() {
            problems.push("metadata.name cannot be empty".to_string());
        }

        let identity = &self.spec.identity;
        if identity.wallet_address.is_empty() {
            problems.push("spec.identity.wallet_address is not set (MEMBASE_ACCOUNT)".to_string());
        } else if let Err(e) = Credential::parse(&identity.wallet_address) {
            problems.push(format!("spec.identity.wallet_address: {}", e));
        }
        if identity.secret_key.trim().is_empty() {
            problems.push("spec.identity.secret_key is not set (MEMBASE_SECRET_KEY)".to_string());
        }
        if identity.membase_id.trim().is_empty() {
            problems.push("spec.identity.membase_id is not set (MEMBASE_ID)".to_string());
        }

        if let Err(e) = MemoryHubAddress::parse(&self.spec.memory_hub.address) {
            problems.push(format!("spec.memory_hub.address: {}", e));
        }

        if let Some(llm) = &self.spec.llm {
            if llm.endpoint.trim().is_empty() {
                problems.push("spec.llm.endpoint cannot be empty".to_string());
            }
            if llm.model.trim().is_empty() {
                problems.push("spec.llm.model cannot be empty".to_string());
            }
        }

        if let Some(logging) = self
            .spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.as_ref())
        {
            if !matches!(logging.format.as_str(), "text" | "json") {
                problems.push(format!(
                    "spec.observability.logging.format must be 'text' or 'json', got: '{}'",
                    logging.format
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                problems.join("\n  - ")
            )
        }
    }
}

/// Resolve "env:VAR_NAME" references; literal values pass through.
pub fn resolve_env_reference(value: &str) -> anyhow::Result<String> {
    if let Some(var) = value.strip_prefix("env:") {
        std::env::var(var)
            .map_err(|_| anyhow::anyhow!("Environment variable {} not set", var))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WALLET: &str = "0x1234567890abcdef1234567890ABCDEF12345678";

    fn valid_manifest() -> HostConfigManifest {
        let mut manifest = HostConfigManifest::default();
        manifest.spec.identity = IdentityConfig {
            wallet_address: WALLET.to_string(),
            secret_key: "deadbeef".to_string(),
            membase_id: "manager-1".to_string(),
        };
        manifest
    }

    #[test]
    fn test_default_manifest() {
        let manifest = HostConfigManifest::default();
        assert_eq!(manifest.api_version, "agent-host/v1");
        assert_eq!(manifest.kind, "HostConfig");
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.memory_hub.address, "54.169.29.193:8081");
        assert_eq!(manifest.spec.memory_hub.settle_delay_ms, 500);
        assert_eq!(manifest.spec.api.port, 5000);
        assert_eq!(manifest.network(), ChainNetwork::BscTestnet);
        assert!(manifest.spec.llm.is_none());
    }

    #[test]
    fn test_load_from_file_fills_defaults() {
        let yaml = format!(
            r#"
apiVersion: agent-host/v1
kind: HostConfig
metadata:
  name: test-host
spec:
  identity:
    wallet_address: "{WALLET}"
    secret_key: "deadbeef"
    membase_id: "manager-1"
  chain:
    network: bsc-mainnet
  llm:
    type: openai-compatible
    endpoint: http://localhost:8000/v1
    model: local-model
    api_key: env:LOCAL_LLM_KEY
"#
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let manifest = HostConfigManifest::from_yaml_file(file.path()).unwrap();

        assert_eq!(manifest.metadata.name, "test-host");
        assert_eq!(manifest.network(), ChainNetwork::BscMainnet);
        assert_eq!(manifest.spec.memory_hub.address, DEFAULT_MEMORY_HUB_ADDRESS);
        assert_eq!(manifest.spec.api.bind_address, "0.0.0.0");
        let llm = manifest.spec.llm.as_ref().unwrap();
        assert_eq!(llm.provider_type, LlmProviderType::OpenaiCompatible);
        assert_eq!(llm.api_key.as_deref(), Some("env:LOCAL_LLM_KEY"));
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(HostConfigManifest::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent-host.yaml");
        let manifest = valid_manifest();
        manifest.to_yaml_file(&path).unwrap();

        let reloaded = HostConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(reloaded.spec.identity.membase_id, "manager-1");
        assert_eq!(reloaded.spec.identity.wallet_address, WALLET);
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = HostConfigManifest::default();
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MEMBASE_ACCOUNT", WALLET),
            ("MEMBASE_SECRET_KEY", "s3cret"),
            ("MEMBASE_ID", "from-env"),
            ("MEMORY_HUB_ADDRESS", "10.0.0.1:9000"),
            ("MEMBASE_NETWORK", "bsc-mainnet"),
            ("AGENT_HOST_PORT", "not-a-port"),
        ]);

        manifest.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(manifest.spec.identity.wallet_address, WALLET);
        assert_eq!(manifest.spec.identity.secret_key, "s3cret");
        assert_eq!(manifest.spec.identity.membase_id, "from-env");
        assert_eq!(manifest.spec.memory_hub.address, "10.0.0.1:9000");
        assert_eq!(manifest.network(), ChainNetwork::BscMainnet);
        // Invalid port is ignored
        assert_eq!(manifest.spec.api.port, 5000);
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let mut manifest = HostConfigManifest::default();
        manifest.spec.identity.wallet_address = "0x123".to_string();
        manifest.spec.memory_hub.address = "host:0".to_string();

        let err = manifest.validate().unwrap_err().to_string();

        assert!(err.contains("wallet_address"));
        assert!(err.contains("secret_key"));
        assert!(err.contains("membase_id"));
        assert!(err.contains("memory_hub.address"));
    }

    #[test]
    fn test_validation() {
        let mut manifest = valid_manifest();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "AgentConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.identity.secret_key = "   ".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.identity.secret_key = "deadbeef".to_string();

        manifest.spec.llm = Some(LlmConfig {
            provider_type: LlmProviderType::Ollama,
            endpoint: "http://localhost:11434".to_string(),
            model: "".to_string(),
            api_key: None,
            max_tokens: None,
            temperature: None,
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_display_masked_hides_secrets() {
        let mut manifest = valid_manifest();
        manifest.spec.llm = Some(LlmConfig {
            provider_type: LlmProviderType::Openai,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-live".to_string()),
            max_tokens: None,
            temperature: None,
        });

        let yaml = serde_yaml::to_string(&manifest.display_masked()).unwrap();

        assert!(!yaml.contains("deadbeef"));
        assert!(!yaml.contains("sk-live"));
        assert!(yaml.contains(WALLET));
    }

    #[test]
    fn test_resolve_env_reference_literal() {
        assert_eq!(resolve_env_reference("plain").unwrap(), "plain");
        assert!(resolve_env_reference("env:AGENT_HOST_TEST_UNSET_VARIABLE").is_err());
    }
}
