use crate::registry::ContractName;
use alloy::primitives::Address;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use toml::map::Map;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    pub chain: ChainSettings,
    pub wallet: Option<WalletSettings>,
    pub kms: Option<KmsSettings>,
    pub contracts: ContractSettings,
    #[serde(default)]
    pub watchtower: WatchtowerSettings,
    pub retry: RetrySettings,
    pub monitoring: MonitoringSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub execution_http_url: String,
    pub execution_ws_url: Option<String>,
    pub consensus_http_url: Option<String>,
    #[serde(default = "default_rpc_timeout_seconds")]
    pub rpc_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletSettings {
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KmsSettings {
    pub key_id: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractSettings {
    pub storage_address: String,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchtowerSettings {
    #[serde(default)]
    pub wait_for_registration: bool,
    #[serde(default = "default_registration_poll_seconds")]
    pub registration_poll_seconds: u64,
    #[serde(default = "default_process_withdrawals_interval_seconds")]
    pub process_withdrawals_interval_seconds: u64,
    #[serde(default = "default_dissolve_timed_out_interval_seconds")]
    pub dissolve_timed_out_interval_seconds: u64,
}

impl Default for WatchtowerSettings {
    fn default() -> Self {
        Self {
            wait_for_registration: false,
            registration_poll_seconds: default_registration_poll_seconds(),
            process_withdrawals_interval_seconds: default_process_withdrawals_interval_seconds(),
            dissolve_timed_out_interval_seconds: default_dissolve_timed_out_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringSettings {
    pub transaction_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

fn default_rpc_timeout_seconds() -> u64 {
    30
}

fn default_registration_poll_seconds() -> u64 {
    15
}

fn default_process_withdrawals_interval_seconds() -> u64 {
    60
}

fn default_dissolve_timed_out_interval_seconds() -> u64 {
    300
}

impl ChainConfig {
    pub fn load(path: &str) -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let common_content = Self::load_common_config()?;
        let specific_content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?;

        // Specific config overrides common
        let merged_content = Self::merge_configs(common_content, specific_content)?;
        let content = Self::substitute_env_vars(merged_content)?;

        let mut config: ChainConfig = toml::from_str(&content)?;
        config.clear_unset_optionals()?;
        config.validate()?;
        Ok(config)
    }

    /// Optional settings whose variable was never set are treated as absent,
    /// so a config can list both wallet sources and let the environment pick.
    fn clear_unset_optionals(&mut self) -> Result<()> {
        let re = Regex::new(ENV_PLACEHOLDER)?;
        let resolved =
            |value: Option<String>| value.filter(|v| !v.trim().is_empty() && !is_placeholder(&re, v));

        self.chain.execution_ws_url = resolved(self.chain.execution_ws_url.take());
        self.chain.consensus_http_url = resolved(self.chain.consensus_http_url.take());
        if let Some(wallet) = self.wallet.as_mut() {
            wallet.private_key = resolved(wallet.private_key.take());
        }
        if let Some(kms) = self.kms.as_mut() {
            kms.region = resolved(kms.region.take());
        }
        if self
            .kms
            .as_ref()
            .is_some_and(|kms| resolved(Some(kms.key_id.clone())).is_none())
        {
            self.kms = None;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("chain.rpc_timeout_seconds must be positive"));
        }
        if self.watchtower.registration_poll_seconds == 0
            || self.watchtower.process_withdrawals_interval_seconds == 0
            || self.watchtower.dissolve_timed_out_interval_seconds == 0
        {
            return Err(anyhow::anyhow!("watchtower intervals must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow::anyhow!("retry.max_attempts must be at least 1"));
        }
        if self.monitoring.poll_interval_seconds == 0
            || self.monitoring.transaction_timeout_seconds == 0
        {
            return Err(anyhow::anyhow!("monitoring intervals must be positive"));
        }
        let re = Regex::new(ENV_PLACEHOLDER)?;
        let required = [
            ("chain.execution_http_url", &self.chain.execution_http_url),
            ("contracts.storage_address", &self.contracts.storage_address),
        ];
        for (field, value) in required.into_iter().chain(
            self.contracts
                .overrides
                .values()
                .map(|address| ("contracts.overrides", address)),
        ) {
            if let Some(var) = unresolved_var(&re, value) {
                return Err(anyhow::anyhow!(
                    "{} references environment variable {} which is not set",
                    field,
                    var
                ));
            }
        }
        self.storage_address()?;
        self.contract_overrides()?;
        Ok(())
    }

    pub fn storage_address(&self) -> Result<Address> {
        Address::from_str(&self.contracts.storage_address).map_err(|e| {
            anyhow::anyhow!(
                "Invalid storage address {}: {}",
                self.contracts.storage_address,
                e
            )
        })
    }

    pub fn contract_overrides(&self) -> Result<BTreeMap<ContractName, Address>> {
        self.contracts
            .overrides
            .iter()
            .map(|(name, address)| -> Result<(ContractName, Address)> {
                let name = ContractName::from_str(name)?;
                let address = Address::from_str(address)
                    .map_err(|e| anyhow::anyhow!("Invalid address for {}: {}", name, e))?;
                Ok((name, address))
            })
            .collect()
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.rpc_timeout_seconds)
    }

    fn load_common_config() -> Result<String> {
        let common_path = "configs/common.toml";
        match fs::read_to_string(common_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::new()),
        }
    }

    fn merge_configs(common: String, specific: String) -> Result<String> {
        if common.is_empty() {
            return Ok(specific);
        }

        let common_toml: toml::Value = toml::from_str(&common)?;
        let specific_toml: toml::Value = toml::from_str(&specific)?;

        let merged = Self::merge_toml_values(common_toml, specific_toml);
        Ok(toml::to_string_pretty(&merged)?)
    }

    fn merge_toml_values(mut base: toml::Value, override_val: toml::Value) -> toml::Value {
        match (&mut base, override_val) {
            (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
                for (key, value) in override_map {
                    let existing = base_map
                        .get(&key)
                        .cloned()
                        .unwrap_or(toml::Value::Table(Map::new()));
                    base_map.insert(key, Self::merge_toml_values(existing, value));
                }
                base
            }
            (_, override_val) => override_val,
        }
    }

    fn substitute_env_vars(content: String) -> Result<String> {
        let re = Regex::new(ENV_PLACEHOLDER)?;
        let mut result = content.clone();

        for cap in re.captures_iter(&content) {
            let var_name = &cap[1];
            if let Ok(value) = env::var(var_name) {
                result = result.replace(&cap[0], &value);
            }
        }

        Ok(result)
    }
}

/// `${VAR}` reference substituted from the environment at load time.
const ENV_PLACEHOLDER: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// True when the whole value is a single placeholder left unsubstituted.
fn is_placeholder(re: &Regex, value: &str) -> bool {
    let value = value.trim();
    re.find(value)
        .is_some_and(|m| m.start() == 0 && m.end() == value.len())
}

fn unresolved_var(re: &Regex, value: &str) -> Option<String> {
    re.captures(value).map(|cap| cap[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[chain]
chain_id = 1
execution_http_url = "http://localhost:8545"

[contracts]
storage_address = "0x1d8f8f00cfa6758d7bE78336684788Fb0ee0Fa46"

[retry]
max_attempts = 3
base_delay_seconds = 5
max_delay_seconds = 300
backoff_multiplier = 2.0

[monitoring]
transaction_timeout_seconds = 300
poll_interval_seconds = 5
"#;

    #[test]
    fn test_defaults_apply() {
        let config: ChainConfig = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();
        assert_eq!(config.chain.rpc_timeout_seconds, 30);
        assert_eq!(config.watchtower.process_withdrawals_interval_seconds, 60);
        assert_eq!(config.watchtower.dissolve_timed_out_interval_seconds, 300);
        assert!(!config.watchtower.wait_for_registration);
        assert!(config.wallet.is_none());
        assert!(config.contract_overrides().unwrap().is_empty());
    }

    #[test]
    fn test_specific_overrides_common() {
        let common = r#"
[chain]
chain_id = 1
execution_http_url = "http://common:8545"

[watchtower]
registration_poll_seconds = 30
"#
        .to_string();
        let specific = r#"
[chain]
execution_http_url = "http://specific:8545"
"#
        .to_string();

        let merged = ChainConfig::merge_configs(common, specific).unwrap();
        let value: toml::Value = toml::from_str(&merged).unwrap();
        assert_eq!(value["chain"]["chain_id"].as_integer(), Some(1));
        assert_eq!(
            value["chain"]["execution_http_url"].as_str(),
            Some("http://specific:8545")
        );
        assert_eq!(
            value["watchtower"]["registration_poll_seconds"].as_integer(),
            Some(30)
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config: ChainConfig = toml::from_str(MINIMAL).unwrap();
        config.watchtower.process_withdrawals_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unset_optionals_are_cleared() {
        let mut config: ChainConfig = toml::from_str(MINIMAL).unwrap();
        config.chain.consensus_http_url = Some("${CONSENSUS_HTTP_URL}".to_string());
        config.wallet = Some(WalletSettings {
            private_key: Some(" ${NODE_PRIVATE_KEY} ".to_string()),
        });
        config.kms = Some(KmsSettings {
            key_id: "".to_string(),
            region: Some("eu-west-1".to_string()),
        });

        config.clear_unset_optionals().unwrap();
        assert!(config.chain.consensus_http_url.is_none());
        assert!(config.wallet.unwrap().private_key.is_none());
        assert!(config.kms.is_none());
    }

    #[test]
    fn test_unresolved_required_field_rejected() {
        let mut config: ChainConfig = toml::from_str(MINIMAL).unwrap();
        config.chain.execution_http_url = "${EXECUTION_HTTP_URL}".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("EXECUTION_HTTP_URL"));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut config: ChainConfig = toml::from_str(MINIMAL).unwrap();
        config.contracts.overrides.insert(
            "rocketVault".to_string(),
            "0x1111111111111111111111111111111111111111".to_string(),
        );
        assert!(config.validate().is_err());

        config.contracts.overrides.clear();
        config.contracts.overrides.insert(
            "rocketPoolToken".to_string(),
            "0x1111111111111111111111111111111111111111".to_string(),
        );
        let overrides = config.contract_overrides().unwrap();
        assert_eq!(
            overrides[&ContractName::RocketPoolToken],
            Address::repeat_byte(0x11)
        );
    }
}
