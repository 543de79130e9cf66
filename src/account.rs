//! The node's signing account.

use crate::config::ChainConfig;
use crate::kms_signer::KmsSigner;
use alloy::consensus::TxEnvelope;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder, TransactionBuilderError};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Address plus the wallet able to sign for it. Immutable once unlocked.
#[derive(Clone)]
pub struct Account {
    address: Address,
    wallet: EthereumWallet,
}

impl Account {
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| anyhow::anyhow!("Invalid node private key: {}", e))?
            .with_chain_id(Some(chain_id));
        Ok(Self::from_signer(signer))
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        }
    }

    pub fn from_kms(signer: KmsSigner) -> Self {
        let address = signer.address();
        Self {
            address,
            wallet: EthereumWallet::from(signer.into_inner()),
        }
    }

    /// Unlocks the account described by the config: a local key takes
    /// precedence over KMS. Returns `None` when neither is configured.
    pub async fn from_config(config: &ChainConfig) -> Result<Option<Self>> {
        let chain_id = config.chain.chain_id;

        if let Some(private_key) = config.wallet.as_ref().and_then(|w| w.private_key.as_deref()) {
            let account = Self::from_private_key(private_key, chain_id)?;
            info!(address = %account.address, "node wallet unlocked");
            return Ok(Some(account));
        }

        if let Some(kms) = &config.kms {
            let region = kms.region.clone().unwrap_or_else(|| "us-east-1".to_string());
            let signer = KmsSigner::new(kms.key_id.clone(), region, chain_id).await?;
            return Ok(Some(Self::from_kms(signer)));
        }

        Ok(None)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs a fully prepared request.
    pub async fn sign(
        &self,
        tx: TransactionRequest,
    ) -> Result<TxEnvelope, TransactionBuilderError<Ethereum>> {
        tx.with_from(self.address).build(&self.wallet).await
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account").field("address", &self.address).finish()
    }
}
