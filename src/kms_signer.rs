use alloy::primitives::Address;
use alloy::signers::{aws::AwsSigner, Signer};
use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_kms::Client as KmsClient;
use tracing::info;

#[derive(Clone)]
pub struct KmsSigner {
    signer: AwsSigner,
}

impl KmsSigner {
    pub async fn new(key_id: String, region: String, chain_id: u64) -> Result<Self> {
        info!(key_id = %key_id, region = %region, "initializing AWS KMS signer");

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;
        let kms_client = KmsClient::new(&config);

        let signer = AwsSigner::new(kms_client, key_id, Some(chain_id))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create AWS signer: {}", e))?;

        info!(address = %signer.address(), "KMS signer initialized");
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn into_inner(self) -> AwsSigner {
        self.signer
    }
}
