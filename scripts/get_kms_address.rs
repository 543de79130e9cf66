use anyhow::Result;
use node_watchtower::kms_signer::KmsSigner;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <KMS_KEY_ID> <AWS_REGION>", args[0]);
        std::process::exit(1);
    }

    let key_id = &args[1];
    let region = &args[2];
    eprintln!("Deriving node address from KMS key {} in {}", key_id, region);

    // Chain id does not affect the derived address.
    let signer = KmsSigner::new(key_id.to_string(), region.to_string(), 1).await?;
    let address = signer.address();

    println!("0x{}", hex::encode(address.as_slice()));
    eprintln!("Register this address as the node account and fund it for gas");

    Ok(())
}
