use crate::error::DaemonError;
use crate::minipool::{get_node_minipool_details, MinipoolDetail};
use crate::node::require_node_registered;
use crate::provider::Provider;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MinipoolStatusResponse {
    pub minipools: Vec<MinipoolDetail>,
}

pub async fn get_status(provider: &Provider) -> Result<MinipoolStatusResponse, DaemonError> {
    let node = require_node_registered(provider).await?;
    let minipools = get_node_minipool_details(provider, node).await?;
    Ok(MinipoolStatusResponse { minipools })
}
