//! Operator request handlers. Each one checks the registration gate before
//! touching the chain and returns a serializable response.

pub mod minipool;
pub mod node;

pub use minipool::{get_status, MinipoolStatusResponse};
pub use node::{can_send_from_node, send_from_node, CanSendFromNodeResponse, SendFromNodeResponse};
