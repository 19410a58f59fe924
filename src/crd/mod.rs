//! Submariner custom resources consumed by the diagnostics
//!
//! These are read-only views: only the fields the checks look at are
//! modelled, everything else in the objects is ignored on decode.

mod endpoint;
mod submariner;

pub use endpoint::{ConnectionStatus, Endpoint, EndpointSpec, HaStatus};
pub use submariner::{Connection, GatewayStatus, Submariner, SubmarinerSpec, SubmarinerStatus};

/// Namespace the Submariner operator and its resources live in
pub const OPERATOR_NAMESPACE: &str = "submariner-operator";

/// Well-known name of the Submariner resource
pub const SUBMARINER_NAME: &str = "submariner";

/// Node label marking gateway nodes
pub const GATEWAY_LABEL: &str = "submariner.io/gateway";
