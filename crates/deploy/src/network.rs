//! Target network description.

/// Everything a deploy step needs to know about the chain it runs against.
///
/// `live` marks networks on which freshly deployed contracts are expected to
/// be publicly verified; it also gates any other public-network precaution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// Network name, e.g. `mainnet`, `testnet`, `bsctest`.
    pub name: String,
    /// EVM chain id.
    pub chain_id: u64,
    /// Whether explorer verification applies to this network.
    pub live: bool,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Fixed gas price in wei, if the network wants one.
    pub gas_price: Option<u64>,
}
