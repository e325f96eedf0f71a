//! Constructor and call argument values.
//!
//! A deliberately small subset of the Solidity ABI, enough for every
//! constructor and setter in the protocol. Values serialize into ledger
//! records and parse back from the CLI as `type:value` pairs.

use std::fmt;
use std::str::FromStr;

use alloy_core::dyn_abi::DynSolValue;
use alloy_core::primitives::{Address, U256, keccak256};
use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// One ABI value as it appears in a constructor or setter argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Address(Address),
    Uint(U256),
    String(String),
    Bool(bool),
    AddressArray(Vec<Address>),
    UintArray(Vec<U256>),
}

impl ArgValue {
    /// Canonical Solidity type name, as used in function selectors.
    pub fn sol_type(&self) -> &'static str {
        match self {
            ArgValue::Address(_) => "address",
            ArgValue::Uint(_) => "uint256",
            ArgValue::String(_) => "string",
            ArgValue::Bool(_) => "bool",
            ArgValue::AddressArray(_) => "address[]",
            ArgValue::UintArray(_) => "uint256[]",
        }
    }

    fn to_sol(&self) -> DynSolValue {
        match self {
            ArgValue::Address(a) => DynSolValue::Address(*a),
            ArgValue::Uint(u) => DynSolValue::Uint(*u, 256),
            ArgValue::String(s) => DynSolValue::String(s.clone()),
            ArgValue::Bool(b) => DynSolValue::Bool(*b),
            ArgValue::AddressArray(addrs) => {
                DynSolValue::Array(addrs.iter().map(|a| DynSolValue::Address(*a)).collect())
            }
            ArgValue::UintArray(uints) => {
                DynSolValue::Array(uints.iter().map(|u| DynSolValue::Uint(*u, 256)).collect())
            }
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Address(a) => write!(f, "{a}"),
            ArgValue::Uint(u) => write!(f, "{u}"),
            ArgValue::String(s) => write!(f, "{s}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::AddressArray(addrs) => {
                let parts: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            }
            ArgValue::UintArray(uints) => {
                let parts: Vec<String> = uints.iter().map(|u| u.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            }
        }
    }
}

/// Parses the CLI syntax `type:value`, e.g. `address:0xabc…`, `uint:800`,
/// `bool:true`, `string:veEMO`, `address[]:0xa,0xb`, `uint[]:1,2,3`.
impl FromStr for ArgValue {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, raw) = s
            .split_once(':')
            .ok_or_else(|| DeployError::InvalidArgument(format!("expected `type:value`, got `{s}`")))?;
        let invalid = |what: &str| DeployError::InvalidArgument(format!("bad {what} `{raw}`"));
        match ty {
            "address" => Ok(ArgValue::Address(raw.parse().map_err(|_| invalid("address"))?)),
            "uint" | "uint256" => {
                Ok(ArgValue::Uint(U256::from_str(raw).map_err(|_| invalid("uint"))?))
            }
            "string" => Ok(ArgValue::String(raw.to_owned())),
            "bool" => Ok(ArgValue::Bool(raw.parse().map_err(|_| invalid("bool"))?)),
            "address[]" => {
                let addrs = raw
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(|p| p.trim().parse().map_err(|_| invalid("address list")))
                    .collect::<Result<Vec<Address>, _>>()?;
                Ok(ArgValue::AddressArray(addrs))
            }
            "uint[]" | "uint256[]" => {
                let uints = raw
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(|p| U256::from_str(p.trim()).map_err(|_| invalid("uint list")))
                    .collect::<Result<Vec<U256>, _>>()?;
                Ok(ArgValue::UintArray(uints))
            }
            other => Err(DeployError::InvalidArgument(format!(
                "unsupported argument type `{other}`"
            ))),
        }
    }
}

/// ABI-encodes constructor arguments for appending to creation bytecode.
/// An empty argument list encodes to nothing.
pub fn encode_constructor(args: &[ArgValue]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }
    DynSolValue::Tuple(args.iter().map(ArgValue::to_sol).collect()).abi_encode_params()
}

/// ABI-encodes a function call: 4-byte selector over the canonical signature
/// followed by the encoded arguments.
pub fn encode_call(method: &str, args: &[ArgValue]) -> Vec<u8> {
    let types: Vec<&str> = args.iter().map(ArgValue::sol_type).collect();
    let signature = format!("{method}({})", types.join(","));
    let selector = &keccak256(signature.as_bytes())[..4];

    let mut data = selector.to_vec();
    data.extend(encode_constructor(args));
    data
}
