//! Stable-swap 3pool: math libraries, LP token, pool.

use alloy_core::primitives::U256;

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

const NETWORKS: [&str; 2] = ["testnet", "bsctest"];

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let p = params.clone();

    vec![
        DeployStep::new(105, "MathUtils").tag("stableswap").only_on(NETWORKS),
        DeployStep::new(106, "EvmoSwapUtils")
            .tag("stableswap")
            .only_on(NETWORKS)
            .link("MathUtils"),
        DeployStep::new(107, "ThreePoolLPToken")
            .contract("LPToken")
            .tag("stableswap")
            .only_on(NETWORKS)
            .args(|_| {
                Ok(vec![
                    ArgValue::String("3EMO".to_owned()),
                    ArgValue::String("3EMO-LP".to_owned()),
                    ArgValue::Uint(U256::from(18u8)),
                ])
            }),
        DeployStep::new(108, "EvmoSwap3Pool")
            .contract("EvmoSwap")
            .tag("stableswap")
            .only_on(NETWORKS)
            .link("EvmoSwapUtils")
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::AddressArray(p.stablecoins.clone()),
                    ArgValue::UintArray(p.stablecoin_decimals.clone()),
                    ArgValue::String("3EMO".to_owned()),
                    ArgValue::String("3EMO-LP".to_owned()),
                    ArgValue::Uint(p.amplification),
                    ArgValue::Uint(p.swap_fee),
                    ArgValue::Uint(p.admin_fee),
                    ArgValue::Uint(U256::ZERO),
                    ArgValue::Uint(U256::ZERO),
                    ArgValue::Address(ctx.deployer),
                ])
            }),
    ]
}
