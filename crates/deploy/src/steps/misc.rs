//! Auxiliary deployments: test tokens, faucet, dashboard.

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let faucet_tokens = params.stablecoins.clone();
    let usdc = params.usdc;

    vec![
        DeployStep::new(200, "GemEMO").tag("misc").only_on(["bsctest"]),
        DeployStep::new(201, "Treasury").tag("misc").only_on(["bsctest"]),
        DeployStep::new(402, "StakingPoolFactory")
            .tag("misc")
            .only_on(["bsctest"]),
        DeployStep::new(500, "EvmosFaucet")
            .tag("misc")
            .only_on(["testnet", "bsctest"])
            .args(move |_| Ok(faucet_tokens.iter().copied().map(ArgValue::Address).collect())),
        DeployStep::new(999, "Dashboard")
            .tag("misc")
            .depends_on(["WEVMOS", "EMOToken", "MasterChef", "EvmoSwapFactory"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.dep("WEVMOS")?),
                    ArgValue::Address(usdc),
                    ArgValue::Address(ctx.dep("EMOToken")?),
                    ArgValue::Address(ctx.dep("MasterChef")?),
                    ArgValue::Address(ctx.dep("EvmoSwapFactory")?),
                ])
            }),
    ]
}
