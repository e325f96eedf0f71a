//! Team and investor vesting, liquidity timelock. Mainnet only.

use alloy_core::primitives::U256;

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let mut steps = Vec::new();

    let v = params.vesting.clone();
    steps.push(
        DeployStep::new(300, "TeamTokenVesting")
            .tag("vesting")
            .only_on(["mainnet"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.deployer),
                    ArgValue::Uint(U256::from(v.start_time)),
                    ArgValue::Uint(U256::from(v.team_cliff_secs)),
                    ArgValue::Uint(U256::from(v.duration_secs)),
                ])
            }),
    );

    // One aliased instance per grant so each beneficiary gets its own
    // ledger record and verification entry.
    for (i, grant) in params.vc_grants.iter().enumerate() {
        let v = params.vesting.clone();
        let g = grant.clone();
        steps.push(
            DeployStep::new(301 + i as u32, format!("{}TokenVesting", grant.name))
                .contract("VCTokenVesting")
                .tag("vesting")
                .only_on(["mainnet"])
                .args(move |_| {
                    Ok(vec![
                        ArgValue::Address(g.beneficiary),
                        ArgValue::Uint(U256::from(v.start_time)),
                        ArgValue::Uint(U256::from(v.vc_cliff_secs)),
                        ArgValue::Uint(U256::from(v.duration_secs)),
                        ArgValue::Bool(g.revocable),
                    ])
                }),
        );
    }

    let lp_token = params.lp_token;
    let release = params.lp_release_time;
    steps.push(
        DeployStep::new(310, "LPTokenTimelock")
            .tag("vesting")
            .only_on(["mainnet"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(lp_token),
                    ArgValue::Address(ctx.deployer),
                    ArgValue::Uint(U256::from(release)),
                ])
            }),
    );

    steps
}
