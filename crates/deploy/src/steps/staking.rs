//! Fee distribution, farming and staking rewards.

use alloy_core::primitives::U256;

use crate::args::ArgValue;
use crate::step::{CallArg, ConfigCall, DeployStep};

use super::ProtocolParams;

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let p = params.clone();

    let fee_distributor = {
        let start = params.fee_distribution_start;
        DeployStep::new(101, "FeeDistributor")
            .tag("staking")
            .depends_on(["VotingEscrow", "EMOToken"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.dep("VotingEscrow")?),
                    ArgValue::Uint(U256::from(start)),
                    ArgValue::Address(ctx.dep("EMOToken")?),
                    ArgValue::Address(ctx.deployer),
                ])
            })
    };

    let multi_fee = DeployStep::new(102, "MultiFeeDistribution")
        .tag("staking")
        .depends_on(["EMOToken", "FeeDistributor"])
        .args(|ctx| {
            Ok(vec![
                ArgValue::Address(ctx.dep("EMOToken")?),
                ArgValue::Address(ctx.dep("FeeDistributor")?),
            ])
        });

    // Emission split: staking/dev/safu/referral shares in millionths, dev
    // share to the deployer, safu and referral shares to the treasury.
    let master_chef = DeployStep::new(103, "MasterChef")
        .tag("staking")
        .depends_on(["EMOToken", "MultiFeeDistribution", "VotingEscrow"])
        .args(move |ctx| {
            Ok(vec![
                ArgValue::Address(ctx.dep("EMOToken")?),
                ArgValue::Uint(p.staking_percent),
                ArgValue::Uint(p.dev_percent),
                ArgValue::Uint(p.safu_percent),
                ArgValue::Uint(p.refer_percent),
                ArgValue::Address(ctx.deployer),
                ArgValue::Address(p.treasury),
                ArgValue::Address(p.treasury),
                ArgValue::Address(ctx.dep("MultiFeeDistribution")?),
                ArgValue::Uint(p.emission_per_sec),
                ArgValue::Address(ctx.dep("VotingEscrow")?),
            ])
        });

    let reward_pool = DeployStep::new(104, "RewardPool")
        .tag("staking")
        .depends_on(["EMOToken", "MasterChef", "VotingEscrow"])
        .args(|ctx| {
            Ok(vec![
                ArgValue::Address(ctx.dep("EMOToken")?),
                ArgValue::Address(ctx.dep("EMOToken")?),
                ArgValue::Address(ctx.dep("MasterChef")?),
                ArgValue::Address(ctx.dep("VotingEscrow")?),
            ])
        })
        .configure(ConfigCall::on_dependency(
            "VotingEscrow",
            "setRewardPool",
            [CallArg::DeployedAddress],
        ));

    let incentives = {
        let p = params.clone();
        DeployStep::new(800, "SimpleIncentivesController")
            .tag("staking")
            .only_on(["bsctest"])
            .depends_on(["MasterChef"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(p.reward_token),
                    ArgValue::Address(p.incentives_lp),
                    ArgValue::Uint(p.incentives_per_sec),
                    ArgValue::Address(ctx.dep("MasterChef")?),
                    ArgValue::Address(ctx.dep("MasterChef")?),
                    ArgValue::Bool(false),
                ])
            })
    };

    vec![fee_distributor, multi_fee, master_chef, reward_pool, incentives]
}
