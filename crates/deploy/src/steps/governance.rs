//! Timelock and vote-escrow governance contracts.

use alloy_core::primitives::U256;

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let delay = params.timelock_delay_secs;

    vec![
        DeployStep::new(1, "TimeLock")
            .tag("governance")
            .only_on(["mainnet"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.deployer),
                    ArgValue::Uint(U256::from(delay)),
                ])
            }),
        DeployStep::new(100, "VotingEscrow")
            .tag("governance")
            .depends_on(["EMOToken"])
            .args(|ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.dep("EMOToken")?),
                    ArgValue::String("Vote Escrowed EMO".to_owned()),
                    ArgValue::String("veEMO".to_owned()),
                    ArgValue::String("veEMO_1.0.0".to_owned()),
                ])
            }),
    ]
}
