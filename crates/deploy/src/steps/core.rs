//! Token, AMM core and supporting infrastructure.

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

pub(super) fn steps(_params: &ProtocolParams) -> Vec<DeployStep> {
    vec![
        DeployStep::new(0, "MulticallV2").tag("infra"),
        DeployStep::new(2, "EMOToken").tag("core"),
        DeployStep::new(3, "EvmoSwapFactory")
            .tag("core")
            .args(|ctx| Ok(vec![ArgValue::Address(ctx.deployer)])),
        DeployStep::new(4, "WEVMOS").tag("core"),
        DeployStep::new(5, "EvmoSwapRouter")
            .tag("core")
            .depends_on(["EvmoSwapFactory", "WEVMOS"])
            .args(|ctx| {
                Ok(vec![
                    ArgValue::Address(ctx.dep("EvmoSwapFactory")?),
                    ArgValue::Address(ctx.dep("WEVMOS")?),
                ])
            }),
    ]
}
