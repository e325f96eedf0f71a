//! Private sale and IFO infrastructure.

use alloy_core::primitives::U256;

use crate::args::ArgValue;
use crate::step::DeployStep;

use super::ProtocolParams;

pub(super) fn steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let p = params.clone();

    vec![
        DeployStep::new(400, "EMOPrivateSale")
            .tag("sale")
            .only_on(["testnet", "bsctest"])
            .depends_on(["EMOToken"])
            .args(move |ctx| {
                Ok(vec![
                    ArgValue::Address(p.treasury),
                    ArgValue::Address(p.keeper),
                    ArgValue::Address(p.usdc),
                    ArgValue::Address(ctx.dep("EMOToken")?),
                    ArgValue::Uint(p.sale.sale_price),
                    ArgValue::Uint(p.sale.listing_price),
                    ArgValue::Uint(p.sale.min_commit),
                    ArgValue::Uint(p.sale.max_commit),
                    ArgValue::Uint(p.sale.hard_cap),
                    ArgValue::Uint(U256::from(p.sale.start_time)),
                    ArgValue::Uint(U256::from(p.sale.end_time)),
                    ArgValue::Uint(U256::from(p.sale.claim_delay_secs)),
                ])
            }),
        DeployStep::new(401, "IFODeployer").tag("sale").only_on(["mainnet"]),
    ]
}
