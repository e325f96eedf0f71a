//! The EvmoSwap protocol step catalog.
//!
//! Pure data over the deployment library: every step declares its ordering
//! number, dependencies, target networks and a closure producing its
//! constructor arguments from [`ProtocolParams`] and resolved dependency
//! addresses. Defaults reproduce the historical launch parameters.

mod core;
mod governance;
mod misc;
mod sale;
mod stableswap;
mod staking;
mod vesting;

use alloy_core::primitives::{Address, U256, address};
use serde::{Deserialize, Serialize};

use crate::step::DeployStep;

const DAY: u64 = 86_400;

// Launch schedule, as unix timestamps.
/// 2022-04-25 15:00:00 UTC.
const FEE_DISTRIBUTION_START: u64 = 1_650_898_800;
/// 2022-05-06 04:10:00 UTC.
const SALE_START: u64 = 1_651_810_200;
/// 2022-05-06 04:30:00 UTC.
const SALE_END: u64 = 1_651_811_400;
/// 2022-05-10 00:00:00 UTC.
const VESTING_START: u64 = 1_652_140_800;
/// 2022-11-12 09:00:00 UTC.
const LP_RELEASE: u64 = 1_668_243_600;

/// One vesting grant deployed as an aliased `VCTokenVesting` instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcGrant {
    /// Alias prefix; the ledger name becomes `<name>TokenVesting`.
    pub name: String,
    pub beneficiary: Address,
    pub revocable: bool,
}

/// Private sale schedule and pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleParams {
    /// Sale price in USDC base units per token.
    pub sale_price: U256,
    /// Listing price in USDC base units per token.
    pub listing_price: U256,
    pub min_commit: U256,
    pub max_commit: U256,
    pub hard_cap: U256,
    pub start_time: u64,
    pub end_time: u64,
    pub claim_delay_secs: u64,
}

impl Default for SaleParams {
    fn default() -> Self {
        Self {
            sale_price: U256::from(45_000u64),
            listing_price: U256::from(4_300_000u64),
            min_commit: ether(26_000),
            max_commit: ether(133_500),
            hard_cap: ether(14_000_000),
            start_time: SALE_START,
            end_time: SALE_END,
            claim_delay_secs: DAY,
        }
    }
}

/// Token vesting schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VestingParams {
    pub start_time: u64,
    pub team_cliff_secs: u64,
    pub vc_cliff_secs: u64,
    pub duration_secs: u64,
}

impl Default for VestingParams {
    fn default() -> Self {
        Self {
            start_time: VESTING_START,
            team_cliff_secs: 90 * DAY,
            vc_cliff_secs: 30 * DAY,
            duration_secs: 365 * DAY,
        }
    }
}

/// Every tunable the catalog consumes. Defaults are the launch values; any
/// field can be overridden from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Receives the SAFU and referral emission shares and sale proceeds.
    pub treasury: Address,
    /// Operational account for the private sale.
    pub keeper: Address,
    pub usdc: Address,
    /// 3pool constituents, in pool order.
    pub stablecoins: Vec<Address>,
    pub stablecoin_decimals: Vec<U256>,
    pub timelock_delay_secs: u64,
    /// Unix time fee distribution starts.
    pub fee_distribution_start: u64,
    /// EMO minted per second by the farm, in wei.
    pub emission_per_sec: U256,
    /// Emission split in millionths.
    pub staking_percent: U256,
    pub dev_percent: U256,
    pub safu_percent: U256,
    pub refer_percent: U256,
    /// 3pool amplification coefficient.
    pub amplification: U256,
    /// 3pool swap fee, 1e10 denominated.
    pub swap_fee: U256,
    /// 3pool admin fee, 1e10 denominated.
    pub admin_fee: U256,
    pub sale: SaleParams,
    pub vesting: VestingParams,
    pub vc_grants: Vec<VcGrant>,
    /// EMO/WEVMOS LP token locked for liquidity.
    pub lp_token: Address,
    pub lp_release_time: u64,
    /// Reward token for the standalone incentives controller.
    pub reward_token: Address,
    pub incentives_lp: Address,
    pub incentives_per_sec: U256,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            treasury: address!("0x87888cdc0c2a34148f17b6cc1d100706d9792ccb"),
            keeper: address!("0x87888cdc0c2a34148f17b6cc1d100706d9792ccb"),
            usdc: address!("0x9b5bb7f5be680843bcd3b54d4e5c6ee889c124df"),
            stablecoins: vec![
                address!("0x6456d6f7b224283f8b22f03347b58d8b6d975677"),
                address!("0x9b5bb7f5be680843bcd3b54d4e5c6ee889c124df"),
                address!("0x648d3d969760fdabc71ea9d59c020ad899237b32"),
            ],
            stablecoin_decimals: vec![U256::from(18u8), U256::from(6u8), U256::from(6u8)],
            timelock_delay_secs: DAY,
            fee_distribution_start: FEE_DISTRIBUTION_START,
            emission_per_sec: U256::from(2_563_100_000_000_000_000u64),
            staking_percent: U256::from(857_000u64),
            dev_percent: U256::from(90_000u64),
            safu_percent: U256::from(10_000u64),
            refer_percent: U256::from(43_000u64),
            amplification: U256::from(800u64),
            swap_fee: U256::from(1_000_000u64),
            admin_fee: U256::from(5_000_000_000u64),
            sale: SaleParams::default(),
            vesting: VestingParams::default(),
            vc_grants: vec![
                grant("VC-JACK", address!("0x1980be49e30585d6ba946a9790f93b36adb1a277")),
                grant("VC-MIKE", address!("0x5e6b3f619a41a3165f81e72623d050c07b62b9ee")),
                grant("VC-HEX", address!("0xbd126b1dc4314e4153856c486f6a1e3ca5302b56")),
                grant("VC-ANT", address!("0x87888cdc0c2a34148f17b6cc1d100706d9792ccb")),
                grant("VC-ZF", address!("0x508e7934863b50506442bb7942b28a2928ae5c11")),
            ],
            lp_token: address!("0xed75347ffbe08d5cce4858c70df4db4bbe8532a0"),
            lp_release_time: LP_RELEASE,
            reward_token: address!("0x3094a01fc000a38c1996fe6c17e92aada0e585a5"),
            incentives_lp: address!("0xf6210a01e8f271862871a80dbf3fdcd720f8ef3c"),
            incentives_per_sec: U256::from(250_000_000_000_000_000u64),
        }
    }
}

fn grant(name: &str, beneficiary: Address) -> VcGrant {
    VcGrant {
        name: name.to_owned(),
        beneficiary,
        revocable: true,
    }
}

/// `n` whole tokens at 18 decimals.
fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u8))
}

/// The full protocol catalog, ready for [`crate::runner::select_steps`].
pub fn protocol_steps(params: &ProtocolParams) -> Vec<DeployStep> {
    let mut steps = Vec::new();
    steps.extend(core::steps(params));
    steps.extend(governance::steps(params));
    steps.extend(staking::steps(params));
    steps.extend(stableswap::steps(params));
    steps.extend(vesting::steps(params));
    steps.extend(sale::steps(params));
    steps.extend(misc::steps(params));
    steps
}
