use serde::{Deserialize, Serialize};

use super::value::AssetBag;
use super::wallet::Wallet;

/// Action a transaction performs on an escrow output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Redeemer {
    /// Top up the escrow with `rewards`.
    AddRewards { rewards: AssetBag },
    /// Record `contributor` as the assignee.
    Assign { contributor: Wallet },
    /// Pay the fee out and lock the contributor share for claiming.
    Merge,
    /// Return everything to the maintainer.
    Close,
    /// Release a merged payout to its contributor.
    Claim,
}

impl Redeemer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddRewards { .. } => "add_rewards",
            Self::Assign { .. } => "assign",
            Self::Merge => "merge",
            Self::Close => "close",
            Self::Claim => "claim",
        }
    }
}
