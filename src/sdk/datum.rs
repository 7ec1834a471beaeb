use serde::{Deserialize, Serialize};

use super::serde_util::required;
use super::value::AssetBag;
use super::wallet::Wallet;

/// Escrow datum attached to every bounty output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BountyRecord {
    pub admin: Wallet,
    pub maintainer: Wallet,
    #[serde(deserialize_with = "required")]
    pub contributor: Option<Wallet>,
    /// Reward fee in basis points, copied from settings at creation.
    pub bounty_reward_fee: u64,
    /// POSIX milliseconds.
    pub deadline: u64,
    pub merged: bool,
    pub initial_value: AssetBag,
}

/// Where a bounty sits in its lifecycle, derived from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BountyState {
    Open,
    Assigned,
    Merged,
}

impl BountyRecord {
    /// Fresh record for a newly funded bounty. The reward fee is taken from
    /// the settings in force at creation and never changes afterwards.
    pub fn open(
        settings: &SettingsRecord,
        admin: Wallet,
        maintainer: Wallet,
        deadline: u64,
        initial_value: AssetBag,
    ) -> Self {
        Self {
            admin,
            maintainer,
            contributor: None,
            bounty_reward_fee: settings.reward_fee,
            deadline,
            merged: false,
            initial_value,
        }
    }

    pub fn state(&self) -> BountyState {
        match (self.merged, &self.contributor) {
            (true, _) => BountyState::Merged,
            (false, Some(_)) => BountyState::Assigned,
            (false, None) => BountyState::Open,
        }
    }

    pub fn with_contributor(&self, contributor: Wallet) -> Self {
        Self {
            contributor: Some(contributor),
            ..self.clone()
        }
    }

    pub fn into_merged(self) -> Self {
        Self {
            merged: true,
            ..self
        }
    }
}

/// Deployment-wide fee configuration. Read by transitions, never spent by them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsRecord {
    pub githoney_address: Wallet,
    pub creation_fee: u64,
    /// Basis points charged on rewards at merge.
    pub reward_fee: u64,
}
