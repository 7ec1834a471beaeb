use std::fmt;

use serde::{Deserialize, Serialize};

use super::serde_util::opt_hex;

/// A party able to receive funds and authorize actions: payment credential
/// plus an optional staking credential.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wallet {
    #[serde(with = "hex::serde")]
    pub payment_key: Vec<u8>,
    #[serde(with = "opt_hex")]
    pub stake_key: Option<Vec<u8>>,
}

impl Wallet {
    pub fn new(payment_key: impl Into<Vec<u8>>, stake_key: Option<Vec<u8>>) -> Self {
        Self {
            payment_key: payment_key.into(),
            stake_key,
        }
    }

    /// Wallet with a payment credential only.
    pub fn enterprise(payment_key: impl Into<Vec<u8>>) -> Self {
        Self::new(payment_key, None)
    }

    /// Two wallets are the same signer when their payment credentials match.
    /// The staking part never authorizes anything.
    pub fn same_signer(&self, other: &Wallet) -> bool {
        self.payment_key == other.payment_key
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.payment_key))?;
        if let Some(stake) = &self.stake_key {
            write!(f, "+{}", hex::encode(stake))?;
        }
        Ok(())
    }
}
