//! Multi-asset value held by ledger outputs.
//!
//! An [`AssetBag`] maps each [`AssetClass`] to a strictly positive quantity.
//! Quantities are unbounded so that merging reward bags can never wrap.

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::BountyError;
use super::serde_util::decimal;

/// Maximum distinct asset classes, native asset included, one escrow output
/// may carry. Bounded by the per-output size and execution budget.
pub const MAX_ASSETS: usize = 15;

/// Basis-point denominator for reward fees (1 bp = 0.01%).
pub const BASIS_POINTS: u64 = 10_000;

/// Identifies a fungible or non-fungible asset type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetClass {
    #[serde(with = "hex::serde")]
    pub policy_id: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub asset_name: Vec<u8>,
}

impl AssetClass {
    pub fn new(policy_id: impl Into<Vec<u8>>, asset_name: impl Into<Vec<u8>>) -> Self {
        Self {
            policy_id: policy_id.into(),
            asset_name: asset_name.into(),
        }
    }

    /// The ledger's native base asset.
    pub fn lovelace() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_lovelace(&self) -> bool {
        self.policy_id.is_empty() && self.asset_name.is_empty()
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_lovelace() {
            return write!(f, "lovelace");
        }
        write!(
            f,
            "{}.{}",
            hex::encode(&self.policy_id),
            hex::encode(&self.asset_name)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBag(BTreeMap<AssetClass, BigUint>);

impl AssetBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bag holding only `quantity` of the native asset.
    pub fn lovelace(quantity: u64) -> Self {
        Self::new().with(AssetClass::lovelace(), quantity)
    }

    /// Builder-style [`AssetBag::add`] for small literal quantities.
    pub fn with(mut self, asset: AssetClass, quantity: u64) -> Self {
        self.add(asset, BigUint::from(quantity));
        self
    }

    /// Adds `quantity` of `asset`. Zero quantities are dropped.
    pub fn add(&mut self, asset: AssetClass, quantity: BigUint) {
        if quantity.is_zero() {
            return;
        }
        *self.0.entry(asset).or_default() += quantity;
    }

    pub fn quantity_of(&self, asset: &AssetClass) -> BigUint {
        self.0.get(asset).cloned().unwrap_or_default()
    }

    /// Per-class sum of both bags.
    pub fn merge(&self, other: &AssetBag) -> AssetBag {
        let mut out = self.clone();
        for (asset, quantity) in &other.0 {
            out.add(asset.clone(), quantity.clone());
        }
        out
    }

    /// Number of distinct asset classes held.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn enforce_bound(&self) -> Result<(), BountyError> {
        if self.size() > MAX_ASSETS {
            return Err(BountyError::TooManyAssets {
                count: self.size(),
                max: MAX_ASSETS,
            });
        }
        Ok(())
    }

    /// True when every class in `other` is held here in at least that quantity.
    pub fn covers(&self, other: &AssetBag) -> bool {
        other
            .0
            .iter()
            .all(|(asset, quantity)| self.0.get(asset).is_some_and(|held| held >= quantity))
    }

    /// `self - other`, or `None` if `other` is not covered.
    pub fn checked_sub(&self, other: &AssetBag) -> Option<AssetBag> {
        if !self.covers(other) {
            return None;
        }
        let mut out = AssetBag::new();
        for (asset, held) in &self.0 {
            out.add(asset.clone(), held - other.quantity_of(asset));
        }
        Some(out)
    }

    /// Splits the bag into `(payout, fee)`.
    ///
    /// Per asset class `fee = floor(quantity * fee_bps / 10_000)`; the
    /// remainder stays in `payout`, so `payout.merge(&fee) == *self` always
    /// holds and no quantity is ever negative or fractional.
    pub fn split_fee(&self, fee_bps: u64) -> Result<(AssetBag, AssetBag), BountyError> {
        if fee_bps > BASIS_POINTS {
            return Err(BountyError::InvalidFeeRate(fee_bps));
        }
        let mut payout = AssetBag::new();
        let mut fee = AssetBag::new();
        for (asset, quantity) in &self.0 {
            let cut = quantity * fee_bps / BASIS_POINTS;
            payout.add(asset.clone(), quantity - &cut);
            fee.add(asset.clone(), cut);
        }
        Ok((payout, fee))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetClass, &BigUint)> {
        self.0.iter()
    }
}

impl fmt::Display for AssetBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (asset, quantity)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{asset}: {quantity}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Serialize)]
struct EntryRef<'a> {
    asset: &'a AssetClass,
    #[serde(serialize_with = "decimal::serialize")]
    amount: &'a BigUint,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    asset: AssetClass,
    #[serde(deserialize_with = "decimal::deserialize")]
    amount: BigUint,
}

impl Serialize for AssetBag {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(
            self.0
                .iter()
                .map(|(asset, amount)| EntryRef { asset, amount }),
        )
    }
}

impl<'de> Deserialize<'de> for AssetBag {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let entries = Vec::<Entry>::deserialize(d)?;
        let mut map = BTreeMap::new();
        for Entry { asset, amount } in entries {
            if amount.is_zero() {
                return Err(D::Error::custom(format!("zero quantity for {asset}")));
            }
            if map.contains_key(&asset) {
                return Err(D::Error::custom(format!("duplicate asset {asset}")));
            }
            map.insert(asset, amount);
        }
        Ok(AssetBag(map))
    }
}

impl FromIterator<(AssetClass, BigUint)> for AssetBag {
    fn from_iter<I: IntoIterator<Item = (AssetClass, BigUint)>>(iter: I) -> Self {
        let mut bag = AssetBag::new();
        for (asset, quantity) in iter {
            bag.add(asset, quantity);
        }
        bag
    }
}

/// Free-function form of [`AssetBag::merge`].
pub fn merge(a: &AssetBag, b: &AssetBag) -> AssetBag {
    a.merge(b)
}

/// Free-function form of [`AssetBag::size`].
pub fn size(a: &AssetBag) -> usize {
    a.size()
}

/// Free-function form of [`AssetBag::enforce_bound`].
pub fn enforce_bound(a: &AssetBag) -> Result<(), BountyError> {
    a.enforce_bound()
}
