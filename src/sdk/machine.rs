//! Escrow lifecycle transitions.
//!
//! Every function here is pure: it checks preconditions against a record and
//! the live value of its escrow output, then describes the next record and
//! where value moves. Checks run in a fixed order and stop at the first
//! violation; the terminal `merged` guard always runs before anything else.

use serde::Serialize;

use super::datum::{BountyRecord, SettingsRecord};
use super::error::BountyError;
use super::redeemer::Redeemer;
use super::value::AssetBag;
use super::wallet::Wallet;

/// Value leaving the escrow for a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub to: Wallet,
    pub value: AssetBag,
}

/// Result of a validated transition: the next record and the value plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub redeemer: Redeemer,
    /// Record after the transition. Terminal for merge, close and claim.
    pub record: BountyRecord,
    /// Value re-locked under the validator with `record` attached. `None`
    /// when the escrow entity is fully consumed.
    pub continuing: Option<AssetBag>,
    pub payouts: Vec<Payout>,
    /// Wallet whose signature authorizes the spend.
    pub signer: Wallet,
}

/// Inputs a transition may read besides the record and its value.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// POSIX milliseconds.
    pub now: u64,
    /// Wallet requesting the transition.
    pub caller: &'a Wallet,
    pub settings: &'a SettingsRecord,
}

pub fn ensure_not_merged(record: &BountyRecord) -> Result<(), BountyError> {
    if record.merged {
        return Err(BountyError::AlreadyMerged);
    }
    Ok(())
}

pub fn ensure_before_deadline(record: &BountyRecord, now: u64) -> Result<(), BountyError> {
    if now >= record.deadline {
        return Err(BountyError::DeadlinePassed {
            deadline: record.deadline,
            now,
        });
    }
    Ok(())
}

pub fn ensure_unassigned(record: &BountyRecord) -> Result<(), BountyError> {
    if record.contributor.is_some() {
        return Err(BountyError::ContributorAlreadyAssigned);
    }
    Ok(())
}

pub fn assignee(record: &BountyRecord) -> Result<&Wallet, BountyError> {
    record
        .contributor
        .as_ref()
        .ok_or(BountyError::NoContributorAssigned)
}

/// Fee and contributor share of a merge, `(contributor, fee)`.
pub fn merge_split(
    record: &BountyRecord,
    live: &AssetBag,
) -> Result<(AssetBag, AssetBag), BountyError> {
    live.split_fee(record.bounty_reward_fee)
}

/// Tops up the escrow. Anyone may fund a bounty that is not merged and not
/// past its deadline; the record itself is carried over untouched.
pub fn add_rewards(
    record: &BountyRecord,
    live: &AssetBag,
    funder: &Wallet,
    rewards: &AssetBag,
    now: u64,
) -> Result<TransitionOutcome, BountyError> {
    ensure_not_merged(record)?;
    ensure_before_deadline(record, now)?;
    let merged = live.merge(rewards);
    merged.enforce_bound()?;

    Ok(TransitionOutcome {
        redeemer: Redeemer::AddRewards {
            rewards: rewards.clone(),
        },
        record: record.clone(),
        continuing: Some(merged),
        payouts: vec![],
        signer: funder.clone(),
    })
}

pub fn assign(
    record: &BountyRecord,
    live: &AssetBag,
    contributor: &Wallet,
) -> Result<TransitionOutcome, BountyError> {
    ensure_not_merged(record)?;
    ensure_unassigned(record)?;

    Ok(TransitionOutcome {
        redeemer: Redeemer::Assign {
            contributor: contributor.clone(),
        },
        record: record.with_contributor(contributor.clone()),
        continuing: Some(live.clone()),
        payouts: vec![],
        signer: contributor.clone(),
    })
}

/// Pays the reward fee to the settings' fee wallet and locks the rest as a
/// claimable payout carrying the merged record. When the fee takes every
/// unit there is nothing left to claim and no payout output is produced.
pub fn merge(
    record: &BountyRecord,
    live: &AssetBag,
    settings: &SettingsRecord,
) -> Result<TransitionOutcome, BountyError> {
    ensure_not_merged(record)?;
    assignee(record)?;
    let (share, fee) = merge_split(record, live)?;

    let mut payouts = Vec::new();
    if !fee.is_empty() {
        payouts.push(Payout {
            to: settings.githoney_address.clone(),
            value: fee,
        });
    }

    Ok(TransitionOutcome {
        redeemer: Redeemer::Merge,
        record: record.clone().into_merged(),
        continuing: (!share.is_empty()).then_some(share),
        payouts,
        signer: record.admin.clone(),
    })
}

/// Cancels the bounty, with or without an assignee.
pub fn close(record: &BountyRecord, live: &AssetBag) -> Result<TransitionOutcome, BountyError> {
    ensure_not_merged(record)?;

    Ok(TransitionOutcome {
        redeemer: Redeemer::Close,
        record: record.clone(),
        continuing: None,
        payouts: vec![Payout {
            to: record.maintainer.clone(),
            value: live.clone(),
        }],
        signer: record.admin.clone(),
    })
}

/// Releases a merged payout. Only valid on merged records, and only for the
/// contributor on record.
pub fn claim(
    record: &BountyRecord,
    live: &AssetBag,
    caller: &Wallet,
) -> Result<TransitionOutcome, BountyError> {
    if !record.merged {
        return Err(BountyError::NotMerged);
    }
    let contributor = assignee(record)?;
    if !contributor.same_signer(caller) {
        return Err(BountyError::NotAuthorized(format!(
            "only the contributor {contributor} may claim"
        )));
    }

    Ok(TransitionOutcome {
        redeemer: Redeemer::Claim,
        record: record.clone(),
        continuing: None,
        payouts: vec![Payout {
            to: contributor.clone(),
            value: live.clone(),
        }],
        signer: contributor.clone(),
    })
}

/// Runs the transition named by `redeemer`.
pub fn apply(
    record: &BountyRecord,
    live: &AssetBag,
    redeemer: &Redeemer,
    ctx: TransitionContext<'_>,
) -> Result<TransitionOutcome, BountyError> {
    match redeemer {
        Redeemer::AddRewards { rewards } => add_rewards(record, live, ctx.caller, rewards, ctx.now),
        Redeemer::Assign { contributor } => assign(record, live, contributor),
        Redeemer::Merge => merge(record, live, ctx.settings),
        Redeemer::Close => close(record, live),
        Redeemer::Claim => claim(record, live, ctx.caller),
    }
}
