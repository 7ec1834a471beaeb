//! Spend validation as the ledger performs it.
//!
//! The transaction builder and this validator enforce the same rules: the
//! guards come from [`machine`](super::machine), while the output checks here
//! look only at the concrete transaction, never at how it was built.

use super::codec::Codec;
use super::datum::{BountyRecord, SettingsRecord};
use super::error::BountyError;
use super::ledger::{Address, ScriptHash, TxOutput};
use super::machine::{assignee, ensure_not_merged, ensure_unassigned, merge_split};
use super::redeemer::Redeemer;
use super::tx::TxPlan;
use super::value::AssetBag;
use super::wallet::Wallet;

/// What the validator sees of the transaction spending an escrow output.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub own_script: &'a ScriptHash,
    pub spent_value: &'a AssetBag,
    pub plan: &'a TxPlan,
    /// Settings from the reference input that carries `own_script`, if attached.
    pub settings: Option<&'a SettingsRecord>,
}

impl ScriptContext<'_> {
    fn signed_by(&self, wallet: &Wallet) -> bool {
        self.plan
            .required_signers
            .iter()
            .any(|s| s.same_signer(wallet))
    }

    fn require_signature(&self, wallet: &Wallet, role: &str) -> Result<(), BountyError> {
        if !self.signed_by(wallet) {
            return Err(BountyError::NotAuthorized(format!(
                "transaction must be signed by the {role}"
            )));
        }
        Ok(())
    }

    fn own_outputs(&self) -> impl Iterator<Item = &TxOutput> {
        self.plan
            .outputs
            .iter()
            .filter(|o| matches!(&o.address, Address::Script(h) if h == self.own_script))
    }

    /// Total value the transaction pays to `wallet`.
    fn paid_to(&self, wallet: &Wallet) -> AssetBag {
        self.plan
            .outputs
            .iter()
            .filter(|o| matches!(&o.address, Address::Wallet(w) if w == wallet))
            .fold(AssetBag::new(), |acc, o| acc.merge(&o.value))
    }

    /// The single output re-locked under this validator, decoded.
    fn continuing<C: Codec>(&self, codec: &C) -> Result<(BountyRecord, &AssetBag), BountyError> {
        let mut own = self.own_outputs();
        let (Some(output), None) = (own.next(), own.next()) else {
            return Err(BountyError::InvalidTransaction(
                "expected exactly one continuing escrow output".into(),
            ));
        };
        let bytes = output.datum.as_deref().ok_or_else(|| {
            BountyError::InvalidTransaction("continuing output carries no record".into())
        })?;
        Ok((codec.decode_record(bytes)?, &output.value))
    }

    fn require_no_continuing(&self) -> Result<(), BountyError> {
        if self.own_outputs().next().is_some() {
            return Err(BountyError::InvalidTransaction(
                "escrow must be fully consumed".into(),
            ));
        }
        Ok(())
    }

    fn require_paid(&self, wallet: &Wallet, value: &AssetBag, role: &str) -> Result<(), BountyError> {
        if !self.paid_to(wallet).covers(value) {
            return Err(BountyError::InvalidTransaction(format!(
                "{role} must receive {value}"
            )));
        }
        Ok(())
    }
}

/// Accepts or rejects spending an escrow output holding `record` with
/// `redeemer`. Guard order matches the builder's.
pub fn validate<C: Codec>(
    codec: &C,
    record: &BountyRecord,
    redeemer: &Redeemer,
    ctx: &ScriptContext<'_>,
) -> Result<(), BountyError> {
    let escrow_inputs = ctx.plan.inputs.iter().filter(|i| i.redeemer.is_some()).count();
    if escrow_inputs != 1 {
        return Err(BountyError::InvalidTransaction(format!(
            "expected one escrow input, found {escrow_inputs}"
        )));
    }

    match redeemer {
        Redeemer::AddRewards { rewards } => {
            ensure_not_merged(record)?;
            let valid_to = ctx.plan.validity.valid_to.ok_or_else(|| {
                BountyError::InvalidTransaction("reward top-up needs an upper validity bound".into())
            })?;
            if valid_to > record.deadline {
                return Err(BountyError::DeadlinePassed {
                    deadline: record.deadline,
                    now: valid_to,
                });
            }
            let expected = ctx.spent_value.merge(rewards);
            expected.enforce_bound()?;
            let (datum, value) = ctx.continuing(codec)?;
            if datum != *record {
                return Err(BountyError::InvalidTransaction(
                    "record must be carried over unchanged".into(),
                ));
            }
            if *value != expected {
                return Err(BountyError::InvalidTransaction(format!(
                    "continuing output must hold {expected}, holds {value}"
                )));
            }
        }

        Redeemer::Assign { contributor } => {
            ensure_not_merged(record)?;
            ensure_unassigned(record)?;
            ctx.require_signature(contributor, "contributor")?;
            let (datum, value) = ctx.continuing(codec)?;
            if datum != record.with_contributor(contributor.clone()) {
                return Err(BountyError::InvalidTransaction(
                    "only the contributor field may change".into(),
                ));
            }
            if value != ctx.spent_value {
                return Err(BountyError::InvalidTransaction(
                    "assign must not move value".into(),
                ));
            }
        }

        Redeemer::Merge => {
            ensure_not_merged(record)?;
            assignee(record)?;
            ctx.require_signature(&record.admin, "admin")?;
            let settings = ctx.settings.ok_or_else(|| {
                BountyError::SettingsNotFound("merge must reference the settings output".into())
            })?;
            let (share, fee) = merge_split(record, ctx.spent_value)?;
            if !fee.is_empty() {
                ctx.require_paid(&settings.githoney_address, &fee, "fee wallet")?;
            }
            if share.is_empty() {
                ctx.require_no_continuing()?;
            } else {
                let (datum, value) = ctx.continuing(codec)?;
                if datum != record.clone().into_merged() {
                    return Err(BountyError::InvalidTransaction(
                        "payout must carry the merged record".into(),
                    ));
                }
                if *value != share {
                    return Err(BountyError::InvalidTransaction(format!(
                        "contributor share must be {share}, is {value}"
                    )));
                }
            }
        }

        Redeemer::Close => {
            ensure_not_merged(record)?;
            ctx.require_signature(&record.admin, "admin")?;
            ctx.require_no_continuing()?;
            ctx.require_paid(&record.maintainer, ctx.spent_value, "maintainer")?;
        }

        Redeemer::Claim => {
            if !record.merged {
                return Err(BountyError::NotMerged);
            }
            let contributor = assignee(record)?;
            ctx.require_signature(contributor, "contributor")?;
            ctx.require_no_continuing()?;
            ctx.require_paid(contributor, ctx.spent_value, "contributor")?;
        }
    }

    Ok(())
}
