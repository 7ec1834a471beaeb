use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::codec::Codec;
use super::error::BountyError;
use super::ledger::{ScriptHash, TxOutput, Utxo, UtxoRef};
use super::machine::TransitionOutcome;
use super::redeemer::Redeemer;
use super::value::AssetBag;
use super::wallet::Wallet;

/// An input to consume. Script-locked inputs carry the redeemer that
/// unlocks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub utxo_ref: UtxoRef,
    #[serde(default)]
    pub redeemer: Option<Redeemer>,
}

/// Time bounds in POSIX milliseconds. `valid_to` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityInterval {
    pub valid_from: Option<u64>,
    pub valid_to: Option<u64>,
}

impl ValidityInterval {
    pub fn contains(&self, now: u64) -> bool {
        self.valid_from.is_none_or(|from| now >= from) && self.valid_to.is_none_or(|to| now < to)
    }
}

/// A fully described transaction, ready for a signing layer to finalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPlan {
    pub inputs: Vec<TxInput>,
    /// Outputs read but not consumed.
    pub reference_inputs: Vec<UtxoRef>,
    pub outputs: Vec<TxOutput>,
    pub validity: ValidityInterval,
    pub required_signers: Vec<Wallet>,
}

impl TxPlan {
    /// The script input and its redeemer, if the plan spends one.
    pub fn escrow_input(&self) -> Option<(&UtxoRef, &Redeemer)> {
        self.inputs
            .iter()
            .find_map(|i| i.redeemer.as_ref().map(|r| (&i.utxo_ref, r)))
    }
}

/// The escrow output being spent and where its successor is locked.
#[derive(Debug, Clone, Copy)]
pub struct EscrowSpend<'a> {
    pub utxo: &'a Utxo,
    pub script: &'a ScriptHash,
    pub settings_ref: UtxoRef,
}

/// Validity window for a reward top-up: opens now and closes after
/// `window_ms` or at the deadline, whichever comes first.
pub fn add_rewards_validity(now: u64, deadline: u64, window_ms: u64) -> ValidityInterval {
    ValidityInterval {
        valid_from: Some(now),
        valid_to: Some(now.saturating_add(window_ms).min(deadline)),
    }
}

/// Picks wallet outputs until they cover `needed`. Returns the chosen
/// references and the change left over.
pub fn select_funding(
    utxos: &[Utxo],
    needed: &AssetBag,
) -> Result<(Vec<UtxoRef>, AssetBag), BountyError> {
    let mut selected = Vec::new();
    let mut gathered = AssetBag::new();
    let mut available = AssetBag::new();

    for utxo in utxos.iter().filter(|u| u.output.datum.is_none()) {
        available = available.merge(&utxo.output.value);
        if gathered.covers(needed) {
            continue;
        }
        let useful = needed.iter().any(|(asset, quantity)| {
            gathered.quantity_of(asset) < *quantity
                && !utxo.output.value.quantity_of(asset).is_zero()
        });
        if useful {
            gathered = gathered.merge(&utxo.output.value);
            selected.push(utxo.utxo_ref);
        }
    }

    match gathered.checked_sub(needed) {
        Some(change) => Ok((selected, change)),
        None => Err(BountyError::InsufficientFunds {
            needed: needed.to_string(),
            available: available.to_string(),
        }),
    }
}

fn spend_escrow<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
) -> Result<TxPlan, BountyError> {
    let mut outputs = Vec::with_capacity(1 + outcome.payouts.len());
    if let Some(value) = &outcome.continuing {
        let datum = codec.encode_record(&outcome.record)?;
        outputs.push(TxOutput::to_script(spend.script, value.clone(), datum));
    }
    outputs.extend(
        outcome
            .payouts
            .iter()
            .map(|p| TxOutput::to_wallet(&p.to, p.value.clone())),
    );

    Ok(TxPlan {
        inputs: vec![TxInput {
            utxo_ref: spend.utxo.utxo_ref,
            redeemer: Some(outcome.redeemer.clone()),
        }],
        reference_inputs: vec![spend.settings_ref],
        outputs,
        validity: ValidityInterval::default(),
        required_signers: vec![outcome.signer.clone()],
    })
}

fn expect_redeemer(outcome: &TransitionOutcome, name: &str) -> Result<(), BountyError> {
    if outcome.redeemer.name() != name {
        return Err(BountyError::InvalidTransaction(format!(
            "expected a {name} outcome, got {}",
            outcome.redeemer.name()
        )));
    }
    Ok(())
}

/// Build an add-rewards transaction: escrow + funder inputs -> escrow with
/// the merged bag and the unchanged record, plus change back to the funder.
pub fn build_add_rewards_tx<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
    funding: &[Utxo],
    validity: ValidityInterval,
) -> Result<TxPlan, BountyError> {
    let Redeemer::AddRewards { rewards } = &outcome.redeemer else {
        return Err(BountyError::InvalidTransaction(format!(
            "expected an add_rewards outcome, got {}",
            outcome.redeemer.name()
        )));
    };
    let funder = &outcome.signer;
    let (selected, change) = select_funding(funding, rewards)?;

    let mut plan = spend_escrow(codec, spend, outcome)?;
    plan.inputs.extend(selected.into_iter().map(|utxo_ref| TxInput {
        utxo_ref,
        redeemer: None,
    }));
    if !change.is_empty() {
        plan.outputs.push(TxOutput::to_wallet(funder, change));
    }
    plan.validity = validity;
    Ok(plan)
}

/// Build an assign transaction: escrow -> escrow with the contributor set.
pub fn build_assign_tx<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
) -> Result<TxPlan, BountyError> {
    expect_redeemer(outcome, "assign")?;
    spend_escrow(codec, spend, outcome)
}

/// Build a merge transaction. Output 0 is the claimable contributor share
/// (when non-empty), followed by the fee payout.
pub fn build_merge_tx<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
) -> Result<TxPlan, BountyError> {
    expect_redeemer(outcome, "merge")?;
    spend_escrow(codec, spend, outcome)
}

/// Build a close transaction: escrow -> maintainer.
pub fn build_close_tx<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
) -> Result<TxPlan, BountyError> {
    expect_redeemer(outcome, "close")?;
    spend_escrow(codec, spend, outcome)
}

/// Build a claim transaction: merged payout -> contributor.
pub fn build_claim_tx<C: Codec>(
    codec: &C,
    spend: EscrowSpend<'_>,
    outcome: &TransitionOutcome,
) -> Result<TxPlan, BountyError> {
    expect_redeemer(outcome, "claim")?;
    spend_escrow(codec, spend, outcome)
}
