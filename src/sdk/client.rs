//! Transition entry points: load state from the ledger, run the state
//! machine, assemble the transaction plan.
//!
//! Nothing is cached between calls. Every transition re-reads the bounty and
//! the settings, so a caller that lost a race against another transaction
//! simply calls again with the new reference.

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::codec::{Codec, JsonCodec};
use super::datum::{BountyRecord, BountyState, SettingsRecord};
use super::error::BountyError;
use super::ledger::{Address, LedgerClient, ScriptHash, TxId, Utxo, UtxoRef};
use super::machine::{self, TransitionContext, TransitionOutcome};
use super::redeemer::Redeemer;
use super::tx::{
    EscrowSpend, TxPlan, add_rewards_validity, build_add_rewards_tx, build_assign_tx,
    build_claim_tx, build_close_tx, build_merge_tx,
};
use super::value::AssetBag;
use super::wallet::Wallet;
use crate::config::ClientConfig;

/// Settings as read from their reference output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedSettings {
    pub utxo_ref: UtxoRef,
    pub record: SettingsRecord,
    /// Escrow validator published with the settings.
    pub script: ScriptHash,
}

/// A bounty output and its decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedBounty {
    pub utxo: Utxo,
    pub record: BountyRecord,
}

impl LoadedBounty {
    /// Live balance of the escrow.
    pub fn value(&self) -> &AssetBag {
        &self.utxo.output.value
    }

    pub fn state(&self) -> BountyState {
        self.record.state()
    }
}

/// A transition's validated outcome together with its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTransition {
    pub outcome: TransitionOutcome,
    pub plan: TxPlan,
}

pub struct BountyClient<L, C = JsonCodec> {
    ledger: L,
    codec: C,
    settings_ref: UtxoRef,
    config: ClientConfig,
}

impl<L: LedgerClient> BountyClient<L> {
    pub fn new(ledger: L, settings_ref: UtxoRef, config: ClientConfig) -> Self {
        Self::with_codec(ledger, JsonCodec, settings_ref, config)
    }
}

impl<L: LedgerClient, C: Codec> BountyClient<L, C> {
    pub fn with_codec(ledger: L, codec: C, settings_ref: UtxoRef, config: ClientConfig) -> Self {
        Self {
            ledger,
            codec,
            settings_ref,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// One bounded fetch. A fetch that does not resolve in time is reported
    /// as a missing output.
    async fn fetch(&self, utxo_ref: &UtxoRef) -> Result<Option<Utxo>, BountyError> {
        match timeout(self.config.fetch_timeout, self.ledger.fetch(utxo_ref)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(%utxo_ref, timeout = ?self.config.fetch_timeout, "fetch timed out");
                Ok(None)
            }
        }
    }

    async fn read_settings(&self) -> Result<LoadedSettings, BountyError> {
        let settings_ref = self.settings_ref;
        let utxo = self.fetch(&settings_ref).await?.ok_or_else(|| {
            BountyError::SettingsNotFound(format!("no output at {settings_ref}"))
        })?;
        let bytes = utxo.output.datum.as_deref().ok_or_else(|| {
            BountyError::SettingsNotFound(format!("output {settings_ref} carries no record"))
        })?;
        let record = self
            .codec
            .decode_settings(bytes)
            .map_err(|e| BountyError::SettingsNotFound(e.to_string()))?;
        let script = utxo.script_ref.ok_or(BountyError::ValidatorNotFound)?;
        Ok(LoadedSettings {
            utxo_ref: settings_ref,
            record,
            script,
        })
    }

    pub async fn load_settings(&self) -> Result<LoadedSettings, BountyError> {
        self.read_settings().await.inspect_err(|e| {
            error!(settings = %self.settings_ref, error = %e, "failed to load settings");
        })
    }

    /// Loads settings and the bounty at `bounty_ref`. The output must sit at
    /// the escrow address published with the settings.
    pub async fn load(
        &self,
        bounty_ref: &UtxoRef,
    ) -> Result<(LoadedSettings, LoadedBounty), BountyError> {
        let utxo = self
            .fetch(bounty_ref)
            .await?
            .ok_or(BountyError::NotFound(*bounty_ref))?;
        let settings = self.load_settings().await?;
        if utxo.output.address != Address::Script(settings.script.clone()) {
            warn!(bounty = %bounty_ref, address = %utxo.output.address, "output is not an escrow");
            return Err(BountyError::NotFound(*bounty_ref));
        }
        let bytes = utxo
            .output
            .datum
            .as_deref()
            .ok_or_else(|| BountyError::Decode(format!("output {bounty_ref} carries no record")))?;
        let record = self.codec.decode_record(bytes).inspect_err(|e| {
            error!(bounty = %bounty_ref, error = %e, "undecodable bounty record");
        })?;
        Ok((settings, LoadedBounty { utxo, record }))
    }

    pub async fn bounty(&self, bounty_ref: &UtxoRef) -> Result<LoadedBounty, BountyError> {
        Ok(self.load(bounty_ref).await?.1)
    }

    async fn plan(
        &self,
        bounty_ref: &UtxoRef,
        redeemer: Redeemer,
        caller: Option<&Wallet>,
    ) -> Result<PlannedTransition, BountyError> {
        let action = redeemer.name();
        info!(bounty = %bounty_ref, action, "START transition");

        let (settings, bounty) = self.load(bounty_ref).await?;
        let now = self.ledger.current_time().await?;
        let caller = match caller {
            Some(wallet) => wallet.clone(),
            None => bounty.record.admin.clone(),
        };
        let ctx = TransitionContext {
            now,
            caller: &caller,
            settings: &settings.record,
        };
        let outcome = machine::apply(&bounty.record, bounty.value(), &redeemer, ctx)?;

        let spend = EscrowSpend {
            utxo: &bounty.utxo,
            script: &settings.script,
            settings_ref: settings.utxo_ref,
        };
        let plan = match &outcome.redeemer {
            Redeemer::AddRewards { .. } => {
                let funding = self
                    .ledger
                    .utxos_at(&Address::Wallet(outcome.signer.clone()))
                    .await?;
                let validity = add_rewards_validity(
                    now,
                    bounty.record.deadline,
                    self.config.validity_window_ms,
                );
                build_add_rewards_tx(&self.codec, spend, &outcome, &funding, validity)?
            }
            Redeemer::Assign { .. } => build_assign_tx(&self.codec, spend, &outcome)?,
            Redeemer::Merge => build_merge_tx(&self.codec, spend, &outcome)?,
            Redeemer::Close => build_close_tx(&self.codec, spend, &outcome)?,
            Redeemer::Claim => build_claim_tx(&self.codec, spend, &outcome)?,
        };

        debug!(bounty = %bounty_ref, action, ?plan, "plan assembled");
        info!(bounty = %bounty_ref, action, "END transition");
        Ok(PlannedTransition { outcome, plan })
    }

    async fn logged(
        &self,
        bounty_ref: &UtxoRef,
        redeemer: Redeemer,
        caller: Option<&Wallet>,
    ) -> Result<PlannedTransition, BountyError> {
        let action = redeemer.name();
        self.plan(bounty_ref, redeemer, caller)
            .await
            .inspect_err(|e| warn!(bounty = %bounty_ref, action, kind = e.kind(), error = %e, "transition rejected"))
    }

    /// Tops up the bounty with `rewards` taken from `funder`'s wallet.
    pub async fn add_rewards(
        &self,
        bounty_ref: &UtxoRef,
        funder: &Wallet,
        rewards: &AssetBag,
    ) -> Result<PlannedTransition, BountyError> {
        let redeemer = Redeemer::AddRewards {
            rewards: rewards.clone(),
        };
        self.logged(bounty_ref, redeemer, Some(funder)).await
    }

    pub async fn assign(
        &self,
        bounty_ref: &UtxoRef,
        contributor: &Wallet,
    ) -> Result<PlannedTransition, BountyError> {
        let redeemer = Redeemer::Assign {
            contributor: contributor.clone(),
        };
        self.logged(bounty_ref, redeemer, Some(contributor)).await
    }

    pub async fn merge(&self, bounty_ref: &UtxoRef) -> Result<PlannedTransition, BountyError> {
        self.logged(bounty_ref, Redeemer::Merge, None).await
    }

    pub async fn close(&self, bounty_ref: &UtxoRef) -> Result<PlannedTransition, BountyError> {
        self.logged(bounty_ref, Redeemer::Close, None).await
    }

    /// Claims a merged payout on behalf of the ledger's selected wallet.
    pub async fn claim(&self, bounty_ref: &UtxoRef) -> Result<PlannedTransition, BountyError> {
        let caller = self.ledger.current_wallet().await?;
        self.claim_for(bounty_ref, &caller).await
    }

    pub async fn claim_for(
        &self,
        bounty_ref: &UtxoRef,
        caller: &Wallet,
    ) -> Result<PlannedTransition, BountyError> {
        self.logged(bounty_ref, Redeemer::Claim, Some(caller)).await
    }

    pub async fn submit(&self, plan: &TxPlan) -> Result<TxId, BountyError> {
        let tx_id = self.ledger.submit(plan).await.inspect_err(|e| {
            warn!(error = %e, "submit rejected");
        })?;
        info!(%tx_id, "transaction accepted");
        Ok(tx_id)
    }
}
