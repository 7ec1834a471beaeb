//! In-memory ledger for tests, demos and the API binary.
//!
//! Applies the same acceptance rules a node would for the transactions this
//! crate builds: inputs must be unspent, signatures present, the validity
//! interval open, value preserved, and every script-locked input accepted by
//! the escrow validator.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::codec::{Codec, JsonCodec};
use super::datum::{BountyRecord, SettingsRecord};
use super::error::{BountyError, LedgerError};
use super::ledger::{Address, LedgerClient, ScriptHash, TxId, TxOutput, Utxo, UtxoRef};
use super::tx::TxPlan;
use super::validator::{ScriptContext, validate};
use super::value::AssetBag;
use super::wallet::Wallet;

#[derive(Debug, Default)]
struct LedgerState {
    utxos: BTreeMap<UtxoRef, Utxo>,
    spent: HashSet<UtxoRef>,
    now: u64,
    wallet: Option<Wallet>,
}

pub struct InMemoryLedger<C = JsonCodec> {
    state: Mutex<LedgerState>,
    codec: C,
}

impl InMemoryLedger {
    pub fn new(now: u64) -> Self {
        Self::with_codec(JsonCodec, now)
    }
}

fn fresh_tx_id() -> TxId {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    TxId(bytes)
}

impl<C: Codec> InMemoryLedger<C> {
    pub fn with_codec(codec: C, now: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                now,
                ..LedgerState::default()
            }),
            codec,
        }
    }

    pub async fn set_time(&self, now: u64) {
        self.state.lock().await.now = now;
    }

    pub async fn advance(&self, ms: u64) {
        let mut st = self.state.lock().await;
        st.now = st.now.saturating_add(ms);
    }

    /// Selects the wallet that signs subsequent submissions.
    pub async fn select_wallet(&self, wallet: &Wallet) {
        self.state.lock().await.wallet = Some(wallet.clone());
    }

    /// Places an output on the ledger outside of any transaction.
    pub async fn seed(&self, output: TxOutput, script_ref: Option<ScriptHash>) -> UtxoRef {
        let utxo_ref = UtxoRef::new(fresh_tx_id(), 0);
        let utxo = Utxo {
            utxo_ref,
            output,
            script_ref,
        };
        self.state.lock().await.utxos.insert(utxo_ref, utxo);
        utxo_ref
    }

    pub async fn fund_wallet(&self, wallet: &Wallet, value: AssetBag) -> UtxoRef {
        self.seed(TxOutput::to_wallet(wallet, value), None).await
    }

    /// Publishes the settings record together with the escrow validator.
    pub async fn deploy_settings(
        &self,
        settings: &SettingsRecord,
        validator: &ScriptHash,
    ) -> Result<UtxoRef, BountyError> {
        let output = TxOutput {
            address: Address::Wallet(settings.githoney_address.clone()),
            value: AssetBag::new(),
            datum: Some(self.codec.encode_settings(settings)?),
        };
        Ok(self.seed(output, Some(validator.clone())).await)
    }

    /// Locks `value` under `validator` with `record` attached, as the
    /// creation transaction would.
    pub async fn lock_bounty(
        &self,
        validator: &ScriptHash,
        record: &BountyRecord,
        value: AssetBag,
    ) -> Result<UtxoRef, BountyError> {
        let datum = self.codec.encode_record(record)?;
        Ok(self
            .seed(TxOutput::to_script(validator, value, datum), None)
            .await)
    }

    pub async fn is_spent(&self, utxo_ref: &UtxoRef) -> bool {
        self.state.lock().await.spent.contains(utxo_ref)
    }

    /// Sum of everything unspent at `address`.
    pub async fn balance_of(&self, address: &Address) -> AssetBag {
        self.state
            .lock()
            .await
            .utxos
            .values()
            .filter(|u| u.output.address == *address)
            .fold(AssetBag::new(), |acc, u| acc.merge(&u.output.value))
    }

    pub async fn from_genesis(genesis: &Genesis) -> Result<(Self, GenesisRefs), BountyError>
    where
        C: Default,
    {
        let ledger = Self::with_codec(C::default(), genesis.now);
        let settings = ledger
            .deploy_settings(&genesis.settings, &genesis.validator)
            .await?;
        for funds in &genesis.wallets {
            ledger.fund_wallet(&funds.wallet, funds.value.clone()).await;
        }
        let mut bounties = Vec::with_capacity(genesis.bounties.len());
        for bounty in &genesis.bounties {
            bounties.push(
                ledger
                    .lock_bounty(&genesis.validator, &bounty.record, bounty.value.clone())
                    .await?,
            );
        }
        Ok((ledger, GenesisRefs { settings, bounties }))
    }

    fn run_scripts(
        &self,
        plan: &TxPlan,
        consumed: &[Utxo],
        references: &[Utxo],
    ) -> Result<(), LedgerError> {
        for (input, utxo) in plan.inputs.iter().zip(consumed) {
            let Address::Script(script) = &utxo.output.address else {
                continue;
            };
            // Only the reference output carrying this validator is the registry.
            let settings = references
                .iter()
                .filter(|r| r.script_ref.as_ref() == Some(script))
                .filter_map(|r| r.output.datum.as_deref())
                .find_map(|bytes| self.codec.decode_settings(bytes).ok());
            let fail = |reason: BountyError| LedgerError::ScriptFailure {
                input: utxo.utxo_ref,
                reason: Box::new(reason),
            };
            let redeemer = input.redeemer.as_ref().ok_or_else(|| {
                fail(BountyError::InvalidTransaction("missing redeemer".into()))
            })?;
            let bytes = utxo
                .output
                .datum
                .as_deref()
                .ok_or_else(|| fail(BountyError::Decode("script output has no record".into())))?;
            let record = self.codec.decode_record(bytes).map_err(fail)?;
            let ctx = ScriptContext {
                own_script: script,
                spent_value: &utxo.output.value,
                plan,
                settings: settings.as_ref(),
            };
            validate(&self.codec, &record, redeemer, &ctx).map_err(fail)?;
            debug!(input = %utxo.utxo_ref, action = redeemer.name(), "script accepted");
        }
        Ok(())
    }
}

impl<C: Codec> LedgerClient for InMemoryLedger<C> {
    async fn fetch(&self, utxo_ref: &UtxoRef) -> Result<Option<Utxo>, LedgerError> {
        Ok(self.state.lock().await.utxos.get(utxo_ref).cloned())
    }

    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .utxos
            .values()
            .filter(|u| u.output.address == *address)
            .cloned()
            .collect())
    }

    async fn current_wallet(&self) -> Result<Wallet, LedgerError> {
        self.state.lock().await.wallet.clone().ok_or(LedgerError::NoWallet)
    }

    async fn current_time(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.now)
    }

    async fn submit(&self, plan: &TxPlan) -> Result<TxId, LedgerError> {
        let mut st = self.state.lock().await;

        if !plan.validity.contains(st.now) {
            return Err(LedgerError::OutsideValidity { now: st.now });
        }

        let signer = st.wallet.clone().ok_or(LedgerError::NoWallet)?;
        if let Some(missing) = plan
            .required_signers
            .iter()
            .find(|w| !w.same_signer(&signer))
        {
            return Err(LedgerError::MissingSignature(missing.clone()));
        }

        let mut seen = HashSet::new();
        let mut consumed = Vec::with_capacity(plan.inputs.len());
        for input in &plan.inputs {
            let utxo_ref = input.utxo_ref;
            if st.spent.contains(&utxo_ref) || !seen.insert(utxo_ref) {
                return Err(LedgerError::AlreadySpent(utxo_ref));
            }
            let utxo = st
                .utxos
                .get(&utxo_ref)
                .ok_or(LedgerError::NotFound(utxo_ref))?;
            if let Address::Wallet(owner) = &utxo.output.address
                && !owner.same_signer(&signer)
            {
                return Err(LedgerError::MissingSignature(owner.clone()));
            }
            consumed.push(utxo.clone());
        }
        for utxo_ref in &plan.reference_inputs {
            if !st.utxos.contains_key(utxo_ref) {
                return Err(if st.spent.contains(utxo_ref) {
                    LedgerError::AlreadySpent(*utxo_ref)
                } else {
                    LedgerError::NotFound(*utxo_ref)
                });
            }
        }

        let spent_value = consumed
            .iter()
            .fold(AssetBag::new(), |acc, u| acc.merge(&u.output.value));
        let produced_value = plan
            .outputs
            .iter()
            .fold(AssetBag::new(), |acc, o| acc.merge(&o.value));
        if spent_value != produced_value {
            return Err(LedgerError::ValueNotPreserved);
        }

        let references: Vec<Utxo> = plan
            .reference_inputs
            .iter()
            .filter_map(|r| st.utxos.get(r).cloned())
            .collect();
        self.run_scripts(plan, &consumed, &references)?;

        let tx_id = fresh_tx_id();
        for utxo in &consumed {
            st.utxos.remove(&utxo.utxo_ref);
            st.spent.insert(utxo.utxo_ref);
        }
        for (index, output) in plan.outputs.iter().enumerate() {
            let utxo_ref = UtxoRef::new(tx_id, index as u32);
            st.utxos.insert(
                utxo_ref,
                Utxo {
                    utxo_ref,
                    output: output.clone(),
                    script_ref: None,
                },
            );
        }
        info!(
            %tx_id,
            inputs = plan.inputs.len(),
            outputs = plan.outputs.len(),
            "transaction applied"
        );
        Ok(tx_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisFunds {
    pub wallet: Wallet,
    pub value: AssetBag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisBounty {
    pub record: BountyRecord,
    pub value: AssetBag,
}

/// Initial ledger contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    pub now: u64,
    pub settings: SettingsRecord,
    /// Escrow validator published with the settings.
    pub validator: ScriptHash,
    #[serde(default)]
    pub wallets: Vec<GenesisFunds>,
    #[serde(default)]
    pub bounties: Vec<GenesisBounty>,
}

/// Where genesis placed the settings and each bounty, in order.
#[derive(Debug, Clone)]
pub struct GenesisRefs {
    pub settings: UtxoRef,
    pub bounties: Vec<UtxoRef>,
}
