//! Ledger entities and the client seam used to read and write them.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::serde_util::opt_hex;
use super::tx::TxPlan;
use super::value::AssetBag;
use super::wallet::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(#[serde(with = "hex::serde")] pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for TxId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| format!("invalid hex tx id: {e}"))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "tx id must be 32 bytes".to_string())?;
        Ok(TxId(bytes))
    }
}

/// Reference to one output of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtxoRef {
    pub tx_id: TxId,
    pub index: u32,
}

impl UtxoRef {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for UtxoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

impl FromStr for UtxoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tx, index) = s
            .split_once('#')
            .ok_or_else(|| format!("expected <tx_id>#<index>, got {s:?}"))?;
        let index = index
            .parse::<u32>()
            .map_err(|e| format!("invalid output index: {e}"))?;
        Ok(UtxoRef::new(tx.parse()?, index))
    }
}

/// Hash identifying a validator script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptHash(#[serde(with = "hex::serde")] pub Vec<u8>);

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Where an output is locked: a wallet, or a validator script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Wallet(Wallet),
    Script(ScriptHash),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet(w) => write!(f, "wallet:{w}"),
            Self::Script(h) => write!(f, "script:{h}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: AssetBag,
    /// Codec bytes of the record attached inline to the output.
    #[serde(with = "opt_hex")]
    pub datum: Option<Vec<u8>>,
}

impl TxOutput {
    pub fn to_wallet(wallet: &Wallet, value: AssetBag) -> Self {
        Self {
            address: Address::Wallet(wallet.clone()),
            value,
            datum: None,
        }
    }

    pub fn to_script(script: &ScriptHash, value: AssetBag, datum: Vec<u8>) -> Self {
        Self {
            address: Address::Script(script.clone()),
            value,
            datum: Some(datum),
        }
    }
}

/// An unspent output as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub utxo_ref: UtxoRef,
    pub output: TxOutput,
    /// Validator published alongside the output, if any.
    #[serde(default)]
    pub script_ref: Option<ScriptHash>,
}

/// Read/write access to the ledger. Node connectivity, key custody and
/// signing live behind implementations of this trait.
pub trait LedgerClient: Send + Sync + 'static {
    /// Unspent output at `utxo_ref`, or `None` if it does not exist or was spent.
    fn fetch(
        &self,
        utxo_ref: &UtxoRef,
    ) -> impl Future<Output = Result<Option<Utxo>, LedgerError>> + Send;

    fn utxos_at(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<Vec<Utxo>, LedgerError>> + Send;

    /// Wallet currently selected for signing.
    fn current_wallet(&self) -> impl Future<Output = Result<Wallet, LedgerError>> + Send;

    /// Ledger time in POSIX milliseconds.
    fn current_time(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Signs with the selected wallet and submits.
    fn submit(&self, plan: &TxPlan) -> impl Future<Output = Result<TxId, LedgerError>> + Send;
}
