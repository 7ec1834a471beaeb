pub mod client;
pub mod codec;
pub mod datum;
pub mod emulator;
pub mod error;
pub mod ledger;
pub mod machine;
pub mod redeemer;
mod serde_util;
pub mod tx;
pub mod validator;
pub mod value;
pub mod wallet;

pub use client::{BountyClient, LoadedBounty, LoadedSettings, PlannedTransition};
pub use codec::{Codec, JsonCodec};
pub use datum::{BountyRecord, BountyState, SettingsRecord};
pub use emulator::{Genesis, GenesisRefs, InMemoryLedger};
pub use error::{BountyError, LedgerError};
pub use ledger::{Address, LedgerClient, ScriptHash, TxId, TxOutput, Utxo, UtxoRef};
pub use machine::{Payout, TransitionOutcome};
pub use redeemer::Redeemer;
pub use tx::{TxInput, TxPlan, ValidityInterval};
pub use value::{AssetBag, AssetClass, MAX_ASSETS};
pub use wallet::Wallet;
