use thiserror::Error;

use super::ledger::UtxoRef;
use super::wallet::Wallet;

/// Every way a bounty transition, load or validation can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BountyError {
    #[error("bounty {0} not found")]
    NotFound(UtxoRef),
    #[error("Bounty already merged")]
    AlreadyMerged,
    #[error("Bounty already has a contributor")]
    ContributorAlreadyAssigned,
    #[error("Bounty has no contributor assigned")]
    NoContributorAssigned,
    #[error("Bounty is not merged yet")]
    NotMerged,
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("Bounty deadline passed (deadline {deadline}, now {now})")]
    DeadlinePassed { deadline: u64, now: u64 },
    #[error("Too many assets, max {max} (got {count})")]
    TooManyAssets { count: usize, max: usize },
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: String, available: String },
    #[error("invalid reward fee: {0} basis points exceeds 10000")]
    InvalidFeeRate(u64),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("settings not found: {0}")]
    SettingsNotFound(String),
    #[error("Githoney validator not found")]
    ValidatorNotFound,
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl BountyError {
    /// Stable tag for callers that branch on the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyMerged => "already_merged",
            Self::ContributorAlreadyAssigned => "contributor_already_assigned",
            Self::NoContributorAssigned => "no_contributor_assigned",
            Self::NotMerged => "not_merged",
            Self::NotAuthorized(_) => "not_authorized",
            Self::DeadlinePassed { .. } => "deadline_passed",
            Self::TooManyAssets { .. } => "too_many_assets",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidFeeRate(_) => "invalid_fee_rate",
            Self::InvalidTransaction(_) => "invalid_transaction",
            Self::Decode(_) => "decode_error",
            Self::Encode(_) => "encode_error",
            Self::SettingsNotFound(_) => "settings_not_found",
            Self::ValidatorNotFound => "validator_not_found",
            Self::Ledger(_) => "ledger_error",
        }
    }

    /// True for failures caused by a stale view of the ledger. Rebuilding the
    /// transition from freshly fetched state may succeed.
    pub fn is_stale_state(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Ledger(LedgerError::AlreadySpent(_) | LedgerError::NotFound(_))
        )
    }
}

/// Failures reported by a ledger client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("utxo {0} does not exist")]
    NotFound(UtxoRef),
    #[error("utxo {0} already spent")]
    AlreadySpent(UtxoRef),
    #[error("missing signature from {0}")]
    MissingSignature(Wallet),
    #[error("transaction outside its validity interval at {now}")]
    OutsideValidity { now: u64 },
    #[error("inputs and outputs carry different value")]
    ValueNotPreserved,
    #[error("script rejected input {input}: {reason}")]
    ScriptFailure {
        input: UtxoRef,
        reason: Box<BountyError>,
    },
    #[error("no wallet selected")]
    NoWallet,
}
