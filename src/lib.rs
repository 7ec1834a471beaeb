pub mod api;
pub mod config;
pub mod sdk;

use rand::{Rng, thread_rng};
use sdk::{ScriptHash, Wallet};

/// Payment credentials are 28-byte key hashes.
pub const KEY_HASH_LEN: usize = 28;

/// Generate a wallet with a random payment credential and no stake part.
pub fn generate_wallet() -> Wallet {
    let mut key = [0u8; KEY_HASH_LEN];
    thread_rng().fill(&mut key[..]);
    Wallet::enterprise(key)
}

/// Generate a wallet with both a payment and a staking credential.
pub fn generate_staked_wallet() -> Wallet {
    let mut rng = thread_rng();
    let mut payment = [0u8; KEY_HASH_LEN];
    let mut stake = [0u8; KEY_HASH_LEN];
    rng.fill(&mut payment[..]);
    rng.fill(&mut stake[..]);
    Wallet::new(payment, Some(stake.to_vec()))
}

/// Random validator hash, for ledgers seeded without a real script.
pub fn generate_script_hash() -> ScriptHash {
    let mut hash = vec![0u8; KEY_HASH_LEN];
    thread_rng().fill(&mut hash[..]);
    ScriptHash(hash)
}

pub fn print_header(title: &str) {
    println!("\n=== {} ===\n", title);
}

pub fn print_step(num: usize, description: &str) {
    println!("Step {}: {}", num, description);
}

pub fn print_result<T, E: std::fmt::Display>(label: &str, result: &Result<T, E>) {
    match result {
        Ok(_) => println!("  [{}] PASS", label),
        Err(e) => println!("  [{}] FAIL as expected: {}", label, e),
    }
}
