//! Githoney bounty escrow
//!
//! Multi-asset bounties locked under an escrow validator: rewards can be
//! topped up until the deadline, a contributor is assigned once, and a merge
//! pays the reward fee and releases the rest to the contributor.
//!
//! ## Running
//! ```bash
//! cargo run --example bounty_lifecycle
//! cargo run --bin api
//! ```

fn main() {
    println!("Githoney bounty escrow");
    println!("======================");
    println!();
    println!("Walk through a full bounty on the in-memory ledger:");
    println!("  cargo run --example bounty_lifecycle");
    println!();
    println!("Serve transaction plans over HTTP:");
    println!("  cargo run --bin api");
}
