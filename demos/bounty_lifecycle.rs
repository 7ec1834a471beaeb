//! Bounty lifecycle on the in-memory ledger
//!
//! Walks one bounty through every transition and shows the guards firing:
//! 1. Top up rewards with a second asset
//! 2. Assign a contributor (a second assign is rejected)
//! 3. Merge: reward fee to the fee wallet, share locked for claiming
//! 4. Close on the merged output is rejected
//! 5. Contributor claims the share
//!
//! Usage:
//!   cargo run --example bounty_lifecycle

use githoney_escrow::config::ClientConfig;
use githoney_escrow::sdk::{
    Address, AssetBag, AssetClass, BountyClient, BountyRecord, InMemoryLedger, SettingsRecord,
    TxPlan, UtxoRef, Wallet,
};
use githoney_escrow::*;

const NOW: u64 = 1_700_000_000_000;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

async fn submit(
    client: &BountyClient<InMemoryLedger>,
    signer: &Wallet,
    plan: &TxPlan,
) -> Result<UtxoRef, Box<dyn std::error::Error>> {
    client.ledger().select_wallet(signer).await;
    let tx_id = client.submit(plan).await?;
    println!("  submitted {tx_id}");
    Ok(UtxoRef::new(tx_id, 0))
}

async fn show_balance(client: &BountyClient<InMemoryLedger>, wallet: &Wallet, label: &str) {
    let balance = client
        .ledger()
        .balance_of(&Address::Wallet(wallet.clone()))
        .await;
    println!("  {label} holds {balance}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_header("Githoney bounty lifecycle");

    let ledger = InMemoryLedger::new(NOW);
    let settings = SettingsRecord {
        githoney_address: generate_wallet(),
        creation_fee: 2_000_000,
        reward_fee: 500,
    };
    let validator = generate_script_hash();
    let settings_ref = ledger.deploy_settings(&settings, &validator).await?;

    let admin = generate_wallet();
    let maintainer = generate_staked_wallet();
    let contributor = generate_wallet();
    let funder = generate_wallet();
    let honey = AssetClass::new(vec![0x48; 28], b"HONEY".to_vec());

    let initial = AssetBag::lovelace(10_000_000);
    let record = BountyRecord::open(
        &settings,
        admin.clone(),
        maintainer,
        NOW + 7 * DAY_MS,
        initial.clone(),
    );
    let bounty = ledger.lock_bounty(&validator, &record, initial).await?;
    ledger
        .fund_wallet(&funder, AssetBag::lovelace(5_000_000).with(honey.clone(), 500))
        .await;
    println!("Settings at {settings_ref}, fee {} bp", settings.reward_fee);
    println!("Bounty at {bounty}");

    let client = BountyClient::new(ledger, settings_ref, ClientConfig::default());

    print_step(1, "Add rewards");
    let rewards = AssetBag::lovelace(2_000_000).with(honey, 100);
    let planned = client.add_rewards(&bounty, &funder, &rewards).await?;
    let bounty = submit(&client, &funder, &planned.plan).await?;
    println!("  live value {}", client.bounty(&bounty).await?.value());

    print_step(2, "Assign contributor");
    let planned = client.assign(&bounty, &contributor).await?;
    let bounty = submit(&client, &contributor, &planned.plan).await?;
    let second = client.assign(&bounty, &generate_wallet()).await;
    print_result("second assign", &second);

    print_step(3, "Merge");
    let planned = client.merge(&bounty).await?;
    for payout in &planned.outcome.payouts {
        println!("  fee {} -> {}", payout.value, payout.to);
    }
    let payout = submit(&client, &admin, &planned.plan).await?;
    println!(
        "  claimable {} ({:?})",
        client.bounty(&payout).await?.value(),
        client.bounty(&payout).await?.state()
    );
    show_balance(&client, &settings.githoney_address, "fee wallet").await;

    print_step(4, "Close after merge");
    let closed = client.close(&payout).await;
    print_result("close", &closed);

    print_step(5, "Claim");
    client.ledger().select_wallet(&contributor).await;
    let planned = client.claim(&payout).await?;
    submit(&client, &contributor, &planned.plan).await?;
    show_balance(&client, &contributor, "contributor").await;

    Ok(())
}
