//! REST API over the bounty escrow SDK, backed by the in-memory ledger.
//!
//! Usage:
//!   cargo run --bin api
//!
//! Environment:
//!   - GITHONEY_GENESIS: JSON genesis to seed the ledger (a demo one is generated otherwise)
//!   - GITHONEY_LISTEN, GITHONEY_VALIDITY_WINDOW_MS, GITHONEY_FETCH_TIMEOUT_MS
//!   - RUST_LOG (default `info`)

use githoney_escrow::api::{AppState, build_router};
use githoney_escrow::config::ApiConfig;
use githoney_escrow::sdk::{
    AssetBag, AssetClass, BountyClient, BountyRecord, Genesis, InMemoryLedger, JsonCodec,
    SettingsRecord,
    emulator::{GenesisBounty, GenesisFunds},
};
use githoney_escrow::{generate_script_hash, generate_wallet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// One open bounty with a reward token and a funded wallet to top it up.
fn demo_genesis(now: u64) -> Genesis {
    let settings = SettingsRecord {
        githoney_address: generate_wallet(),
        creation_fee: 2_000_000,
        reward_fee: 500,
    };
    let token = AssetClass::new(b"\x01\x02\x03".to_vec(), b"HONEY".to_vec());
    let value = AssetBag::lovelace(10_000_000).with(token.clone(), 1_000);
    let record = BountyRecord::open(
        &settings,
        generate_wallet(),
        generate_wallet(),
        now + 7 * DAY_MS,
        value.clone(),
    );
    Genesis {
        now,
        validator: generate_script_hash(),
        wallets: vec![GenesisFunds {
            wallet: generate_wallet(),
            value: AssetBag::lovelace(100_000_000).with(token, 10_000),
        }],
        bounties: vec![GenesisBounty { record, value }],
        settings,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env()?;

    let genesis = match &config.genesis {
        Some(path) => {
            info!(path = %path.display(), "loading genesis");
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        }
        None => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
            demo_genesis(now)
        }
    };

    let (ledger, refs) = InMemoryLedger::<JsonCodec>::from_genesis(&genesis).await?;
    println!("Ledger seeded. Settings at {}", refs.settings);
    for bounty in &refs.bounties {
        println!("  bounty {bounty}");
    }
    for funds in &genesis.wallets {
        println!("  wallet {} holds {}", funds.wallet, funds.value);
    }

    let client = BountyClient::new(ledger, refs.settings, config.client);
    let state = AppState {
        client: Arc::new(client),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    println!("Listening on http://{}", config.listen);
    println!();
    println!("Endpoints:");
    println!("  GET  /settings                        Settings + validator");
    println!("  GET  /bounty/{{tx}}/{{ix}}                Record, state, live value");
    println!("  POST /bounty/{{tx}}/{{ix}}/rewards        Plan a reward top-up");
    println!("  POST /bounty/{{tx}}/{{ix}}/assign         Plan contributor assignment");
    println!("  POST /bounty/{{tx}}/{{ix}}/merge          Plan merge + fee payout");
    println!("  POST /bounty/{{tx}}/{{ix}}/close          Plan close, refund maintainer");
    println!("  POST /bounty/{{tx}}/{{ix}}/claim          Plan contributor claim");

    axum::serve(listener, app).await?;

    Ok(())
}
