use anyhow::{Context, Result};
use campuspay::client::CampusPayClient;

/// Scans a QR payload and pays it as a student, end to end.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let base_url = std::env::var("CAMPUSPAY_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let email = std::env::var("CAMPUSPAY_EMAIL").context("CAMPUSPAY_EMAIL is required")?;
    let password = std::env::var("CAMPUSPAY_PASSWORD").context("CAMPUSPAY_PASSWORD is required")?;
    let mpin = std::env::var("CAMPUSPAY_MPIN").context("CAMPUSPAY_MPIN is required")?;
    let payload = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CAMPUSPAY_QR").ok())
        .context("pass the QR payload as an argument or set CAMPUSPAY_QR")?;

    println!("CampusPay Agent");
    println!("===============");
    println!("Server: {}", base_url);
    println!();

    let mut client = CampusPayClient::new(base_url);

    let session = client.login(&email, &password).await?;
    println!("[OK] Logged in as {} ({})", session.user.name, session.user.role);

    let balance = client.balance().await?;
    println!("Balance: {}", balance.balance);

    println!("Step 1: Verifying QR...");
    let verified = client.verify_qr(&payload).await?;
    println!("   [OK] Pay {} to {}", verified.amount, verified.vendor_name);

    if verified.amount > balance.balance {
        println!("[ERROR] Insufficient balance for this payment");
        return Ok(());
    }

    println!("Step 2: Paying...");
    match client.pay(&verified.tid, &mpin).await {
        Ok(tx) => {
            println!("   [OK] Paid, reference {}", tx.reference);
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Err(e) => println!("[FAILED] {}", e),
    }

    Ok(())
}
