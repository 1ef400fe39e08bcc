/*
[INPUT]:  API token from TRADELINK_TOKEN
[OUTPUT]: Balance and a price proposal
[POS]:    Examples - trading operations
[UPDATE]: When trading API changes
*/

use rust_decimal::Decimal;
use tradelink_adapter::*;

/// Example: authorize, then price a contract
///
/// Buying is left commented out; it spends account funds.
#[tokio::main]
async fn main() {
    println!("=== Tradelink Trading Example ===\n");

    let Ok(token) = std::env::var("TRADELINK_TOKEN") else {
        eprintln!("Set TRADELINK_TOKEN to run this example");
        return;
    };

    let connection = ConnectionManager::new(ClientConfig::default());
    if let Err(e) = connection.connect_default().await {
        eprintln!("Failed to connect: {}", e);
        return;
    }
    let apis = ApiManager::new(connection.clone());

    match apis.auth().authorize(&token).await {
        Ok(account) => println!("✓ Authorized as {} ({})", account.loginid, account.currency),
        Err(e) => {
            eprintln!("Authorization failed: {}", e);
            return;
        }
    }

    match apis.account().balance().await {
        Ok(balance) => println!("✓ Balance: {} {}", balance.balance, balance.currency),
        Err(e) => eprintln!("balance failed: {}", e),
    }

    let request = ProposalRequest::new("CALL", "R_100", Decimal::from(10), Basis::Stake, "USD")
        .duration(5, DurationUnit::Ticks);
    match apis.trading().proposal(&request).await {
        Ok(proposal) => {
            println!("\nProposal {}:", proposal.id);
            println!("  ask {} for payout {}", proposal.ask_price, proposal.payout);
            println!("  {}", proposal.longcode);

            // let receipt = apis.trading().buy(&proposal.id, proposal.ask_price).await?;
        }
        Err(e) => eprintln!("proposal failed: {}", e),
    }

    connection.disconnect().await;
    println!("\n✓ Trading example complete");
}
