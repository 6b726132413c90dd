use rsa_channel::{ChannelConfig, Party, exchange};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; stdout is reserved for the exchange itself
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let config = ChannelConfig::default();

    // Generate both key pairs side by side on blocking workers
    let (alice, bob) = tokio::try_join!(
        Party::spawn("Alice", config.clone()),
        Party::spawn("Bob", config.clone()),
    )?;

    // Print public keys for testing
    for party in [&alice, &bob] {
        tracing::info!("{}'s public key:\n{}", party.name(), party.public_key_text()?);
    }

    for event in exchange(&alice, &bob)? {
        println!("{}", event);
    }

    Ok(())
}
