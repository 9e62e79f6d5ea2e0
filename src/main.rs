use anyhow::Result;
use fincoach::coach::Coach;
use fincoach::config::CoachConfig;
use fincoach::service::demo::DemoService;
use fincoach::session::InMemoryTokenStore;
use fincoach::voice::NoSpeech;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fincoach=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FinCoach (demo mode)");

    let coach = Coach::new(
        Arc::new(DemoService::new()),
        Box::new(NoSpeech),
        Box::new(InMemoryTokenStore::default()),
        CoachConfig::default(),
    );
    coach.login_guest().await?;

    for message in coach.transcript() {
        println!("coach> {}", message.text);
    }
    println!("(type a command, e.g. \"Paid Rs 500 at Starbucks\"; \"quit\" to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }
        if let Some(reply) = coach.submit(&line).await? {
            println!("coach> {}", reply.text);
        }
        if let Some(snapshot) = coach.snapshot() {
            println!(
                "       [balance {} | mood {}]",
                snapshot.savings.balance,
                coach.mood()
            );
        }
    }

    info!("FinCoach session over");
    Ok(())
}
