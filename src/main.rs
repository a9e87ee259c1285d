use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use care_intake::config::IntakeConfig;
use care_intake::pipeline::{InboundSms, IntakeProcessor};
use care_intake::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Config: JSON file if given, defaults otherwise
    let config = match std::env::var("CARE_INTAKE_CONFIG") {
        Ok(path) => IntakeConfig::load(Path::new(&path))?,
        Err(_) => IntakeConfig::default(),
    };

    let db_path = std::env::var("CARE_INTAKE_DB_PATH")
        .unwrap_or_else(|_| "./data/care-intake.db".to_string());

    let store: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(Path::new(&db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {db_path}: {e}");
                std::process::exit(1);
            }),
    );

    let processor = IntakeProcessor::with_template_replies(config, store);

    eprintln!("care-intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  DB: {db_path}");
    eprintln!("  Type messages as `<phone>: <text>` and press Enter. /quit to exit.\n");

    // CLI stands in for the SMS transport: one line per inbound message.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut counter: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let (phone, text) = match line.split_once(':') {
            Some((phone, text)) => (phone.trim().to_string(), text.trim().to_string()),
            None => ("5550000000".to_string(), line.to_string()),
        };

        counter += 1;
        let message = InboundSms {
            phone_number: phone,
            text,
            message_id: format!("cli-{counter}"),
        };

        match processor.process(message).await {
            Ok(result) => {
                println!("↩ {}", result.reply.reply_text);
                if result.reply.escalate {
                    println!("  [escalated to a care coordinator]");
                }
                if let Some(profile) = result.profile {
                    println!("  {}", profile.summary());
                }
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
