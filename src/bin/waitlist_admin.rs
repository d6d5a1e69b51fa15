//! Offline waitlist operations against the same configuration as the server.

use std::str::FromStr;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use waitlist_api::{
    application::use_cases::campaign::CampaignRequest,
    domain::entities::campaign::Campaign,
    infra::setup::{init_app_state, init_tracing},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Waitlist maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retry every email waiting in the local queue.
    ProcessQueue,

    /// Remove an address from all stores and drop its queued mail.
    Remove { email: String },

    /// Send a campaign to the waitlist or to one address.
    Campaign {
        #[arg(value_parser = parse_campaign)]
        campaign: Campaign,

        /// Send only to this address.
        #[arg(long)]
        email: Option<String>,

        /// Zero-based offset into the waitlist.
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Number of recipients to send to.
        #[arg(long)]
        batch: Option<usize>,

        /// List recipients without sending.
        #[arg(long)]
        dry_run: bool,

        /// Run the queue reprocessor after the campaign.
        #[arg(long)]
        process_queue: bool,
    },

    /// Print every subscriber as CSV.
    List,
}

fn parse_campaign(raw: &str) -> Result<Campaign, String> {
    Campaign::from_str(raw).map_err(|_| format!("unknown campaign: {raw}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let app_state = init_app_state().await?;

    match cli.command {
        Command::ProcessQueue => {
            let report = app_state.queue_processor.process().await?;
            println!("processed={} failed={}", report.processed, report.failed);
        }
        Command::Remove { email } => {
            let report = app_state.waitlist.remove(&email).await?;
            println!(
                "removed {} from {} (purged {} queued emails)",
                report.email,
                report.removed_from.join(", "),
                report.purged_queue_files
            );
        }
        Command::Campaign {
            campaign,
            email,
            start,
            batch,
            dry_run,
            process_queue,
        } => {
            let request = CampaignRequest {
                campaign,
                email,
                start,
                batch,
                dry_run,
            };
            let report = app_state.campaigns.run(&request).await?;
            if let Some(recipients) = &report.recipients {
                for recipient in recipients {
                    println!("{recipient}");
                }
            }
            println!(
                "campaign={} total={} sent={} queued={} failed={}",
                report.campaign, report.total, report.sent, report.queued, report.failed
            );
            if process_queue && !dry_run {
                let queue = app_state.queue_processor.process().await?;
                println!("queue: processed={} failed={}", queue.processed, queue.failed);
            }
        }
        Command::List => {
            for subscriber in app_state.waitlist.list().await? {
                println!("{},{}", subscriber.email, subscriber.formatted_timestamp());
            }
        }
    }

    Ok(())
}
