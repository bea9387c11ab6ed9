use anyhow::Result;
use clap::Parser;
use moodjournal::{
    commands,
    journal::DEFAULT_RECENT_LIMIT,
    payment::{Customer, DEFAULT_CUSTOMER_EMAIL, DEFAULT_CUSTOMER_NAME},
};
use std::path::PathBuf;

/// moodjournal - Mood Journal
///
/// Write journal entries, get the dominant emotion detected for each one,
/// and subscribe to the premium plan.
///
/// Emotion analysis needs HUGGING_FACE_TOKEN; subscribing needs
/// FLUTTERWAVE_SECRET_KEY. When the emotion service cannot answer, entries
/// are still saved and labelled "neutral" at 50%.
///
/// Examples:
///   moodjournal submit "Had a great walk by the lake"
///   moodjournal entries --limit 10
#[derive(Parser, Debug)]
#[command(author, version = env!("MOODJOURNAL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Journal data directory (overrides defaults; also via MOOD_JOURNAL_HOME)
    #[arg(
        long = "home",
        env = "MOOD_JOURNAL_HOME",
        value_name = "PATH",
        global = true
    )]
    pub home: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Analyze and save a journal entry
    Submit(SubmitArgs),

    /// Show recent journal entries, newest first
    Entries(EntriesArgs),

    /// Start a premium subscription checkout
    Subscribe(SubscribeArgs),

    /// Confirm a completed subscription checkout
    SubscriptionSuccess(SubscriptionSuccessArgs),
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// The journal entry text
    #[arg(value_name = "TEXT")]
    pub text: String,
}

#[derive(clap::Args, Debug)]
pub struct EntriesArgs {
    /// Maximum number of entries to show
    #[arg(long, short = 'n', default_value_t = DEFAULT_RECENT_LIMIT)]
    pub limit: usize,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct SubscribeArgs {
    /// Customer email address
    #[arg(long, default_value = DEFAULT_CUSTOMER_EMAIL)]
    pub email: String,

    /// Customer name
    #[arg(long, default_value = DEFAULT_CUSTOMER_NAME)]
    pub name: String,

    /// Print the payment link as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct SubscriptionSuccessArgs {
    /// Transaction reference returned by the gateway redirect
    #[arg(long = "tx-ref", value_name = "REF")]
    pub tx_ref: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = moodjournal::runtime::RealRuntime;

    match cli.command {
        Commands::Submit(args) => commands::submit(runtime, cli.home, &args.text).await?,
        Commands::Entries(args) => commands::entries(runtime, cli.home, args.limit, args.json)?,
        Commands::Subscribe(args) => {
            let customer = Customer {
                email: args.email,
                name: args.name,
            };
            commands::subscribe(runtime, customer, args.json).await?
        }
        Commands::SubscriptionSuccess(args) => commands::subscription_success(&args.tx_ref)?,
    }
    Ok(())
}
