use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rtanks_stats::config::AppConfig;
use rtanks_stats::models::PlayerRecord;
use rtanks_stats::scraper::{RatingsScraper, WebsiteStatus};
use rtanks_stats::utils::{self, Timer};

#[derive(Parser)]
#[command(name = "rtanks-stats", about = "Player statistics lookup for the RTanks ratings site", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one player's profile
    Lookup {
        username: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two players side by side
    Compare { first: String, second: String },

    /// Check whether the ratings site is reachable
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "rtanks_stats=info,warn",
        1 => "rtanks_stats=debug,info",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let scraper = RatingsScraper::new(&config)?;

    match cli.command {
        Command::Lookup { username, json } => {
            let _t = Timer::start("player lookup");
            match scraper.get_player_data(&username).await {
                Some(record) if json => println!("{}", serde_json::to_string_pretty(&*record)?),
                Some(record) => print_record(&record),
                None => println!(
                    "No data for `{}` — check the spelling and try again later.",
                    username.trim()
                ),
            }
        }

        Command::Compare { first, second } => {
            if first.trim().eq_ignore_ascii_case(second.trim()) {
                println!("Cannot compare a player with themselves.");
            } else {
                let _t = Timer::start("player comparison");
                let (a, b) = tokio::join!(
                    scraper.get_player_data(&first),
                    scraper.get_player_data(&second),
                );
                match (a, b) {
                    (Some(a), Some(b)) => print_comparison(&a, &b),
                    (None, Some(_)) => println!("No data for `{}`.", first.trim()),
                    (Some(_), None) => println!("No data for `{}`.", second.trim()),
                    (None, None) => println!("No data for either player."),
                }
            }
        }

        Command::Status => match scraper.website_status().await {
            WebsiteStatus::Online { latency } => {
                println!("Online ({} ms)", latency.as_millis())
            }
            WebsiteStatus::Degraded { status } => println!("Degraded (HTTP {})", status),
            WebsiteStatus::Offline => println!("Offline"),
        },
    }

    scraper.close().await;
    Ok(())
}

fn print_record(record: &PlayerRecord) {
    let activity = if record.is_online { "Online" } else { "Offline" };
    let experience = match record.max_experience {
        Some(max) => format!(
            "{} / {}",
            utils::fmt_number(record.experience),
            utils::fmt_number(max)
        ),
        None => utils::fmt_number(record.experience),
    };

    println!("─────────────────────────────────────────");
    println!("  {} — {}", record.username, record.rank);
    println!("─────────────────────────────────────────");
    println!("  Activity   : {}", activity);
    println!("  Experience : {}", experience);
    println!("  Kills      : {}", utils::fmt_number(record.kills));
    println!("  Deaths     : {}", utils::fmt_number(record.deaths));
    println!("  K/D        : {}", record.kd_display());
    println!("  Premium    : {}", if record.premium { "Yes" } else { "No" });
    println!("  Gold boxes : {}", utils::fmt_number(record.gold_boxes));
    println!("  Group      : {}", display_or_dash(&record.group));
    if !record.equipment.turrets.is_empty() {
        println!("  Turrets    : {}", record.equipment.turrets.join(", "));
    }
    if !record.equipment.hulls.is_empty() {
        println!("  Hulls      : {}", record.equipment.hulls.join(", "));
    }
    println!("─────────────────────────────────────────");
}

fn display_or_dash(s: &str) -> &str {
    if s.is_empty() { "—" } else { s }
}

fn print_comparison(a: &PlayerRecord, b: &PlayerRecord) {
    println!("─────────────────────────────────────────");
    println!("  {} vs {}", a.username, b.username);
    println!("─────────────────────────────────────────");
    print_leader("Experience", a, b, a.experience, b.experience, |v| {
        utils::fmt_number(v)
    });
    print_leader("Gold boxes", a, b, a.gold_boxes, b.gold_boxes, |v| {
        utils::fmt_number(v)
    });

    let kd_line = match a.kd_ratio.partial_cmp(&b.kd_ratio) {
        Some(std::cmp::Ordering::Greater) => {
            format!("{} leads ({} vs {})", a.username, a.kd_display(), b.kd_display())
        }
        Some(std::cmp::Ordering::Less) => {
            format!("{} leads ({} vs {})", b.username, b.kd_display(), a.kd_display())
        }
        _ => format!("Tie ({})", a.kd_display()),
    };
    println!("  K/D        : {}", kd_line);

    if let (Some(ta), Some(tb)) = (
        a.equipment.best_modification(),
        b.equipment.best_modification(),
    ) {
        let equip_line = match ta.cmp(&tb) {
            std::cmp::Ordering::Greater => format!("{} (M{} vs M{})", a.username, ta, tb),
            std::cmp::Ordering::Less => format!("{} (M{} vs M{})", b.username, tb, ta),
            std::cmp::Ordering::Equal => format!("Tie (M{})", ta),
        };
        println!("  Equipment  : {}", equip_line);
    }

    println!("─────────────────────────────────────────");
    println!("  {:<12} {} / {}", a.username, a.rank, utils::fmt_number(a.kills));
    println!("  {:<12} {} / {}", b.username, b.rank, utils::fmt_number(b.kills));
    println!("─────────────────────────────────────────");
}

fn print_leader<F>(label: &str, a: &PlayerRecord, b: &PlayerRecord, va: u64, vb: u64, fmt: F)
where
    F: Fn(u64) -> String,
{
    let line = if va > vb {
        format!("{} leads ({} vs {})", a.username, fmt(va), fmt(vb))
    } else if vb > va {
        format!("{} leads ({} vs {})", b.username, fmt(vb), fmt(va))
    } else {
        format!("Tie ({})", fmt(va))
    };
    println!("  {:<10} : {}", label, line);
}
