use clap::Parser;
use snake_client::{
    core::config::DEFAULT_PORT, init_logging, play, ClientConfig, RandomSafePlayer, Rgb,
};
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Play a networked snake game with a built-in bot", long_about = None)]
struct Cli {
    /// Game server address as host:port.
    #[arg(long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,
    /// Player name (ASCII only; the server keeps the first 15 characters).
    #[arg(long, default_value = "rust-snake")]
    name: String,
    /// Snake colour as `r,g,b` or `#rrggbb`.
    #[arg(long, default_value = "0,0,255")]
    color: Rgb,
    #[arg(long, help = "Fix RNG seed for reproducible move choices (e.g., --seed 12345)")]
    seed: Option<u64>,
    /// Give up if the server is silent for this many seconds.
    #[arg(long)]
    read_timeout: Option<u64>,
    /// Reject packets with payloads larger than this many bytes.
    #[arg(long, default_value_t = u16::MAX as usize)]
    max_payload: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.server, cli.name, cli.color);
    config.read_timeout = cli.read_timeout.map(Duration::from_secs);
    config.max_payload = cli.max_payload;

    let player = match cli.seed {
        Some(s) => {
            println!("Using fixed seed: {} (moves will be reproducible)", s);
            RandomSafePlayer::with_seed(s)
        }
        None => RandomSafePlayer::new(),
    };

    println!("Connecting to {} as {}...", config.server, config.name);
    let outcome = play(&config, Box::new(player)).await?;

    let results = outcome.results;
    println!("\nGame over!");
    if let Some(reason) = &outcome.death_reason {
        println!("  Died:     {}", reason);
    }
    if results.died {
        println!("  Died on:  turn {}", results.died_on_turn);
    }
    println!("  Length:   {}", results.length);
    println!("  Score:    {}", results.score);
    println!("  Rank:     {}", results.rank);
    println!("  Ties:     {}", results.num_ties);
    println!("  New ELO:  {}", results.new_elo);
    println!("  Moves:    {}", outcome.turns);
    if outcome.mismatches > 0 {
        println!("  Out-of-sync squares seen: {}", outcome.mismatches);
    }
    Ok(())
}
