mod connection;
mod handler;
mod outbox;
mod registry;
mod room;
mod scheduler;
mod server;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use chuck_common::config::{
    GameConfig, DEFAULT_ANSWER_WINDOW_SECS, DEFAULT_NEXT_ROUND_DELAY_SECS, DEFAULT_POINTS_TARGET,
    DEFAULT_STARTING_LIVES,
};

/// Chuck Server - authority for the rhyming party game
#[derive(Parser, Debug)]
#[command(name = "chuck-server", version, about)]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:9876")]
    bind: String,

    /// Maximum simultaneous connections allowed
    #[arg(short, long, default_value_t = 100)]
    max_connections: usize,

    /// Seconds players have to answer once the word is revealed
    #[arg(long, default_value_t = DEFAULT_ANSWER_WINDOW_SECS)]
    answer_window_secs: u64,

    /// Pause between a round's results and the next round
    #[arg(long, default_value_t = DEFAULT_NEXT_ROUND_DELAY_SECS)]
    next_round_delay_secs: u64,

    /// Score that wins a match outright
    #[arg(long, default_value_t = DEFAULT_POINTS_TARGET)]
    points_target: u32,

    /// Lives each player starts with
    #[arg(long, default_value_t = DEFAULT_STARTING_LIVES)]
    starting_lives: u8,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            answer_window: Duration::from_secs(self.answer_window_secs),
            next_round_delay: Duration::from_secs(self.next_round_delay_secs),
            points_target: self.points_target,
            starting_lives: self.starting_lives.max(1),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chuck_server=debug,chuck_common=debug".into()),
        )
        .init();

    let args = Args::parse();

    let addr: SocketAddr = args.bind.parse()?;
    let config = args.game_config();

    tracing::info!(
        "Starting chuck server on {} (max {} connections, {:?})",
        addr,
        args.max_connections,
        config
    );
    server::run(addr, args.max_connections, config).await
}
