use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::maze::{Maze, MazeConfig};
use server::network::Server;
use shared::{DEFAULT_COLS, DEFAULT_PORT, DEFAULT_ROWS};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maze height in cells (rounded up to an odd number of at least 5)
    #[arg(short, long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Maze width in cells (rounded up to an odd number of at least 5)
    #[arg(short, long, default_value_t = DEFAULT_COLS)]
    cols: usize,

    /// Number of doors to place
    #[arg(short, long, default_value_t = 5)]
    doors: usize,

    /// Maximum number of extra loops opened after carving
    #[arg(short, long, default_value_t = 10)]
    loops: usize,

    /// Seed for a reproducible maze
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = MazeConfig {
        rows: args.rows,
        cols: args.cols,
        loops: args.loops,
        doors: args.doors,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let maze = Maze::generate(&config, &mut rng);
    info!(
        "Generated {}x{} maze with {} doors, exit at ({}, {})",
        maze.rows(),
        maze.cols(),
        maze.doors().len(),
        maze.exit().x,
        maze.exit().y
    );

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, maze).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
