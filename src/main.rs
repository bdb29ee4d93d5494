use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use glyph_chess::protocol::{load_board, parse_color, CommandHandler};
use glyph_chess::{CastlingRights, SearchConfig, State};

#[derive(Parser, Debug)]
#[command(name = "glyph-chess", about = "Chess rules engine and move suggester on stdin/stdout")]
struct Args {
    /// Search depth in plies after each root move
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Maximum number of positions kept in the search cache
    #[arg(long, default_value_t = 1 << 20)]
    cache_capacity: usize,

    /// Reuse every cached score deep enough, ignoring whether it was a cutoff bound
    #[arg(long)]
    reference_cache: bool,

    /// Weight of the own-minus-enemy attacked squares term
    #[arg(long, default_value_t = 0)]
    mobility_weight: i32,

    /// Board file to start from instead of the initial position
    #[arg(long)]
    board: Option<PathBuf>,

    /// Side to move when starting from --board (w or b)
    #[arg(long, default_value = "w")]
    turn: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = SearchConfig::default()
        .with_depth(args.depth)
        .with_cache_capacity(args.cache_capacity)
        .with_bound_aware_cache(!args.reference_cache)
        .with_mobility_weight(args.mobility_weight);

    let mut handler = CommandHandler::new(config);
    if let Some(path) = &args.board {
        let board = load_board(path)?;
        let turn = parse_color(&args.turn)?;
        let castling = CastlingRights::inferred(&board);
        handler = handler.with_state(State::new(board, turn, None, castling));
    }

    handler.run()
}
