use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::board::{Board, Color, Position};
use crate::search::{SearchConfig, SearchEngine};
use crate::state::{CastlingRights, State};
use crate::transposition::TranspositionTable;

const HELP: &str = "\
commands:
  new                  start from the initial position
  show                 print the board
  export               print the raw board string
  load <file> [w|b]    load a 64-cell board string, white to move by default
  moves <sq>           legal destinations of the piece on <sq>
  move <from> <to>     play a move
  score <from> <to>    search score of a root move
  rank                 all root moves, best first
  suggest              best move according to the search
  status               check / checkmate / stalemate
  depth <n>            search depth in plies
  quit
";

pub fn parse_color(s: &str) -> Result<Color> {
    match s {
        "w" | "white" => Ok(Color::White),
        "b" | "black" => Ok(Color::Black),
        other => bail!("unknown side {:?}, expected w or b", other),
    }
}

pub struct CommandHandler {
    state: State,
    config: SearchConfig,
    cache: Option<TranspositionTable>,
}

impl CommandHandler {
    pub fn new(config: SearchConfig) -> Self {
        CommandHandler {
            state: State::initial(),
            config,
            cache: None,
        }
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        while reader.read_line(&mut line).context("failed to read command")? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => print!("{}", response),
                Err(err) => println!("error: {:#}", err),
            }

            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "help" => Ok(HELP.to_string()),
            "new" => Ok(self.handle_new()),
            "show" => Ok(self.state.to_string()),
            "export" => Ok(self.state.export()),
            "load" => self.handle_load(&parts[1..]),
            "moves" => self.handle_moves(&parts[1..]),
            "move" => self.handle_move(&parts[1..]),
            "score" => self.handle_score(&parts[1..]),
            "rank" => self.handle_rank(),
            "suggest" => self.handle_suggest(),
            "status" => Ok(format!("{}\n", self.status())),
            "depth" => self.handle_depth(&parts[1..]),
            "quit" => Ok(String::new()),
            other => bail!("unknown command {:?}, try help", other),
        }
    }

    fn handle_new(&mut self) -> String {
        self.state = State::initial();
        self.cache = None;
        String::new()
    }

    fn handle_load(&mut self, parts: &[&str]) -> Result<String> {
        let path = parts.first().ok_or_else(|| anyhow!("usage: load <file> [w|b]"))?;
        let turn = match parts.get(1) {
            Some(side) => parse_color(side)?,
            None => Color::White,
        };

        let board = load_board(Path::new(path))?;
        let castling = CastlingRights::inferred(&board);
        self.state = State::new(board, turn, None, castling);
        self.cache = None;
        Ok(self.state.to_string())
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let from = parse_square(parts.first())?;
        let moves: Vec<String> = self
            .state
            .valid_moves(from)
            .iter()
            .map(|to| to.to_string())
            .collect();
        Ok(format!("{}\n", moves.join(" ")))
    }

    fn handle_move(&mut self, parts: &[&str]) -> Result<String> {
        let from = parse_square(parts.first())?;
        let to = parse_square(parts.get(1))?;

        self.state = self.state.play(from, to)?;
        Ok(format!("{}\n", self.status()))
    }

    fn handle_score(&mut self, parts: &[&str]) -> Result<String> {
        let from = parse_square(parts.first())?;
        let to = parse_square(parts.get(1))?;

        let score = self.with_engine(|engine| Ok(engine.score(from, to)?))?;
        match score {
            Some(score) => Ok(format!("score {}\n", score)),
            None => bail!("{}{} is not a legal move", from, to),
        }
    }

    fn handle_rank(&mut self) -> Result<String> {
        let ranked = self.with_engine(|engine| Ok(engine.rank_moves()?))?;
        let mut response = String::new();
        for (mv, score) in ranked {
            response.push_str(&format!("{} {}\n", mv, score));
        }
        Ok(response)
    }

    fn handle_suggest(&mut self) -> Result<String> {
        let best = self.with_engine(|engine| Ok(engine.suggest_move()?))?;
        match best {
            Some(mv) => Ok(format!("bestmove {}\n", mv)),
            None => Ok("bestmove (none)\n".to_string()),
        }
    }

    fn handle_depth(&mut self, parts: &[&str]) -> Result<String> {
        let depth = parts
            .first()
            .ok_or_else(|| anyhow!("usage: depth <n>"))?
            .parse::<u32>()
            .context("depth must be a non-negative integer")?;
        self.config.depth = depth;
        Ok(String::new())
    }

    fn status(&self) -> &'static str {
        if self.state.in_checkmate() {
            "checkmate"
        } else if self.state.in_stalemate() {
            "stalemate"
        } else if self.state.in_check() {
            "check"
        } else {
            "ongoing"
        }
    }

    // Engines are short lived; the cache survives between them
    fn with_engine<T>(&mut self, f: impl FnOnce(&mut SearchEngine) -> Result<T>) -> Result<T> {
        let table = self
            .cache
            .take()
            .unwrap_or_else(|| TranspositionTable::new(self.config.cache_capacity));
        let mut engine = SearchEngine::with_cache(self.state.clone(), self.config, table);

        let result = f(&mut engine);
        debug!(nodes = engine.get_nodes_searched(), "engine request done");
        self.cache = Some(engine.into_cache());
        result
    }
}

pub fn load_board(path: &Path) -> Result<Board> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read board file {}", path.display()))?;
    // Editors tend to append a final newline, which the board string must not count
    let contents = contents.trim_end_matches(['\n', '\r']);
    Board::import(contents).with_context(|| format!("invalid board in {}", path.display()))
}

fn parse_square(part: Option<&&str>) -> Result<Position> {
    let square = part.ok_or_else(|| anyhow!("missing square"))?;
    Ok(square.parse::<Position>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CommandHandler {
        CommandHandler::new(SearchConfig::default().with_depth(1))
    }

    #[test]
    fn test_moves_and_move() {
        let mut handler = handler();
        assert_eq!(handler.handle_command("moves e2").unwrap(), "e3 e4\n");
        assert_eq!(handler.handle_command("move e2 e4").unwrap(), "ongoing\n");
        assert_eq!(handler.state().turn(), Color::Black);
        assert!(handler.handle_command("move e2 e4").is_err());
    }

    #[test]
    fn test_fools_mate_status() {
        let mut handler = handler();
        for command in ["move f2 f3", "move e7 e5", "move g2 g4"] {
            handler.handle_command(command).unwrap();
        }
        assert_eq!(handler.handle_command("move d8 h4").unwrap(), "checkmate\n");
        assert_eq!(handler.handle_command("suggest").unwrap(), "bestmove (none)\n");
    }

    #[test]
    fn test_suggest_and_score() {
        let mut handler = handler();
        let response = handler.handle_command("suggest").unwrap();
        assert!(response.starts_with("bestmove "));

        assert!(handler.handle_command("score e2 e4").unwrap().starts_with("score "));
        assert!(handler.handle_command("score e2 e5").is_err());
        assert_eq!(handler.handle_command("rank").unwrap().lines().count(), 20);
    }

    #[test]
    fn test_bad_input() {
        let mut handler = handler();
        assert!(handler.handle_command("moves z9").is_err());
        assert!(handler.handle_command("depth deep").is_err());
        assert!(handler.handle_command("fly").is_err());
        assert_eq!(handler.handle_command("").unwrap(), "");
    }

    #[test]
    fn test_load_board_file() {
        let path = std::env::temp_dir().join(format!("glyph-chess-{}.txt", std::process::id()));
        fs::write(&path, Board::initial().export()).unwrap();

        let mut handler = handler();
        handler.handle_command("move e2 e4").unwrap();
        handler
            .handle_command(&format!("load {} b", path.display()))
            .unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(handler.state().board(), &Board::initial());
        assert_eq!(handler.state().turn(), Color::Black);
        assert_eq!(handler.state().castling(), CastlingRights::ALL);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("w").unwrap(), Color::White);
        assert_eq!(parse_color("black").unwrap(), Color::Black);
        assert!(parse_color("red").is_err());
    }
}
