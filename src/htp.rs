//! Text-protocol shell in the GTP style: one command per line, `=`
//! responses on success, `?` on failure. Drives board setup, play/undo
//! and the solver, and exposes the engine parameters.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use board_game_traits::Color;

use crate::board::{BoardConfig, ConstBoard, HexBoard, StoneBoard};
use crate::ice::{IceConfig, IceEngine};
use crate::solver::{DfsSolver, SolveResult, SolverConfig, SolverDb};
use crate::vc::VcBuilder;

const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "known_command",
    "list_commands",
    "name",
    "param_solver",
    "param_solver_ice",
    "play",
    "protocol_version",
    "quit",
    "set_board_size",
    "showboard",
    "solve-state",
    "undo",
    "version",
];

/// Startup options for the shell.
#[derive(Clone, Debug, Default)]
pub struct HtpConfig {
    pub tt_bits: u32,
    pub db_path: Option<PathBuf>,
    pub pattern_file: Option<PathBuf>,
}

impl HtpConfig {
    pub fn new() -> HtpConfig {
        HtpConfig {
            tt_bits: 20,
            db_path: None,
            pattern_file: None,
        }
    }
}

pub struct HtpEngine {
    config: HtpConfig,
    cb: Arc<ConstBoard>,
    stones: StoneBoard,
    moves: Vec<(Color, crate::board::HexPoint)>,
    ice_config: IceConfig,
    solver_config: SolverConfig,
    positions: SolverDb,
}

fn parse_color(input: &str) -> Result<Color, String> {
    match input.to_lowercase().as_str() {
        "b" | "black" => Ok(Color::Black),
        "w" | "white" => Ok(Color::White),
        other => Err(format!("unknown color \"{}\"", other)),
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::Black => "black",
        Color::White => "white",
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        other => Err(format!("expected 0/1, got \"{}\"", other)),
    }
}

impl HtpEngine {
    pub fn new(config: HtpConfig) -> HtpEngine {
        let cb = Arc::new(ConstBoard::new(11, 11));
        let stones = StoneBoard::new(Arc::clone(&cb));
        let positions = SolverDb::new(config.tt_bits, config.db_path.as_deref());
        HtpEngine {
            config,
            cb,
            stones,
            moves: Vec::new(),
            ice_config: IceConfig::default(),
            solver_config: SolverConfig::default(),
            positions,
        }
    }

    /// Reads commands from stdin until EOF or `quit`.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            writeln!(stdout, "{} {}\n", prefix, message)?;
            stdout.flush()?;
            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    fn rebuild_board(&mut self, width: u8, height: u8) {
        self.cb = Arc::new(ConstBoard::new(width, height));
        self.stones = StoneBoard::new(Arc::clone(&self.cb));
        self.moves.clear();
        // Hashes of different geometries share one key space; drop the
        // stores rather than risk stale hits.
        self.positions = SolverDb::new(self.config.tt_bits, self.config.db_path.as_deref());
    }

    fn replay(&mut self) {
        self.stones = StoneBoard::new(Arc::clone(&self.cb));
        let moves = self.moves.clone();
        for (color, cell) in moves {
            let _ = self.stones.play_move(color, cell);
        }
    }

    fn ice_engine(&self) -> IceEngine {
        match self.config.pattern_file.as_deref() {
            Some(path) => IceEngine::with_pattern_file(self.ice_config, path),
            None => IceEngine::new(self.ice_config),
        }
    }

    fn solve_state(&mut self, to_play: Color) -> Result<String, String> {
        let mut board = HexBoard::new(
            Arc::clone(&self.cb),
            Arc::new(self.ice_engine()),
            VcBuilder::default(),
            BoardConfig {
                backup_ice_info: self.solver_config.backup_ice_info,
                ..BoardConfig::default()
            },
        );
        board.set_state(&self.stones);
        let mut solver = DfsSolver::new(self.solver_config);
        let (result, _solution) = solver.solve(&mut board, to_play, &mut self.positions);
        match result {
            SolveResult::Win => Ok(color_name(to_play).to_string()),
            SolveResult::Loss => Ok(color_name(!to_play).to_string()),
            SolveResult::Unknown => Ok("unknown".to_string()),
        }
    }

    fn param_solver_ice(&mut self, args: &[&str]) -> Result<String, String> {
        if args.is_empty() {
            let c = &self.ice_config;
            return Ok(format!(
                "find_permanently_inferior {}\nfind_presimplicial_pairs {}\n\
                 find_all_pattern_killers {}\nfind_all_pattern_reversers {}\n\
                 find_all_pattern_dominators {}\nbackup_opponent_dead {}\n\
                 find_three_sided_dead_regions {}\niterative_dead_regions {}",
                c.find_permanently_inferior as u8,
                c.find_presimplicial_pairs as u8,
                c.find_all_pattern_killers as u8,
                c.find_all_pattern_reversers as u8,
                c.find_all_pattern_dominators as u8,
                c.backup_opponent_dead as u8,
                c.find_three_sided_dead_regions as u8,
                c.iterative_dead_regions as u8,
            ));
        }
        if args.len() != 2 {
            return Err("usage: param_solver_ice <key> <value>".to_string());
        }
        let value = args[1];
        match args[0] {
            "find_permanently_inferior" => {
                self.ice_config.find_permanently_inferior = parse_bool(value)?
            }
            "find_presimplicial_pairs" => {
                self.ice_config.find_presimplicial_pairs = parse_bool(value)?
            }
            "find_all_pattern_killers" => {
                self.ice_config.find_all_pattern_killers = parse_bool(value)?
            }
            "find_all_pattern_reversers" => {
                self.ice_config.find_all_pattern_reversers = parse_bool(value)?
            }
            "find_all_pattern_dominators" => {
                self.ice_config.find_all_pattern_dominators = parse_bool(value)?
            }
            "backup_opponent_dead" => self.ice_config.backup_opponent_dead = parse_bool(value)?,
            "find_three_sided_dead_regions" => {
                self.ice_config.find_three_sided_dead_regions = parse_bool(value)?
            }
            "iterative_dead_regions" => {
                self.ice_config.iterative_dead_regions = parse_bool(value)?
            }
            other => return Err(format!("unknown ice parameter \"{}\"", other)),
        }
        Ok(String::new())
    }

    fn param_solver(&mut self, args: &[&str]) -> Result<String, String> {
        if args.is_empty() {
            let c = &self.solver_config;
            return Ok(format!(
                "use_decompositions {}\nshrink_proofs {}\nbackup_ice_info {}\n\
                 move_ordering {}\nprogress_depth {}\nupdate_depth {}\n\
                 depth_limit {}\ntime_limit {}",
                c.use_decompositions as u8,
                c.shrink_proofs as u8,
                c.backup_ice_info as u8,
                c.move_ordering,
                c.progress_depth,
                c.update_depth,
                c.depth_limit.map_or(-1, |d| d as i64),
                c.time_limit.map_or(-1.0, |t| t.as_secs_f64()),
            ));
        }
        if args.len() != 2 {
            return Err("usage: param_solver <key> <value>".to_string());
        }
        let value = args[1];
        let parse_u32 =
            |v: &str| v.parse::<u32>().map_err(|_| format!("bad number \"{}\"", v));
        match args[0] {
            "use_decompositions" => self.solver_config.use_decompositions = parse_bool(value)?,
            "shrink_proofs" => self.solver_config.shrink_proofs = parse_bool(value)?,
            "backup_ice_info" => self.solver_config.backup_ice_info = parse_bool(value)?,
            "solve_root_again" => self.solver_config.solve_root_again = parse_bool(value)?,
            "move_ordering" => self.solver_config.move_ordering = parse_u32(value)?,
            "progress_depth" => self.solver_config.progress_depth = parse_u32(value)?,
            "update_depth" => self.solver_config.update_depth = parse_u32(value)?,
            "depth_limit" => {
                let depth = value
                    .parse::<i64>()
                    .map_err(|_| format!("bad number \"{}\"", value))?;
                self.solver_config.depth_limit =
                    if depth < 0 { None } else { Some(depth as u32) };
            }
            "time_limit" => {
                let seconds = value
                    .parse::<f64>()
                    .map_err(|_| format!("bad number \"{}\"", value))?;
                self.solver_config.time_limit = if seconds < 0.0 {
                    None
                } else {
                    Some(Duration::from_secs_f64(seconds))
                };
            }
            other => return Err(format!("unknown solver parameter \"{}\"", other)),
        }
        Ok(String::new())
    }

    /// Executes one command; returns success and the response body.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        let result = match command {
            "name" => Ok("solhex".to_string()),
            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),
            "protocol_version" => Ok("2".to_string()),
            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),
            "known_command" => match args.first() {
                Some(cmd) => Ok(KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str()).to_string()),
                None => Err("missing argument".to_string()),
            },
            "quit" => Ok(String::new()),
            "boardsize" | "set_board_size" => {
                let parse = |v: &str| {
                    v.parse::<u8>()
                        .map_err(|_| format!("bad size \"{}\"", v))
                };
                match args {
                    [w] => parse(w).map(|w| (w, w)),
                    [w, h] => parse(w).and_then(|w| parse(h).map(|h| (w, h))),
                    _ => Err("usage: boardsize <width> [height]".to_string()),
                }
                .and_then(|(w, h)| {
                    if w == 0
                        || h == 0
                        || (w as usize) * (h as usize) + 4
                            > crate::board::HexPoint::MAX_POINTS
                    {
                        Err(format!("unsupported size {}x{}", w, h))
                    } else {
                        self.rebuild_board(w, h);
                        Ok(String::new())
                    }
                })
            }
            "clear_board" => {
                self.moves.clear();
                self.replay();
                Ok(String::new())
            }
            "play" => match args {
                [color, cell] => parse_color(color).and_then(|color| {
                    let cell = self
                        .cb
                        .parse_point(cell)
                        .map_err(|err| err.to_string())?;
                    self.stones
                        .play_move(color, cell)
                        .map_err(|err| err.to_string())?;
                    self.moves.push((color, cell));
                    Ok(String::new())
                }),
                _ => Err("usage: play <color> <cell>".to_string()),
            },
            "undo" => {
                if self.moves.pop().is_none() {
                    Err("nothing to undo".to_string())
                } else {
                    self.replay();
                    Ok(String::new())
                }
            }
            "solve-state" => match args {
                [color] => parse_color(color).and_then(|color| self.solve_state(color)),
                _ => Err("usage: solve-state <color>".to_string()),
            },
            "param_solver_ice" => self.param_solver_ice(args),
            "param_solver" => self.param_solver(args),
            "showboard" => Ok(format!("\n{:?}", self.stones)),
            _ => Err(format!("unknown command: {}", command)),
        };
        match result {
            Ok(message) => (true, message),
            Err(message) => (false, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HtpEngine {
        HtpEngine::new(HtpConfig::new())
    }

    #[test]
    fn name_and_version_test() {
        let mut engine = engine();
        assert_eq!(engine.execute("name", &[]), (true, "solhex".to_string()));
        let (ok, _) = engine.execute("version", &[]);
        assert!(ok);
    }

    #[test]
    fn boardsize_play_undo_test() {
        let mut engine = engine();
        let (ok, _) = engine.execute("boardsize", &["6", "7"]);
        assert!(ok);
        let (ok, _) = engine.execute("play", &["b", "d4"]);
        assert!(ok);
        let (ok, msg) = engine.execute("play", &["w", "d4"]);
        assert!(!ok, "{}", msg);
        let (ok, _) = engine.execute("undo", &[]);
        assert!(ok);
        let (ok, _) = engine.execute("play", &["w", "d4"]);
        assert!(ok);
    }

    #[test]
    fn rejects_bad_input_test() {
        let mut engine = engine();
        assert!(!engine.execute("play", &["purple", "a1"]).0);
        assert!(!engine.execute("play", &["b", "z9"]).0);
        assert!(!engine.execute("boardsize", &["0"]).0);
        assert!(!engine.execute("boardsize", &["40", "40"]).0);
        assert!(!engine.execute("frobnicate", &[]).0);
    }

    #[test]
    fn params_roundtrip_test() {
        let mut engine = engine();
        let (ok, _) = engine.execute("param_solver_ice", &["find_permanently_inferior", "0"]);
        assert!(ok);
        let (ok, listing) = engine.execute("param_solver_ice", &[]);
        assert!(ok);
        assert!(listing.contains("find_permanently_inferior 0"));

        let (ok, _) = engine.execute("param_solver", &["time_limit", "2.5"]);
        assert!(ok);
        let (ok, listing) = engine.execute("param_solver", &[]);
        assert!(ok);
        assert!(listing.contains("time_limit 2.5"));
        assert!(!engine.execute("param_solver", &["bogus", "1"]).0);
    }

    #[test]
    fn solves_tiny_board_test() {
        let mut engine = engine();
        engine.execute("boardsize", &["1", "1"]);
        // Whoever moves first on 1x1 takes the only cell and wins.
        let (ok, winner) = engine.execute("solve-state", &["b"]);
        assert!(ok);
        assert_eq!(winner, "black");
        let (ok, winner) = engine.execute("solve-state", &["w"]);
        assert!(ok);
        assert_eq!(winner, "white");
    }
}
