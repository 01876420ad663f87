//! Event-driven UCI engine with the search on a worker thread.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;

use tracing::{debug, info, warn};

use kestrel_core::Game;
use kestrel_engine::{
    Engine, MaterialEvaluator, SearchConfig, SearchResult, StopHandle, budget_from_go,
};

use crate::command::{Command, GoParams, UciOption, parse_command};
use crate::error::UciError;

/// Depth cap for `go infinite` without an explicit `depth`.
const INFINITE_DEPTH: i32 = 64;

/// Whether a search is running, and if so whether it only ends on `stop`.
enum EngineState {
    Idle,
    Searching { infinite: bool },
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    /// A rendered `info` line from the search thread.
    Info(String),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    engine: Engine,
}

/// The UCI engine, holding the current game and the searcher.
///
/// Runs an event-driven loop on the calling thread, dispatching searches
/// to a worker thread and processing commands while it runs. All protocol
/// output is written from the loop thread.
pub struct UciEngine {
    game: Game,
    /// `None` while the search thread owns it.
    engine: Option<Engine>,
    state: EngineState,
    stop: Option<StopHandle>,
    pending_clear: bool,
    /// Pending table resize (MB) to apply when the search thread returns the engine.
    pending_resize: Option<usize>,
    pending_max_depth: Option<i32>,
}

impl UciEngine {
    /// Create an engine at the starting position with default settings.
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            game: Game::startpos(),
            engine: Some(Engine::new(MaterialEvaluator, config)),
            state: EngineState::Idle,
            stop: None,
            pending_clear: false,
            pending_resize: None,
            pending_max_depth: None,
        }
    }

    /// Run the UCI loop on stdin/stdout until `quit` or input closes.
    pub fn run(self) -> Result<(), UciError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(io::BufReader::new(io::stdin()), &mut out)
    }

    /// Run the UCI loop over arbitrary input and output streams.
    ///
    /// When input closes, a bounded search is allowed to finish and its
    /// `bestmove` is written; an infinite one is stopped first.
    pub fn run_with<R, W>(mut self, input: R, out: &mut W) -> Result<(), UciError>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let input_tx = tx.clone();
        std::thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(cmd = %trimmed, "received UCI command");
                let cmd = parse_command(trimmed);
                if input_tx.send(EngineEvent::UciCommand(cmd)).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(EngineEvent::InputClosed);
        });

        while let Ok(event) = rx.recv() {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(out)?,
                    Command::IsReady => writeln!(out, "readyok")?,
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(game) => self.game = game,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::SetOption(option) => self.handle_setoption(option),
                    Command::Stop => self.handle_stop(),
                    Command::Print => {
                        info!(fen = %self.game, "current position");
                        writeln!(out, "info string fen {}", self.game)?;
                    }
                    Command::Quit => {
                        self.handle_stop();
                        self.wait_for_search(&rx, out)?;
                        break;
                    }
                    Command::Unknown(cmd) => {
                        if !cmd.is_empty() {
                            debug!(%cmd, "ignoring unknown command");
                        }
                    }
                },
                EngineEvent::UciCommand(Err(e)) => {
                    warn!(error = %e, "UCI command rejected");
                }
                EngineEvent::Info(line) => writeln!(out, "{line}")?,
                EngineEvent::SearchDone(done) => self.finish_search(done, out)?,
                EngineEvent::InputClosed => {
                    if matches!(self.state, EngineState::Searching { infinite: true }) {
                        self.handle_stop();
                    }
                    self.wait_for_search(&rx, out)?;
                    break;
                }
            }
            out.flush()?;
        }

        out.flush()?;
        info!("kestrel shutting down");
        Ok(())
    }

    fn handle_uci<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let config = self.config();
        writeln!(out, "id name kestrel")?;
        writeln!(out, "id author the kestrel developers")?;
        writeln!(
            out,
            "option name Hash type spin default {} min 1 max 65536",
            config.hash_mb
        )?;
        writeln!(
            out,
            "option name MaxDepth type spin default {} min 1 max {INFINITE_DEPTH}",
            config.max_depth
        )?;
        writeln!(out, "uciok")
    }

    fn config(&self) -> SearchConfig {
        let mut config = self
            .engine
            .as_ref()
            .map(|engine| engine.config().clone())
            .unwrap_or_default();
        if let Some(mb) = self.pending_resize {
            config.hash_mb = mb;
        }
        if let Some(depth) = self.pending_max_depth {
            config.max_depth = depth;
        }
        config
    }

    fn handle_ucinewgame(&mut self) {
        self.game = Game::startpos();
        match self.engine.as_mut() {
            Some(engine) => engine.clear(),
            // Search thread owns the engine; clear when it comes back
            None => self.pending_clear = true,
        }
    }

    fn handle_setoption(&mut self, option: UciOption) {
        match (option, self.engine.as_mut()) {
            (UciOption::Hash(mb), Some(engine)) => engine.resize_tt(mb),
            (UciOption::Hash(mb), None) => self.pending_resize = Some(mb),
            (UciOption::MaxDepth(depth), Some(engine)) => engine.set_max_depth(depth),
            (UciOption::MaxDepth(depth), None) => self.pending_max_depth = Some(depth),
        }
        debug!(?option, "option set");
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if !matches!(self.state, EngineState::Idle) {
            warn!("go received while searching, ignoring");
            return;
        }
        let Some(mut engine) = self.engine.take() else {
            warn!("go received without an engine, ignoring");
            return;
        };

        let budget = budget_from_go(
            params.wtime,
            params.btime,
            params.winc,
            params.binc,
            params.movestogo,
            params.movetime,
            params.infinite,
            self.game.side_to_move(),
        );
        let max_depth = match (params.depth, params.infinite) {
            (Some(depth), _) => depth.max(1),
            (None, true) => INFINITE_DEPTH,
            (None, false) => engine.config().max_depth,
        };
        debug!(?budget, max_depth, "starting search");

        self.stop = Some(engine.stop_handle());
        self.state = EngineState::Searching {
            infinite: params.infinite,
        };

        let game = self.game.clone();
        let tx = tx.clone();
        std::thread::spawn(move || {
            let info_tx = tx.clone();
            let result = engine.timed_search_to_depth(&game, budget, max_depth, move |info| {
                let _ = info_tx.send(EngineEvent::Info(info.to_string()));
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, engine }));
        });
    }

    fn handle_stop(&mut self) {
        if let Some(stop) = &self.stop {
            stop.stop();
        }
    }

    /// Block until the running search (if any) reports back.
    fn wait_for_search<W: Write>(
        &mut self,
        rx: &mpsc::Receiver<EngineEvent>,
        out: &mut W,
    ) -> Result<(), UciError> {
        if matches!(self.state, EngineState::Idle) {
            return Ok(());
        }
        for event in rx {
            match event {
                EngineEvent::Info(line) => writeln!(out, "{line}")?,
                EngineEvent::SearchDone(done) => return self.finish_search(done, out),
                _ => {}
            }
        }
        Ok(())
    }

    fn finish_search<W: Write>(&mut self, done: SearchDone, out: &mut W) -> Result<(), UciError> {
        let mut engine = done.engine;

        if let Some(mb) = self.pending_resize.take() {
            engine.resize_tt(mb);
        }
        if std::mem::take(&mut self.pending_clear) {
            engine.clear();
        }
        if let Some(depth) = self.pending_max_depth.take() {
            engine.set_max_depth(depth);
        }

        self.engine = Some(engine);
        self.stop = None;
        self.state = EngineState::Idle;

        match done.result.best_move {
            Some(mv) => writeln!(out, "bestmove {mv}")?,
            None => writeln!(out, "bestmove 0000")?,
        }
        Ok(())
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
