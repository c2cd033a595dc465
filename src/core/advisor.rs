use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::core::board::{Board, Color, CODE_BLACK_MAN, CODE_WHITE_MAN};
use crate::core::rules::Step;

/** Caller-supplied search budget; the oracle self-terminates on both. */
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SearchLimits {
    pub max_time: Duration,
    pub max_depth: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_time: Duration::from_secs(5),
            max_depth: 64,
        }
    }
}

/** Final answer of one advisory search. Empty `steps` means no move. */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub steps: Vec<Step>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/**
The advisory search backend.

`board` is the flat 64-cell encoding (`0` empty, `1` black man, `2` white
man, `3` black king, `4` white king), `player` the man code of the side to
move. `progress` may be called any number of times with `(depth, score)`
before the final report. Implementations run on a worker thread and must
stay within `limits` on their own; nobody aborts them from outside.
*/
pub trait Oracle: Send + Sync {
    fn search(
        &self,
        board: [u8; 64],
        player: u8,
        limits: SearchLimits,
        progress: &mut dyn FnMut(u32, i32),
    ) -> anyhow::Result<SearchReport>;
}

/** Everything crossing from a worker into the interactive context. */
#[derive(Clone, Debug)]
pub enum AdvisoryMsg {
    Progress { turn_id: u64, depth: u32, score: i32 },
    Final { turn_id: u64, report: SearchReport },
}

impl AdvisoryMsg {
    pub fn turn_id(&self) -> u64 {
        match self {
            AdvisoryMsg::Progress { turn_id, .. } | AdvisoryMsg::Final { turn_id, .. } => *turn_id,
        }
    }
}

/** What the surface paints: search liveness, live depth/score, final hint. */
#[derive(Clone, Debug, Default)]
pub struct AdvisoryView {
    pub thinking: bool,
    pub progress: Option<(u32, i32)>,
    pub outcome: Option<SearchReport>,
}

impl AdvisoryView {
    pub fn hint(&self) -> Option<&[Step]> {
        self.outcome
            .as_ref()
            .map(|report| report.steps.as_slice())
            .filter(|steps| !steps.is_empty())
    }
}

/**
Dispatches advisory searches and reconciles their asynchronous answers.

One worker thread per request; all workers feed the same channel, and the
single consumer applies only messages tagged with the current turn id.
Superseded workers are never cancelled, their output just becomes inert.
Dropping the advisor closes the receiver and in-flight workers fail their
sends quietly.
*/
pub struct Advisor {
    oracle: Arc<dyn Oracle>,
    limits: SearchLimits,
    tx: Sender<AdvisoryMsg>,
    rx: Receiver<AdvisoryMsg>,
    view: AdvisoryView,
}

fn player_code(player: Color) -> u8 {
    match player {
        Color::Black => CODE_BLACK_MAN,
        Color::White => CODE_WHITE_MAN,
    }
}

impl Advisor {
    pub fn new(oracle: Arc<dyn Oracle>, limits: SearchLimits) -> Advisor {
        let (tx, rx) = mpsc::channel();
        Advisor {
            oracle,
            limits,
            tx,
            rx,
            view: AdvisoryView::default(),
        }
    }

    pub fn view(&self) -> &AdvisoryView {
        &self.view
    }

    /**
    Start one search for the position `player` now faces. `snapshot` is a
    deep copy owned by the worker; the live board is never exposed to it.
    */
    pub fn request(&mut self, snapshot: Board, player: Color, turn_id: u64) {
        self.view = AdvisoryView {
            thinking: true,
            ..AdvisoryView::default()
        };
        let oracle = Arc::clone(&self.oracle);
        let limits = self.limits;
        let tx = self.tx.clone();
        info!("advisory search dispatched for {player:?}, turn {turn_id}");
        thread::spawn(move || {
            let codes = snapshot.codes();
            let mut progress = |depth: u32, score: i32| {
                let _ = tx.send(AdvisoryMsg::Progress {
                    turn_id,
                    depth,
                    score,
                });
            };
            match oracle.search(codes, player_code(player), limits, &mut progress) {
                Ok(report) => {
                    let _ = tx.send(AdvisoryMsg::Final { turn_id, report });
                }
                // Contained here; the user simply gets no hint this turn.
                Err(err) => error!("advisory search failed for turn {turn_id}: {err:#}"),
            }
        });
    }

    /**
    Drain the channel without blocking and apply messages matching
    `current_turn_id`; everything else is stale and dropped. Returns
    whether the view changed.
    */
    pub fn poll(&mut self, current_turn_id: u64) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.rx.try_recv() {
            if msg.turn_id() != current_turn_id {
                debug!(
                    "dropping stale advisory message for turn {} (now {})",
                    msg.turn_id(),
                    current_turn_id
                );
                continue;
            }
            match msg {
                AdvisoryMsg::Progress { depth, score, .. } => {
                    self.view.progress = Some((depth, score));
                }
                AdvisoryMsg::Final { report, .. } => {
                    info!(
                        "advisory ready: depth {} score {} nodes {}",
                        report.depth, report.score, report.nodes
                    );
                    self.view.thinking = false;
                    self.view.outcome = Some(report);
                }
            }
            changed = true;
        }
        changed
    }

    pub fn clear(&mut self) {
        self.view = AdvisoryView::default();
    }
}
