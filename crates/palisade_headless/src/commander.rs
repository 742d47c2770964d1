//! Scripted commanders for headless runs.
//!
//! A commander is the deterministic stand-in for a human player: each
//! frame it may draw from the deck and deploy from the hand. Policies
//! never use randomness of their own, so a run's outcome depends only on
//! the session seed.

use serde::{Deserialize, Serialize};

use palisade_core::grid::GridPos;
use palisade_core::session::Session;

/// What the commander did during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommanderActivity {
    /// Draws bought this frame.
    pub draws: u32,
    /// Units deployed this frame.
    pub deploys: u32,
}

/// How the scripted player behaves.
///
/// Both spending policies interleave fielding and drafting: deploy the
/// oldest hand slot, then draw, until neither move is possible. The
/// interleave matters because deploys cost tokens too; draining the
/// balance on draws first would leave the hand stranded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommanderPolicy {
    /// Never draws or deploys; the do-nothing baseline.
    Idle,
    /// Draws whenever affordable and fields everything it can.
    Greedy,
    /// Like Greedy, but a draw must leave at least `floor` tokens.
    /// Drafted units still deploy whenever affordable.
    Reserve {
        /// Minimum balance a draw may leave behind.
        floor: u32,
    },
}

impl CommanderPolicy {
    /// Play one frame against the session.
    pub fn act(self, session: &mut Session) -> CommanderActivity {
        let mut activity = CommanderActivity::default();
        if self == Self::Idle {
            return activity;
        }

        loop {
            let before = activity;
            if !session.deck().hand().is_empty() {
                if let Some(pos) = find_deploy_cell(session) {
                    match session.deploy_from_hand(0, pos) {
                        Ok(_) => activity.deploys += 1,
                        Err(e) => tracing::debug!(error = %e, "deploy skipped"),
                    }
                }
            }
            if self.may_draw(session) {
                match session.draw_unit() {
                    Ok(_) => activity.draws += 1,
                    Err(e) => tracing::debug!(error = %e, "draw skipped"),
                }
            }
            if activity == before {
                return activity;
            }
        }
    }

    fn may_draw(self, session: &Session) -> bool {
        if session.deck().hand().is_full() {
            return false;
        }
        let (balance, cost) = (session.tokens(), session.draw_cost());
        match self {
            Self::Idle => false,
            Self::Greedy => balance >= cost,
            Self::Reserve { floor } => balance >= cost && balance - cost >= floor,
        }
    }
}

/// First empty revealed cell scanning from the south edge upward.
fn find_deploy_cell(session: &Session) -> Option<GridPos> {
    let grid = session.grid();
    let fog = session.fog();
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let pos = GridPos::new(x, y);
            if grid.is_cell_empty(pos) && fog.is_revealed(pos) {
                return Some(pos);
            }
        }
    }
    None
}
