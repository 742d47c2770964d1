//! Deployment validation.
//!
//! Deploying from the hand crosses three services: the cell must be inside
//! the grid and empty, the fog must have revealed it, and the ledger must
//! cover the unit's cost. Validation is pure; the session commits only
//! after it passes, so a refused deploy has no side effect.

use thiserror::Error;

use crate::economy::TokenLedger;
use crate::fog::FogGrid;
use crate::grid::{Grid, GridPos};

/// Why a deployment was refused. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeployError {
    /// Target cell lies outside the grid.
    #[error("cell {pos} is outside the grid")]
    OutOfBounds {
        /// The rejected cell.
        pos: GridPos,
    },

    /// Target cell already holds an occupant.
    #[error("cell {pos} is occupied")]
    CellOccupied {
        /// The rejected cell.
        pos: GridPos,
    },

    /// Target cell has never been revealed.
    #[error("cell {pos} is still under fog")]
    CellNotRevealed {
        /// The rejected cell.
        pos: GridPos,
    },

    /// The unit's cost exceeds the balance.
    #[error("insufficient tokens: deployment costs {required}, have {available}")]
    InsufficientTokens {
        /// Deployment cost.
        required: u32,
        /// Balance at refusal time.
        available: u32,
    },

    /// The chosen hand slot holds nothing.
    #[error("hand slot {slot} is empty")]
    EmptyHandSlot {
        /// The rejected slot index.
        slot: usize,
    },
}

/// Check a deployment target without committing anything.
pub fn validate_deploy(
    grid: &Grid,
    fog: &FogGrid,
    ledger: &TokenLedger,
    pos: GridPos,
    cost: u32,
) -> Result<(), DeployError> {
    if !grid.is_valid_cell(pos) {
        return Err(DeployError::OutOfBounds { pos });
    }
    if !grid.is_cell_empty(pos) {
        return Err(DeployError::CellOccupied { pos });
    }
    if !fog.is_revealed(pos) {
        return Err(DeployError::CellNotRevealed { pos });
    }
    if !ledger.can_afford(cost) {
        return Err(DeployError::InsufficientTokens {
            required: cost,
            available: ledger.balance(),
        });
    }
    Ok(())
}
