//! Fog of war.
//!
//! Two parallel masks over the grid. `revealed` is monotonic: a cell seen
//! once stays explored for the rest of the session. `visible` is recomputed
//! every update from current player-unit positions. Fog gates deployment
//! (no placing into unexplored cells) and biases resource spawns toward
//! hidden ground.
//!
//! # Invariant
//!
//! `visible` implies `revealed`. Nothing ever clears a `revealed` bit;
//! resizing shifts surviving bits but never unsets one in place.

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::math::Fixed;

/// Revealed/visible masks over the cell grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogGrid {
    width: u32,
    height: u32,
    revealed: Vec<bool>,
    visible: Vec<bool>,
}

impl FogGrid {
    /// Fully hidden fog over a `width x height` grid. Zero dimensions are
    /// clamped to 1, matching [`crate::grid::Grid::new`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let len = (width * height) as usize;
        Self {
            width,
            height,
            revealed: vec![false; len],
            visible: vec![false; len],
        }
    }

    /// Mask width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    const fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: GridPos) -> usize {
        (pos.y as u32 * self.width + pos.x as u32) as usize
    }

    /// Whether the cell has ever been seen. Out of bounds is never revealed.
    #[must_use]
    pub fn is_revealed(&self, pos: GridPos) -> bool {
        self.contains(pos) && self.revealed[self.index(pos)]
    }

    /// Whether the cell is in some player unit's sight right now.
    #[must_use]
    pub fn is_visible(&self, pos: GridPos) -> bool {
        self.contains(pos) && self.visible[self.index(pos)]
    }

    /// Reveal a single cell (revealed and visible). Returns `true` only if
    /// the cell was hidden before, so callers can emit reveal events once.
    pub fn reveal_cell(&mut self, pos: GridPos) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.visible[idx] = true;
        let newly = !self.revealed[idx];
        self.revealed[idx] = true;
        newly
    }

    /// Reveal every cell within Euclidean `radius` (in cells) of `center`.
    /// Returns the newly revealed cells in row-major order.
    pub fn reveal_radius(&mut self, center: GridPos, radius: Fixed) -> Vec<GridPos> {
        let mut newly = Vec::new();
        if radius < Fixed::ZERO {
            return newly;
        }
        let radius_sq = radius * radius;
        let reach = radius.ceil().to_num::<i32>();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if Fixed::from_num(dx * dx + dy * dy) > radius_sq {
                    continue;
                }
                let pos = center.offset(dx, dy);
                if self.reveal_cell(pos) {
                    newly.push(pos);
                }
            }
        }
        newly
    }

    /// Recompute visibility from current player-unit positions.
    ///
    /// Clears the visible mask, then reveals around every `(cell, radius)`
    /// pair. Returns cells newly revealed by this pass so the caller can
    /// emit events; the monotonic mask keeps everything seen earlier.
    pub fn update_vision(&mut self, sights: &[(GridPos, Fixed)]) -> Vec<GridPos> {
        self.visible.fill(false);
        let mut newly = Vec::new();
        for &(pos, radius) in sights {
            newly.extend(self.reveal_radius(pos, radius));
        }
        newly
    }

    /// Number of revealed cells.
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    /// Resize alongside the grid, shifting surviving bits by the same
    /// centered `offset` the grid applied. Cells scrolled into the new
    /// bounds start hidden.
    pub fn resize(&mut self, new_width: u32, new_height: u32, offset: (i32, i32)) {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        let len = (new_width * new_height) as usize;
        let mut revealed = vec![false; len];
        let mut visible = vec![false; len];
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let old_idx = self.index(GridPos::new(x, y));
                if !self.revealed[old_idx] && !self.visible[old_idx] {
                    continue;
                }
                let nx = x + offset.0;
                let ny = y + offset.1;
                if nx < 0 || ny < 0 || nx as u32 >= new_width || ny as u32 >= new_height {
                    continue;
                }
                let new_idx = (ny as u32 * new_width + nx as u32) as usize;
                revealed[new_idx] = self.revealed[old_idx];
                visible[new_idx] = self.visible[old_idx];
            }
        }
        self.width = new_width;
        self.height = new_height;
        self.revealed = revealed;
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_fully_hidden() {
        let fog = FogGrid::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                assert!(!fog.is_revealed(GridPos::new(x, y)));
                assert!(!fog.is_visible(GridPos::new(x, y)));
            }
        }
        assert_eq!(fog.revealed_count(), 0);
    }

    #[test]
    fn test_reveal_cell_reports_first_reveal_only() {
        let mut fog = FogGrid::new(4, 4);
        assert!(fog.reveal_cell(GridPos::new(1, 1)));
        assert!(!fog.reveal_cell(GridPos::new(1, 1)));
        assert!(fog.is_revealed(GridPos::new(1, 1)));
        assert!(fog.is_visible(GridPos::new(1, 1)));
        // Out of bounds is a no-op
        assert!(!fog.reveal_cell(GridPos::new(-1, 0)));
        assert!(!fog.reveal_cell(GridPos::new(4, 0)));
    }

    #[test]
    fn test_radius_one_is_a_plus_shape() {
        let mut fog = FogGrid::new(5, 5);
        let newly = fog.reveal_radius(GridPos::new(2, 2), Fixed::from_num(1));
        assert_eq!(newly.len(), 5);
        for pos in [
            GridPos::new(2, 2),
            GridPos::new(1, 2),
            GridPos::new(3, 2),
            GridPos::new(2, 1),
            GridPos::new(2, 3),
        ] {
            assert!(fog.is_revealed(pos));
        }
        // Diagonals are at distance sqrt(2) > 1
        assert!(!fog.is_revealed(GridPos::new(1, 1)));
        assert!(!fog.is_revealed(GridPos::new(3, 3)));
    }

    #[test]
    fn test_fractional_radius_covers_diagonals() {
        let mut fog = FogGrid::new(5, 5);
        // 1.5^2 = 2.25 covers the (1,1) diagonal at distance^2 = 2
        let _ = fog.reveal_radius(GridPos::new(2, 2), Fixed::from_num(1.5));
        assert!(fog.is_revealed(GridPos::new(1, 1)));
        assert!(fog.is_revealed(GridPos::new(3, 3)));
        assert!(!fog.is_revealed(GridPos::new(0, 2)));
    }

    #[test]
    fn test_radius_clips_at_edges() {
        let mut fog = FogGrid::new(3, 3);
        let newly = fog.reveal_radius(GridPos::new(0, 0), Fixed::from_num(1));
        // (0,-1) and (-1,0) fall outside and are skipped
        assert_eq!(newly.len(), 3);
        assert!(fog.is_revealed(GridPos::new(0, 0)));
        assert!(fog.is_revealed(GridPos::new(1, 0)));
        assert!(fog.is_revealed(GridPos::new(0, 1)));
    }

    #[test]
    fn test_revealed_is_monotonic_across_vision_updates() {
        let mut fog = FogGrid::new(6, 6);
        let _ = fog.update_vision(&[(GridPos::new(1, 1), Fixed::from_num(1))]);
        assert!(fog.is_revealed(GridPos::new(1, 1)));
        assert!(fog.is_visible(GridPos::new(1, 1)));

        // The unit moved away; the old cell stays revealed but goes dark
        let _ = fog.update_vision(&[(GridPos::new(4, 4), Fixed::from_num(1))]);
        assert!(fog.is_revealed(GridPos::new(1, 1)));
        assert!(!fog.is_visible(GridPos::new(1, 1)));
        assert!(fog.is_visible(GridPos::new(4, 4)));

        // No units at all: nothing visible, everything seen stays revealed
        let newly = fog.update_vision(&[]);
        assert!(newly.is_empty());
        assert!(fog.is_revealed(GridPos::new(4, 4)));
        assert!(!fog.is_visible(GridPos::new(4, 4)));
    }

    #[test]
    fn test_update_vision_reports_only_new_cells() {
        let mut fog = FogGrid::new(6, 6);
        let first = fog.update_vision(&[(GridPos::new(2, 2), Fixed::from_num(1))]);
        assert_eq!(first.len(), 5);
        let second = fog.update_vision(&[(GridPos::new(2, 3), Fixed::from_num(1))]);
        // Overlap with the first pass is not re-reported
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_resize_shifts_revealed_mask() {
        let mut fog = FogGrid::new(4, 4);
        assert!(fog.reveal_cell(GridPos::new(3, 3)));
        fog.resize(6, 6, (1, 1));
        assert!(fog.is_revealed(GridPos::new(4, 4)));
        assert!(!fog.is_revealed(GridPos::new(3, 3)));
        assert_eq!(fog.revealed_count(), 1);

        // Shrinking drops bits that fall outside; survivors keep their state
        let mut fog = FogGrid::new(4, 4);
        assert!(fog.reveal_cell(GridPos::new(0, 0)));
        assert!(fog.reveal_cell(GridPos::new(2, 2)));
        fog.resize(2, 2, (-1, -1));
        assert_eq!(fog.revealed_count(), 1);
        assert!(fog.is_revealed(GridPos::new(1, 1)));
    }
}
