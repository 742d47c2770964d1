//! Deck draws: escalating cost, weighted rarity, bounded hand.
//!
//! Drawing buys a random unit kind into the hand. The price climbs with
//! every draw taken; an optional cooldown discount walks it back toward the
//! base over elapsed ticks. A draw is atomic: affordability and hand space
//! are checked before anything mutates, so a refused draw has no side
//! effect at all.
//!
//! # Determinism
//!
//! Sampling consumes exactly one value from the session RNG per draw, via
//! a cumulative walk over the declared table order.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::TokenLedger;
use crate::entities::UnitKindId;
use crate::error::{GameError, Result};

/// Rarity weights must sum to exactly this.
pub const TOTAL_WEIGHT: u32 = 100;

/// One draw-pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityEntry {
    /// Roster entry this weight belongs to.
    pub kind: UnitKindId,
    /// Percentage weight; zero means never drawn.
    pub weight: u32,
}

/// Weighted draw pool over the player roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityTable {
    entries: Vec<RarityEntry>,
}

impl RarityTable {
    /// Build a table, rejecting weights that do not sum to
    /// [`TOTAL_WEIGHT`].
    pub fn new(entries: Vec<RarityEntry>) -> Result<Self> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// Re-check the weight-sum invariant, for tables that arrived through
    /// deserialization instead of [`RarityTable::new`].
    pub fn validate(&self) -> Result<()> {
        let total: u32 = self.entries.iter().map(|e| e.weight).sum();
        if total == TOTAL_WEIGHT {
            Ok(())
        } else {
            Err(GameError::RarityWeights { total })
        }
    }

    /// The declared entries, in draw-resolution order.
    #[must_use]
    pub fn entries(&self) -> &[RarityEntry] {
        &self.entries
    }

    /// Sample one kind: `r` in `[0, 100)`, first entry whose cumulative
    /// weight exceeds it.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> UnitKindId {
        let r = rng.gen_range(0..TOTAL_WEIGHT);
        let mut cumulative = 0;
        for entry in &self.entries {
            cumulative += entry.weight;
            if r < cumulative {
                return entry.kind;
            }
        }
        // Unreachable for a validated table: the weights cover all of [0, 100)
        self.entries.last().map_or(UnitKindId(0), |e| e.kind)
    }
}

/// Optional cooldown discount: the draw price drifts back toward the base
/// while the player sits on their tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawDiscount {
    /// Ticks elapsed since the last draw per discount step.
    pub every_ticks: u64,
    /// Cost reduction per step.
    pub amount: u32,
}

/// Draw pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPolicy {
    /// Price of the first draw, and the floor any discount stops at.
    pub base_cost: u32,
    /// Price growth per draw taken.
    pub cost_increment: u32,
    /// Optional cooldown discount.
    #[serde(default)]
    pub discount: Option<DrawDiscount>,
}

impl DrawPolicy {
    /// Price of the next draw after `draws` taken, with `ticks_since` ticks
    /// elapsed since the most recent one.
    #[must_use]
    pub fn cost_at(&self, draws: u32, ticks_since: u64) -> u32 {
        let nominal = self.base_cost.saturating_add(self.cost_increment.saturating_mul(draws));
        match self.discount {
            Some(d) if d.every_ticks > 0 => {
                let steps = u32::try_from(ticks_since / d.every_ticks).unwrap_or(u32::MAX);
                let cut = steps.saturating_mul(d.amount);
                nominal.saturating_sub(cut).max(self.base_cost)
            }
            _ => nominal,
        }
    }
}

/// Bounded slots holding drawn-but-undeployed unit kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    slots: Vec<UnitKindId>,
    capacity: usize,
}

impl Hand {
    /// Empty hand. Zero capacity is clamped to one slot.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Maximum slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied slots in draw order.
    #[must_use]
    pub fn slots(&self) -> &[UnitKindId] {
        &self.slots
    }

    /// Kind held in `slot`, if occupied.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<UnitKindId> {
        self.slots.get(slot).copied()
    }

    /// Whether no slots are occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Occupied slot count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, kind: UnitKindId) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots.push(kind);
        true
    }

    /// Take the kind out of `slot`, shifting later slots down.
    pub fn take(&mut self, slot: usize) -> Option<UnitKindId> {
        if slot < self.slots.len() {
            Some(self.slots.remove(slot))
        } else {
            None
        }
    }
}

/// Why a draw was refused. No state changes on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    /// The current price exceeds the balance.
    #[error("insufficient tokens: draw costs {required}, have {available}")]
    InsufficientTokens {
        /// Price of this draw.
        required: u32,
        /// Balance at refusal time.
        available: u32,
    },

    /// Every hand slot is occupied.
    #[error("hand is full ({capacity} slots)")]
    HandFull {
        /// Configured hand capacity.
        capacity: usize,
    },
}

/// Draw state: pricing, pool, hand, and the running draw count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    policy: DrawPolicy,
    table: RarityTable,
    hand: Hand,
    draws: u32,
    last_draw_tick: Option<u64>,
}

impl Deck {
    /// Fresh deck: no draws taken, empty hand.
    #[must_use]
    pub fn new(policy: DrawPolicy, table: RarityTable, hand_capacity: usize) -> Self {
        Self {
            policy,
            table,
            hand: Hand::new(hand_capacity),
            draws: 0,
            last_draw_tick: None,
        }
    }

    /// The hand.
    #[must_use]
    pub const fn hand(&self) -> &Hand {
        &self.hand
    }

    /// Draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> u32 {
        self.draws
    }

    /// The draw pool.
    #[must_use]
    pub const fn table(&self) -> &RarityTable {
        &self.table
    }

    /// Price of the next draw at the given tick count.
    #[must_use]
    pub fn current_cost(&self, tick: u64) -> u32 {
        let ticks_since = self.last_draw_tick.map_or(0, |last| tick.saturating_sub(last));
        self.policy.cost_at(self.draws, ticks_since)
    }

    /// Buy one draw: check hand space and price, spend, sample, add to the
    /// hand. Atomic; on `Err` nothing has changed.
    pub fn draw<R: Rng>(
        &mut self,
        ledger: &mut TokenLedger,
        rng: &mut R,
        tick: u64,
    ) -> std::result::Result<(UnitKindId, u32), DrawError> {
        if self.hand.is_full() {
            return Err(DrawError::HandFull {
                capacity: self.hand.capacity(),
            });
        }
        let cost = self.current_cost(tick);
        if !ledger.spend(cost) {
            return Err(DrawError::InsufficientTokens {
                required: cost,
                available: ledger.balance(),
            });
        }
        self.draws += 1;
        self.last_draw_tick = Some(tick);
        let kind = self.table.sample(rng);
        let pushed = self.hand.push(kind);
        debug_assert!(pushed);
        Ok((kind, cost))
    }

    /// Take a kind out of the hand for deployment.
    pub fn take_from_hand(&mut self, slot: usize) -> Option<UnitKindId> {
        self.hand.take(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn table_60_30_10() -> RarityTable {
        RarityTable::new(vec![
            RarityEntry { kind: UnitKindId(0), weight: 60 },
            RarityEntry { kind: UnitKindId(1), weight: 30 },
            RarityEntry { kind: UnitKindId(2), weight: 10 },
        ])
        .unwrap()
    }

    fn policy_6_1() -> DrawPolicy {
        DrawPolicy {
            base_cost: 6,
            cost_increment: 1,
            discount: None,
        }
    }

    #[test]
    fn test_weights_must_sum_to_100() {
        let err = RarityTable::new(vec![
            RarityEntry { kind: UnitKindId(0), weight: 60 },
            RarityEntry { kind: UnitKindId(1), weight: 30 },
        ])
        .unwrap_err();
        assert!(matches!(err, GameError::RarityWeights { total: 90 }));
        assert!(table_60_30_10().validate().is_ok());
    }

    #[test]
    fn test_draw_cost_escalates() {
        let mut deck = Deck::new(policy_6_1(), table_60_30_10(), 8);
        let mut ledger = TokenLedger::new(100);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut costs = Vec::new();
        for _ in 0..4 {
            let (_, cost) = deck.draw(&mut ledger, &mut rng, 0).unwrap();
            costs.push(cost);
        }
        assert_eq!(costs, vec![6, 7, 8, 9]);
        assert_eq!(ledger.balance(), 100 - 6 - 7 - 8 - 9);
    }

    #[test]
    fn test_refused_draw_has_no_side_effect() {
        let mut deck = Deck::new(policy_6_1(), table_60_30_10(), 8);
        let mut ledger = TokenLedger::new(5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let err = deck.draw(&mut ledger, &mut rng, 0).unwrap_err();
        assert_eq!(
            err,
            DrawError::InsufficientTokens {
                required: 6,
                available: 5
            }
        );
        assert_eq!(ledger.balance(), 5);
        assert_eq!(deck.draws(), 0);
        assert!(deck.hand().is_empty());
        // Cost did not escalate on the failed attempt
        assert_eq!(deck.current_cost(0), 6);
    }

    #[test]
    fn test_full_hand_refuses_before_spending() {
        let mut deck = Deck::new(policy_6_1(), table_60_30_10(), 2);
        let mut ledger = TokenLedger::new(100);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(deck.draw(&mut ledger, &mut rng, 0).is_ok());
        assert!(deck.draw(&mut ledger, &mut rng, 0).is_ok());
        let balance_before = ledger.balance();
        let err = deck.draw(&mut ledger, &mut rng, 0).unwrap_err();
        assert_eq!(err, DrawError::HandFull { capacity: 2 });
        assert_eq!(ledger.balance(), balance_before);
        assert_eq!(deck.draws(), 2);
    }

    #[test]
    fn test_cooldown_discount_floors_at_base() {
        let policy = DrawPolicy {
            base_cost: 6,
            cost_increment: 2,
            discount: Some(DrawDiscount {
                every_ticks: 10,
                amount: 1,
            }),
        };
        let mut deck = Deck::new(policy, table_60_30_10(), 8);
        let mut ledger = TokenLedger::new(1000);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..3 {
            let _ = deck.draw(&mut ledger, &mut rng, 100).unwrap();
        }
        // Nominal price is 6 + 2*3 = 12 right after the third draw
        assert_eq!(deck.current_cost(100), 12);
        // 20 ticks later: two discount steps
        assert_eq!(deck.current_cost(120), 10);
        // Arbitrarily long waits never undercut the base
        assert_eq!(deck.current_cost(10_000), 6);
    }

    #[test]
    fn test_take_from_hand_shifts_slots() {
        let mut deck = Deck::new(policy_6_1(), table_60_30_10(), 4);
        let mut ledger = TokenLedger::new(100);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let (first, _) = deck.draw(&mut ledger, &mut rng, 0).unwrap();
        let (second, _) = deck.draw(&mut ledger, &mut rng, 0).unwrap();
        assert_eq!(deck.hand().len(), 2);
        assert_eq!(deck.take_from_hand(0), Some(first));
        assert_eq!(deck.hand().get(0), Some(second));
        assert_eq!(deck.take_from_hand(5), None);
    }

    #[test]
    fn test_sample_distribution_matches_weights() {
        let table = table_60_30_10();
        let mut rng = ChaCha8Rng::seed_from_u64(0xDECC);
        let mut counts = [0u32; 3];
        let total = 100_000;
        for _ in 0..total {
            counts[table.sample(&mut rng).0 as usize] += 1;
        }
        // Within two percentage points of the declared 60/30/10
        let tolerance = total * 2 / 100;
        for (count, expected) in counts.iter().zip([60_000u32, 30_000, 10_000]) {
            let diff = count.abs_diff(expected);
            assert!(
                diff <= tolerance,
                "distribution off: counts {counts:?}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn test_sample_is_deterministic_for_a_seed() {
        let table = table_60_30_10();
        let draw = |seed: u64| -> Vec<UnitKindId> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..32).map(|_| table.sample(&mut rng)).collect()
        };
        assert_eq!(draw(99), draw(99));
        assert_ne!(draw(99), draw(100));
    }
}
