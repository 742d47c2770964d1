//! Token economy.
//!
//! A single non-negative balance. Tokens enter through mining hits, kill
//! rewards and resource bonuses, and leave through deck draws and unit
//! deployment. Every mutation goes through [`TokenLedger::add`] /
//! [`TokenLedger::spend`]; a failed spend changes nothing.

use serde::{Deserialize, Serialize};

/// The player's token balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenLedger {
    balance: u32,
}

impl TokenLedger {
    /// Ledger opened with a starting balance.
    #[must_use]
    pub const fn new(starting: u32) -> Self {
        Self { balance: starting }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Whether `cost` could be spent right now.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.balance >= cost
    }

    /// Credit tokens, returning the new balance. Adding zero is a no-op;
    /// callers only raise a balance-changed event for a positive amount.
    pub fn add(&mut self, amount: u32) -> u32 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }

    /// Debit tokens. Returns `false` and leaves the balance untouched if
    /// there are not enough.
    pub fn spend(&mut self, amount: u32) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }
}
