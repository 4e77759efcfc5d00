//! Transaction domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::FREE_CASH_TICKER;
use crate::errors::CalculatorError;

pub const TRANSACTION_TYPE_BUY: &str = "Buy";
pub const TRANSACTION_TYPE_SELL: &str = "Sell";

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> Decimal {
        match self {
            TransactionType::Buy => Decimal::ONE,
            TransactionType::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = CalculatorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case(TRANSACTION_TYPE_BUY) => Ok(TransactionType::Buy),
            s if s.eq_ignore_ascii_case(TRANSACTION_TYPE_SELL) => Ok(TransactionType::Sell),
            other => Err(CalculatorError::UnsupportedTransactionType(other.to_string())),
        }
    }
}

/// One immutable ledger entry. Entries on the same date are ordered by `sequence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: NaiveDate,
    pub ticker: String,
    pub quantity: Decimal,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub sequence: i64,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        ticker: &str,
        quantity: Decimal,
        transaction_type: TransactionType,
        sequence: i64,
    ) -> Self {
        Self {
            date,
            ticker: ticker.to_string(),
            quantity,
            transaction_type,
            sequence,
        }
    }

    pub fn buy(date: NaiveDate, ticker: &str, quantity: Decimal) -> Self {
        Self::new(date, ticker, quantity, TransactionType::Buy, 0)
    }

    pub fn sell(date: NaiveDate, ticker: &str, quantity: Decimal) -> Self {
        Self::new(date, ticker, quantity, TransactionType::Sell, 0)
    }

    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Quantity with the sign of the transaction direction applied.
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity * self.transaction_type.sign()
    }

    pub fn is_cash(&self) -> bool {
        is_cash_ticker(&self.ticker)
    }

    /// Replay order key.
    pub fn replay_key(&self) -> (NaiveDate, i64) {
        (self.date, self.sequence)
    }
}

/// True for the synthetic cash ticker, whatever its casing.
pub fn is_cash_ticker(ticker: &str) -> bool {
    ticker.trim().eq_ignore_ascii_case(FREE_CASH_TICKER)
}
