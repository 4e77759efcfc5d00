//! Transactions module - ledger entries and the ledger provider trait.

mod transactions_model;
mod transactions_traits;


pub use transactions_model::{
    is_cash_ticker, Transaction, TransactionType, TRANSACTION_TYPE_BUY, TRANSACTION_TYPE_SELL,
};
pub use transactions_traits::TransactionLedgerTrait;
