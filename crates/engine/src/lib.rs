pub use branches::Branch;
pub use breakdown::{Denomination, DenominationBreakdown, ServiceAmount, ServiceBalance, ServiceBalances};
pub use cajas::{Caja, CajaStatus};
pub use cases::Case;
pub use cash_operations::{CashOperation, OperationKind, Person, ReceptionStatus};
pub use catalog::{BusinessType, MovementKey, Operator, RECEIPT_TARGETS, ReceiptTarget, Service};
pub use commands::{
    CloseCajaCmd, NewCashOperationCmd, OpenCajaCmd, RecordMovementsCmd, WithdrawalSelection,
};
pub use currency::Currency;
pub use error::EngineError;
pub use ledger_entries::LedgerEntry;
pub use money::CurrencyTotals;
pub use movements::{MovementEntry, MovementLine, MovementMatrix};
pub use ops::{CajaMovements, ClosingData, Engine, EngineBuilder};
pub use receipts::ReceiptMap;
pub use storage::{DiskStorage, ReceiptStorage, StoredFile, Upload};
pub use withdrawals::{WithdrawalGroup, group_withdrawals};

mod branches;
mod breakdown;
mod cajas;
mod cases;
mod cash_operations;
mod catalog;
mod commands;
mod currency;
mod error;
mod ledger_entries;
pub mod money;
mod movements;
mod ops;
mod receipts;
pub mod storage;
mod withdrawals;

type ResultEngine<T> = Result<T, EngineError>;
