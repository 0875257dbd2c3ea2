//! Command structs for engine operations.
//!
//! These types group parameters for write operations (open, close, movement
//! submission, cash operations), keeping call sites readable and avoiding
//! long argument lists.

use crate::{
    CurrencyTotals, DenominationBreakdown, MovementMatrix, Person, ServiceBalance,
    ServiceBalances,
};

/// Open a register on a case.
#[derive(Clone, Debug)]
pub struct OpenCajaCmd {
    pub branch_id: i32,
    pub user_id: i32,
    pub case_id: i32,
    pub breakdown: DenominationBreakdown,
    pub services: ServiceBalances,
}

impl OpenCajaCmd {
    #[must_use]
    pub fn new(branch_id: i32, user_id: i32, case_id: i32, breakdown: DenominationBreakdown) -> Self {
        Self {
            branch_id,
            user_id,
            case_id,
            breakdown,
            services: ServiceBalances::default(),
        }
    }

    #[must_use]
    pub fn services(mut self, services: ServiceBalances) -> Self {
        self.services = services;
        self
    }
}

/// Close an open register with the final count.
#[derive(Clone, Debug)]
pub struct CloseCajaCmd {
    pub caja_id: i32,
    pub breakdown: DenominationBreakdown,
    pub services: Vec<ServiceBalance>,
}

impl CloseCajaCmd {
    #[must_use]
    pub fn new(caja_id: i32, breakdown: DenominationBreakdown) -> Self {
        Self {
            caja_id,
            breakdown,
            services: Vec::new(),
        }
    }

    #[must_use]
    pub fn services(mut self, services: Vec<ServiceBalance>) -> Self {
        self.services = services;
        self
    }
}

/// Submit service movements for a register.
#[derive(Clone, Debug)]
pub struct RecordMovementsCmd {
    pub caja_id: i32,
    pub movements: MovementMatrix,
    /// Replace every ledger row of the register instead of appending.
    pub replace_all: bool,
}

impl RecordMovementsCmd {
    #[must_use]
    pub fn new(caja_id: i32, movements: MovementMatrix) -> Self {
        Self {
            caja_id,
            movements,
            replace_all: false,
        }
    }

    #[must_use]
    pub fn replace_all(mut self, replace_all: bool) -> Self {
        self.replace_all = replace_all;
        self
    }
}

/// Take cash out of, or put cash into, a register.
#[derive(Clone, Debug)]
pub struct NewCashOperationCmd {
    pub caja_id: i32,
    pub person: Person,
    pub amounts: CurrencyTotals,
    pub observation: String,
}

impl NewCashOperationCmd {
    #[must_use]
    pub fn new(caja_id: i32, person: Person, amounts: CurrencyTotals) -> Self {
        Self {
            caja_id,
            person,
            amounts,
            observation: String::new(),
        }
    }

    #[must_use]
    pub fn observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = observation.into();
        self
    }
}

/// Rows targeted by a withdrawal deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WithdrawalSelection {
    /// One row, which must be a withdrawal.
    Single(i32),
    /// A whole logical withdrawal, all rows of one register.
    Many(Vec<i32>),
}
