//! Initial schema migration - creates all tables from scratch.
//!
//! - `branches`: branches ("sucursales") registers are opened in
//! - `cases`: physical cash cases ("maletines") of a branch
//! - `cajas`: register sessions, flat totals plus JSON breakdowns
//! - `movements`: per-operator, per-service ledger rows
//! - `cash_operations`: per-currency withdrawal and ingress rows
//! - `ledger_entries`: general-ledger bookings of received withdrawals
//!
//! Amounts are canonical decimal text, structured fields are JSON text.

use sea_orm_migration::{prelude::*, sea_orm::ConnectionTrait};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Branches {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Cases {
    Table,
    Id,
    BranchId,
    Code,
}

#[derive(Iden)]
enum Cajas {
    Table,
    Id,
    BranchId,
    UserId,
    CaseId,
    Status,
    OpenedAt,
    ClosedAt,
    InitialPyg,
    InitialBrl,
    InitialUsd,
    FinalPyg,
    FinalBrl,
    FinalUsd,
    InitialBreakdown,
    FinalBreakdown,
    InitialServices,
    FinalServices,
    Receipts,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    CajaId,
    OperatorName,
    ServiceName,
    Amount,
    ReceiptPath,
    CreatedAt,
}

#[derive(Iden)]
enum CashOperations {
    Table,
    Id,
    CajaId,
    Kind,
    PersonId,
    PersonName,
    PersonDocument,
    Currency,
    Amount,
    Observation,
    ReceptionStatus,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    CajaId,
    WithdrawalId,
    Currency,
    Amount,
    Concept,
    BookedAt,
}

/// At most one open register per case.
const OPEN_CAJA_PER_CASE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     \"idx-cajas-case_id-open-unique\" ON \"cajas\" (\"case_id\") WHERE \"status\" = 'open'";

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Branches and cases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Branches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Branches::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cases::BranchId).integer().not_null())
                    .col(ColumnDef::new(Cases::Code).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cases-branch_id")
                            .from(Cases::Table, Cases::BranchId)
                            .to(Branches::Table, Branches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Cajas
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cajas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cajas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cajas::BranchId).integer().not_null())
                    .col(ColumnDef::new(Cajas::UserId).integer().not_null())
                    .col(ColumnDef::new(Cajas::CaseId).integer().not_null())
                    .col(
                        ColumnDef::new(Cajas::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Cajas::OpenedAt).timestamp().not_null())
                    .col(ColumnDef::new(Cajas::ClosedAt).timestamp())
                    .col(ColumnDef::new(Cajas::InitialPyg).string().not_null().default("0"))
                    .col(ColumnDef::new(Cajas::InitialBrl).string().not_null().default("0"))
                    .col(ColumnDef::new(Cajas::InitialUsd).string().not_null().default("0"))
                    .col(ColumnDef::new(Cajas::FinalPyg).string())
                    .col(ColumnDef::new(Cajas::FinalBrl).string())
                    .col(ColumnDef::new(Cajas::FinalUsd).string())
                    .col(ColumnDef::new(Cajas::InitialBreakdown).text())
                    .col(ColumnDef::new(Cajas::FinalBreakdown).text())
                    .col(ColumnDef::new(Cajas::InitialServices).text())
                    .col(ColumnDef::new(Cajas::FinalServices).text())
                    .col(ColumnDef::new(Cajas::Receipts).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cajas-case_id")
                            .from(Cajas::Table, Cajas::CaseId)
                            .to(Cases::Table, Cases::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(OPEN_CAJA_PER_CASE)
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cajas-case_id")
                    .table(Cajas::Table)
                    .col(Cajas::CaseId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::CajaId).integer().not_null())
                    .col(ColumnDef::new(Movements::OperatorName).string().not_null())
                    .col(ColumnDef::new(Movements::ServiceName).string().not_null())
                    .col(ColumnDef::new(Movements::Amount).string().not_null())
                    .col(ColumnDef::new(Movements::ReceiptPath).string())
                    .col(ColumnDef::new(Movements::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-caja_id")
                            .from(Movements::Table, Movements::CajaId)
                            .to(Cajas::Table, Cajas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup key of receipt upserts, not unique.
        manager
            .create_index(
                Index::create()
                    .name("idx-movements-caja_id-operator-service")
                    .table(Movements::Table)
                    .col(Movements::CajaId)
                    .col(Movements::OperatorName)
                    .col(Movements::ServiceName)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Cash operations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashOperations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashOperations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashOperations::CajaId).integer().not_null())
                    .col(
                        ColumnDef::new(CashOperations::Kind)
                            .string()
                            .not_null()
                            .default("egress"),
                    )
                    .col(ColumnDef::new(CashOperations::PersonId).integer())
                    .col(ColumnDef::new(CashOperations::PersonName).string().not_null())
                    .col(ColumnDef::new(CashOperations::PersonDocument).string())
                    .col(ColumnDef::new(CashOperations::Currency).string().not_null())
                    .col(ColumnDef::new(CashOperations::Amount).string().not_null())
                    .col(
                        ColumnDef::new(CashOperations::Observation)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CashOperations::ReceptionStatus)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(CashOperations::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_operations-caja_id")
                            .from(CashOperations::Table, CashOperations::CajaId)
                            .to(Cajas::Table, Cajas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_operations-caja_id-kind")
                    .table(CashOperations::Table)
                    .col(CashOperations::CajaId)
                    .col(CashOperations::Kind)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::CajaId).integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::WithdrawalId).integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::Currency).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Amount).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Concept).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::BookedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-withdrawal_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WithdrawalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashOperations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cajas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Branches::Table).to_owned())
            .await?;
        Ok(())
    }
}
