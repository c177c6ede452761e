//! Ledger entries.
//!
//! `linked_appointment_id` is deliberately neither unique nor a foreign key:
//! several entries may reference one appointment, and entries outlive a hard
//! deleted appointment.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    Kind,
    Category,
    Description,
    AmountMinor,
    Date,
    LinkedAppointmentId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Kind)
                            .string()
                            .not_null()
                            .check(Expr::col(LedgerEntries::Kind).is_in(["revenue", "expense"])),
                    )
                    .col(ColumnDef::new(LedgerEntries::Category).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LedgerEntries::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(LedgerEntries::Date).date().not_null())
                    .col(ColumnDef::new(LedgerEntries::LinkedAppointmentId).string())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-date")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-linked_appointment_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::LinkedAppointmentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        Ok(())
    }
}
