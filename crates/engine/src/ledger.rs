//! Ledger entries: revenue and expense records, optionally linked to an
//! appointment.
//!
//! Bounds are checked once, when an entry is created: the amount must be
//! positive and the date must fall in `[today - 1 year, today]`. Stored
//! entries are never re-validated.

use chrono::{DateTime, Months, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{normalize_category_key, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Revenue,
    Expense,
}

impl LedgerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Category vocabulary callers are expected to pick from.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Revenue => &["service", "product", "other"],
            Self::Expense => &[
                "rent",
                "salaries",
                "supplies",
                "equipment",
                "marketing",
                "utilities",
                "taxes",
                "other",
            ],
        }
    }

    /// Whether `category`, once normalized, belongs to this kind's vocabulary.
    #[must_use]
    pub fn allows_category(self, category: &str) -> bool {
        normalize_category_key(category)
            .is_ok_and(|key| self.categories().contains(&key.as_str()))
    }
}

impl TryFrom<&str> for LedgerKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidId(format!("invalid ledger kind: {other}"))),
        }
    }
}

/// Oldest date an entry created on `today` may carry.
#[must_use]
pub fn earliest_entry_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: LedgerKind,
    pub category: String,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    /// Not unique: several entries may point at the same appointment.
    pub linked_appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        kind: LedgerKind,
        category: String,
        description: String,
        amount: Money,
        date: NaiveDate,
        linked_appointment_id: Option<Uuid>,
        today: NaiveDate,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::OutOfRange("amount must be > 0".to_string()));
        }
        let earliest = earliest_entry_date(today);
        if date < earliest {
            return Err(EngineError::OutOfRange(format!(
                "date {date} is older than {earliest}"
            )));
        }
        if date > today {
            return Err(EngineError::OutOfRange(format!(
                "date {date} is in the future"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            category,
            description,
            amount,
            date,
            linked_appointment_id,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub category: String,
    pub description: String,
    pub amount_minor: i64,
    pub date: Date,
    pub linked_appointment_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            category: ActiveValue::Set(entry.category.clone()),
            description: ActiveValue::Set(entry.description.clone()),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
            date: ActiveValue::Set(entry.date),
            linked_appointment_id: ActiveValue::Set(
                entry.linked_appointment_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ledger entry")?,
            kind: LedgerKind::try_from(model.kind.as_str())?,
            category: model.category,
            description: model.description,
            amount: Money::new(model.amount_minor),
            date: model.date,
            linked_appointment_id: model
                .linked_appointment_id
                .as_deref()
                .map(|id| parse_uuid(id, "appointment"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(amount: Money, date: NaiveDate, today: NaiveDate) -> ResultEngine<LedgerEntry> {
        LedgerEntry::new(
            LedgerKind::Revenue,
            "service".to_string(),
            "cut".to_string(),
            amount,
            date,
            None,
            today,
        )
    }

    #[test]
    fn amount_must_be_positive() {
        let today = day(2024, 3, 10);
        assert!(matches!(
            entry(Money::ZERO, today, today),
            Err(EngineError::OutOfRange(_))
        ));
        assert!(matches!(
            entry(Money::new(-100), today, today),
            Err(EngineError::OutOfRange(_))
        ));
        assert!(entry(Money::new(1), today, today).is_ok());
    }

    #[test]
    fn date_window_is_one_year_back_through_today() {
        let today = day(2024, 3, 10);
        assert!(entry(Money::new(100), day(2023, 3, 10), today).is_ok());
        assert!(entry(Money::new(100), day(2023, 3, 9), today).is_err());
        assert!(entry(Money::new(100), day(2024, 3, 11), today).is_err());
    }

    #[test]
    fn leap_day_window_clamps_to_month_end() {
        assert_eq!(earliest_entry_date(day(2024, 2, 29)), day(2023, 2, 28));
    }

    #[test]
    fn vocabulary_is_per_kind() {
        assert!(LedgerKind::Revenue.allows_category("service"));
        assert!(!LedgerKind::Revenue.allows_category("rent"));
        assert!(LedgerKind::Expense.allows_category("rent"));
        assert!(LedgerKind::Expense.allows_category("other"));
        assert!(LedgerKind::Expense.allows_category("  Rent "));
    }
}
