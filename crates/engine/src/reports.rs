//! Financial summaries over ledger entries, and staff commissions over
//! completed appointments.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Appointment, AppointmentStatus, EngineError, LedgerEntry, LedgerKind, Money, ResultEngine,
    Staff,
};

/// Inclusive calendar range `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if start > end {
            return Err(EngineError::OutOfRange(format!(
                "range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// First day of `today`'s month through `today`.
    #[must_use]
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        }
    }

    /// Builds a range from optional bounds, falling back to month-to-date
    /// for any missing bound and for an inverted range.
    #[must_use]
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let default = Self::month_to_date(today);
        let start = start.unwrap_or(default.start);
        let end = end.unwrap_or(default.end);
        Self::new(start, end).unwrap_or_else(|_| {
            tracing::debug!("inverted range {start}..{end}, using month to date");
            default
        })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    pub entries: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub range: DateRange,
    pub total_revenue: Money,
    pub total_expense: Money,
    /// `total_revenue - total_expense`; may be negative.
    pub balance: Money,
    pub revenue_by_category: Vec<CategoryTotal>,
    pub expense_by_category: Vec<CategoryTotal>,
}

fn sorted_breakdown(groups: BTreeMap<&str, (Money, usize)>) -> Vec<CategoryTotal> {
    let mut rows: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (total, entries))| CategoryTotal {
            category: category.to_string(),
            total,
            entries,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    rows
}

/// Aggregates the entries dated inside `range`.
///
/// Each entry lands in exactly one `(kind, category)` group. Groups are
/// ordered by descending total, ties by category name.
#[must_use]
pub fn summarize(entries: &[LedgerEntry], range: &DateRange) -> FinancialSummary {
    let mut revenue: BTreeMap<&str, (Money, usize)> = BTreeMap::new();
    let mut expense: BTreeMap<&str, (Money, usize)> = BTreeMap::new();
    let mut total_revenue = Money::ZERO;
    let mut total_expense = Money::ZERO;

    for entry in entries.iter().filter(|e| range.contains(e.date)) {
        let (groups, total) = match entry.kind {
            LedgerKind::Revenue => (&mut revenue, &mut total_revenue),
            LedgerKind::Expense => (&mut expense, &mut total_expense),
        };
        *total += entry.amount;
        let group = groups.entry(entry.category.as_str()).or_default();
        group.0 += entry.amount;
        group.1 += 1;
    }

    FinancialSummary {
        range: *range,
        total_revenue,
        total_expense,
        balance: total_revenue - total_expense,
        revenue_by_category: sorted_breakdown(revenue),
        expense_by_category: sorted_breakdown(expense),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionLine {
    pub staff_id: Uuid,
    pub staff_name: String,
    pub completed: usize,
    pub revenue: Money,
    pub commission_bps: u32,
    pub commission: Money,
}

/// Commission owed per staff member for `completed` appointments whose
/// local start date falls inside `range`. Lines are ordered by name.
///
/// Staff without completed work in the range are omitted.
#[must_use]
pub fn commissions(
    appointments: &[Appointment],
    staff: &HashMap<Uuid, Staff>,
    range: &DateRange,
    timezone: Tz,
) -> Vec<CommissionLine> {
    let mut per_staff: HashMap<Uuid, (usize, Money)> = HashMap::new();
    for appointment in appointments.iter().filter(|a| {
        a.status == AppointmentStatus::Completed
            && range.contains(a.start_time.with_timezone(&timezone).date_naive())
    }) {
        let line = per_staff.entry(appointment.staff_id).or_default();
        line.0 += 1;
        line.1 += appointment.total_value;
    }

    let mut lines: Vec<CommissionLine> = per_staff
        .into_iter()
        .filter_map(|(staff_id, (completed, revenue))| {
            let member = staff.get(&staff_id)?;
            Some(CommissionLine {
                staff_id,
                staff_name: member.name.clone(),
                completed,
                revenue,
                commission_bps: member.commission_bps,
                commission: revenue.percent_bps(member.commission_bps),
            })
        })
        .collect();
    lines.sort_by(|a, b| {
        a.staff_name
            .cmp(&b.staff_name)
            .then_with(|| a.staff_id.cmp(&b.staff_id))
    });
    lines
}
