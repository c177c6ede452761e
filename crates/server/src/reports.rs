//! Financial reports endpoints

use api_types::report::{
    CategoryTotal, CommissionLine, CommissionReport, FinancialSummary, ReportRange,
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use engine::DateRange;

use crate::{ServerError, server::ServerState};

fn category_totals(rows: Vec<engine::CategoryTotal>) -> Vec<CategoryTotal> {
    rows.into_iter()
        .map(|row| CategoryTotal {
            category: row.category,
            total_minor: row.total.cents(),
            entries: row.entries,
        })
        .collect()
}

fn parse_bound(name: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse::<NaiveDate>() {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(bound = name, value = raw, %err, "ignoring malformed report bound");
            None
        }
    }
}

/// Malformed bounds are treated as missing before `DateRange::resolve`.
pub(crate) fn resolve_range(params: &ReportRange, today: NaiveDate) -> DateRange {
    DateRange::resolve(
        parse_bound("start", params.start.as_deref()),
        parse_bound("end", params.end.as_deref()),
        today,
    )
}

pub async fn summary(
    State(state): State<ServerState>,
    Query(params): Query<ReportRange>,
) -> Result<Json<FinancialSummary>, ServerError> {
    let range = resolve_range(&params, state.engine.today());
    let summary = state.engine.financial_summary(Some(range)).await?;

    Ok(Json(FinancialSummary {
        start: summary.range.start,
        end: summary.range.end,
        total_revenue_minor: summary.total_revenue.cents(),
        total_expense_minor: summary.total_expense.cents(),
        balance_minor: summary.balance.cents(),
        revenue_by_category: category_totals(summary.revenue_by_category),
        expense_by_category: category_totals(summary.expense_by_category),
    }))
}

pub async fn commissions(
    State(state): State<ServerState>,
    Query(params): Query<ReportRange>,
) -> Result<Json<CommissionReport>, ServerError> {
    let range = resolve_range(&params, state.engine.today());
    let lines = state.engine.commission_report(Some(range)).await?;

    Ok(Json(CommissionReport {
        start: range.start,
        end: range.end,
        lines: lines
            .into_iter()
            .map(|line| CommissionLine {
                staff_id: line.staff_id,
                staff_name: line.staff_name,
                completed: line.completed,
                revenue_minor: line.revenue.cents(),
                commission_bps: line.commission_bps,
                commission_minor: line.commission.cents(),
            })
            .collect(),
    }))
}
