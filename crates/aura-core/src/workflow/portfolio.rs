//! Portfolio view joining the audit trail with the approval queue: headline
//! counts, risk and industry mix, loan volume per status and a daily
//! activity trend.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::approvals::{ApprovalQueue, ApprovalStats, ApprovalStatus};
use crate::audit::{AuditAction, AuditQuery, AuditRecord, SortOrder};
use crate::credit::RiskLevel;
use crate::types::Money;

/// Days covered by the activity trend, today included.
pub const TREND_DAYS: i64 = 30;

/// Length of the recent-activity feed.
pub const RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub risk_analyses: usize,
    pub term_sheets: usize,
    pub approvals: ApprovalStats,
    /// Queued requests per risk level. Every level is present.
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub applications_by_industry: BTreeMap<String, usize>,
    /// Requested $M per status. Every status is present.
    pub volume_by_status: BTreeMap<ApprovalStatus, Money>,
    /// One entry per UTC day from the first active day of the trend window
    /// through today; quiet days count zero.
    pub daily_activity: Vec<DailyActivity>,
    /// Newest first.
    pub recent_activity: Vec<AuditRecord>,
}

pub fn portfolio_summary(
    records: &[AuditRecord],
    queue: &ApprovalQueue,
    now: DateTime<Utc>,
) -> PortfolioSummary {
    let count = |action: AuditAction| records.iter().filter(|r| r.action == action).count();

    let mut risk_distribution: BTreeMap<RiskLevel, usize> =
        [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High]
            .into_iter()
            .map(|level| (level, 0))
            .collect();
    let mut volume_by_status: BTreeMap<ApprovalStatus, Money> = [
        ApprovalStatus::Pending,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ]
    .into_iter()
    .map(|status| (status, Decimal::ZERO))
    .collect();
    let mut applications_by_industry: BTreeMap<String, usize> = BTreeMap::new();

    for request in queue.all() {
        *risk_distribution.entry(request.risk_level).or_default() += 1;
        let volume = volume_by_status.entry(request.status).or_default();
        *volume = volume.saturating_add(request.loan_amount);
        *applications_by_industry
            .entry(request.profile.industry.to_string())
            .or_default() += 1;
    }

    let newest_first = AuditQuery {
        order: SortOrder::NewestFirst,
        ..Default::default()
    };
    let mut recent_activity = newest_first.apply(records.to_vec(), now);
    recent_activity.truncate(RECENT_ACTIVITY);

    PortfolioSummary {
        risk_analyses: count(AuditAction::RiskAnalysis),
        term_sheets: count(AuditAction::TermSheetGenerated),
        approvals: queue.stats(),
        risk_distribution,
        applications_by_industry,
        volume_by_status,
        daily_activity: daily_activity(records, now),
        recent_activity,
    }
}

fn daily_activity(records: &[AuditRecord], now: DateTime<Utc>) -> Vec<DailyActivity> {
    let today = now.date_naive();
    let window_start = today - Duration::days(TREND_DAYS - 1);

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        let day = record.timestamp.date_naive();
        if (window_start..=today).contains(&day) {
            *per_day.entry(day).or_default() += 1;
        }
    }

    let Some(&first) = per_day.keys().next() else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| DailyActivity {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
