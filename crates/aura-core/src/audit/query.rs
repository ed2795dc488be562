use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{AuditAction, AuditRecord};
use crate::AuraError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    AllTime,
    /// Since UTC midnight of `now`.
    Today,
    Last7Days,
    Last30Days,
}

impl TimeWindow {
    /// Earliest timestamp inside the window, `None` for all time.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::AllTime => None,
            Self::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "all" | "all_time" => Ok(Self::AllTime),
            "today" => Ok(Self::Today),
            "7d" | "last_7_days" => Ok(Self::Last7Days),
            "30d" | "last_30_days" => Ok(Self::Last30Days),
            _ => Err(AuraError::InvalidInput {
                field: "window".into(),
                reason: format!("Unknown time window '{}'", s.trim()),
            }),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AllTime => "All Time",
            Self::Today => "Today",
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl FromStr for SortOrder {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "newest_first" | "desc" => Ok(Self::NewestFirst),
            "oldest" | "oldest_first" | "asc" => Ok(Self::OldestFirst),
            other => Err(AuraError::InvalidInput {
                field: "order".into(),
                reason: format!("Unknown sort order '{other}'"),
            }),
        }
    }
}

/// Filter and ordering applied to the audit read path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub action: Option<AuditAction>,
    #[serde(default)]
    pub window: TimeWindow,
    #[serde(default)]
    pub order: SortOrder,
}

impl AuditQuery {
    pub fn matches(&self, record: &AuditRecord, now: DateTime<Utc>) -> bool {
        if let Some(actor) = &self.actor {
            if &record.actor != actor {
                return false;
            }
        }
        if let Some(action) = self.action {
            if record.action != action {
                return false;
            }
        }
        match self.window.start(now) {
            Some(start) => record.timestamp >= start,
            None => true,
        }
    }

    /// Filter, then sort by timestamp. Equal timestamps sort by append position.
    pub fn apply(&self, records: Vec<AuditRecord>, now: DateTime<Utc>) -> Vec<AuditRecord> {
        let mut kept: Vec<AuditRecord> = records
            .into_iter()
            .filter(|r| self.matches(r, now))
            .collect();
        match self.order {
            SortOrder::OldestFirst => kept.sort_by_key(|r| r.timestamp),
            SortOrder::NewestFirst => {
                kept.reverse();
                kept.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            }
        }
        kept
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub distinct_actors: usize,
    pub distinct_actions: usize,
    pub today: usize,
    pub by_action: BTreeMap<String, usize>,
}

pub fn summarize(records: &[AuditRecord], now: DateTime<Utc>) -> AuditSummary {
    let today_start = TimeWindow::Today.start(now);
    let mut actors = BTreeSet::new();
    let mut by_action: BTreeMap<String, usize> = BTreeMap::new();
    let mut today = 0;

    for record in records {
        actors.insert(record.actor.as_str());
        *by_action.entry(record.action.to_string()).or_default() += 1;
        if today_start.is_some_and(|start| record.timestamp >= start) {
            today += 1;
        }
    }

    AuditSummary {
        total: records.len(),
        distinct_actors: actors.len(),
        distinct_actions: by_action.len(),
        today,
        by_action,
    }
}
