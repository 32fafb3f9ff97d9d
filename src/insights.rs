//! Figures derived from the session and history for the dashboard and profile.
//!
//! Everything here is a pure function of its inputs; callers pass "today" in.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{AnalysisRecord, Session};

const MAX_STREAK_DAYS: u32 = 30;
/// Reference score the weekly trend is compared against.
const TREND_BASELINE: f64 = 85.0;

/// Consecutive-day run of analyses ending today, capped at 30.
pub fn health_streak(history: &[AnalysisRecord], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = history.iter().map(|record| record.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let mut streak: u32 = 0;
    let mut cursor = today;
    for date in dates {
        let gap = (cursor - date).num_days();
        if gap <= i64::from(streak) + 1 {
            streak += 1;
            cursor = date;
        } else {
            break;
        }
    }

    streak.min(MAX_STREAK_DAYS)
}

/// Average score of the last seven days minus the baseline, rounded.
/// Zero when nothing was analyzed this week.
pub fn weekly_trend(history: &[AnalysisRecord], today: NaiveDate) -> i32 {
    let week_start = today - Duration::days(7);
    let recent: Vec<f64> = history
        .iter()
        .filter(|record| record.date >= week_start)
        .map(|record| f64::from(record.health_score))
        .collect();

    if recent.is_empty() {
        return 0;
    }

    let average = recent.iter().sum::<f64>() / recent.len() as f64;
    (average - TREND_BASELINE).round() as i32
}

pub fn next_goal(session: &Session) -> &'static str {
    match session.total_analyses {
        0 => "Complete your first analysis to start tracking goals!",
        1..=4 => "Complete 5 analyses to unlock trend insights",
        5..=9 => "Reach 10 analyses this month for a special achievement",
        _ => "Maintain your excellent analysis routine!",
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreBand::Excellent,
            80..=89 => ScoreBand::Good,
            70..=79 => ScoreBand::Fair,
            _ => ScoreBand::NeedsAttention,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::NeedsAttention => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

pub fn achievements(session: &Session) -> Vec<Achievement> {
    vec![
        Achievement {
            id: 1,
            name: "First Analysis",
            description: "Completed your first health check",
            unlocked: session.total_analyses > 0,
        },
        Achievement {
            id: 2,
            name: "Health Explorer",
            description: "Completed 5 analyses",
            unlocked: session.total_analyses >= 5,
        },
        // Needs per-week bookkeeping that the history does not carry yet.
        Achievement {
            id: 3,
            name: "Consistency King",
            description: "Weekly analyses for a month",
            unlocked: false,
        },
        Achievement {
            id: 4,
            name: "Health Champion",
            description: "Maintained excellent health score",
            unlocked: session.health_score >= 90,
        },
    ]
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub streak: u32,
    pub weekly_trend: i32,
    pub next_goal: &'static str,
    pub score_band: ScoreBand,
}

pub fn dashboard_summary(
    session: &Session,
    history: &[AnalysisRecord],
    today: NaiveDate,
) -> DashboardSummary {
    DashboardSummary {
        streak: health_streak(history, today),
        weekly_trend: weekly_trend(history, today),
        next_goal: next_goal(session),
        score_band: ScoreBand::for_score(session.health_score),
    }
}

/// Payload of the "export my data" action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle<'a> {
    pub user: Option<&'a Session>,
    pub analyses: &'a [AnalysisRecord],
    pub export_date: DateTime<Utc>,
}

impl<'a> ExportBundle<'a> {
    pub fn new(
        user: Option<&'a Session>,
        analyses: &'a [AnalysisRecord],
        export_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            analyses,
            export_date,
        }
    }

    pub fn file_name(&self) -> String {
        format!("urisnap-data-{}.json", self.export_date.format("%Y-%m-%d"))
    }
}
