//! Dashboard metrics derivation.
//!
//! # Invariants
//! - `compute_metrics` is pure: identical collections and `now` always yield
//!   identical metrics.
//! - Percentages are rounded to one decimal; averages of money and days to
//!   whole numbers.

use crate::model::client::ClientStatus;
use crate::model::data::CrmData;
use crate::model::lead::LeadStatus;
use crate::model::metrics::{
    ClientMetrics, DashboardMetrics, LeadMetrics, OpportunityMetrics, SalesMetrics, TaskMetrics,
};
use crate::model::opportunity::{Opportunity, PipelineStage};
use crate::model::task::TaskStatus;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Monthly sales target used when none is configured.
pub const DEFAULT_SALES_TARGET: f64 = 350_000.0;

/// Derives the dashboard snapshot from the current collections.
pub fn compute_metrics(data: &CrmData, sales_target: f64, now: DateTime<Utc>) -> DashboardMetrics {
    let today = now.date_naive();
    let month_start = month_start(today);

    DashboardMetrics {
        sales: sales_metrics(&data.opportunities, sales_target, now),
        leads: lead_metrics(data, month_start),
        opportunities: opportunity_metrics(&data.opportunities),
        clients: client_metrics(data, month_start),
        tasks: task_metrics(data, today),
    }
}

fn sales_metrics(opportunities: &[Opportunity], target: f64, now: DateTime<Utc>) -> SalesMetrics {
    let today = now.date_naive();
    let current_start = month_start(today);
    let previous_start = previous_month_start(today);

    let won = opportunities
        .iter()
        .filter(|opportunity| opportunity.stage == PipelineStage::Won);

    let mut total = 0.0;
    let mut current_month = 0.0;
    let mut previous_month = 0.0;
    for opportunity in won {
        total += opportunity.value;
        match opportunity.actual_close_date {
            Some(closed) if closed >= current_start && closed <= today => {
                current_month += opportunity.value;
            }
            Some(closed) if closed >= previous_start && closed < current_start => {
                previous_month += opportunity.value;
            }
            _ => {}
        }
    }

    let growth = if previous_month > 0.0 {
        round1((current_month - previous_month) / previous_month * 100.0)
    } else {
        0.0
    };

    SalesMetrics {
        total,
        target,
        growth,
        period: now.format("%B %Y").to_string(),
    }
}

fn lead_metrics(data: &CrmData, month_start: NaiveDate) -> LeadMetrics {
    let leads = &data.leads;
    let converted = count(leads, |lead| lead.status == LeadStatus::Converted);

    LeadMetrics {
        new: count(leads, |lead| lead.captured_on >= month_start),
        qualified: count(leads, |lead| lead.status == LeadStatus::Qualified),
        converted,
        conversion_rate: percent(converted, leads.len()),
    }
}

fn opportunity_metrics(opportunities: &[Opportunity]) -> OpportunityMetrics {
    let active = opportunities
        .iter()
        .filter(|opportunity| opportunity.is_active())
        .collect::<Vec<_>>();
    let pipeline_value = active.iter().map(|opportunity| opportunity.value).sum::<f64>();
    let average_value = if active.is_empty() {
        0.0
    } else {
        (pipeline_value / active.len() as f64).round()
    };

    let cycles = opportunities
        .iter()
        .filter(|opportunity| opportunity.stage == PipelineStage::Won)
        .filter_map(|opportunity| {
            opportunity
                .actual_close_date
                .map(|closed| (closed - opportunity.start_date).num_days() as f64)
        })
        .collect::<Vec<_>>();
    let average_cycle_days = if cycles.is_empty() {
        0.0
    } else {
        (cycles.iter().sum::<f64>() / cycles.len() as f64).round()
    };

    OpportunityMetrics {
        active: active.len(),
        pipeline_value,
        average_value,
        average_cycle_days,
    }
}

fn client_metrics(data: &CrmData, month_start: NaiveDate) -> ClientMetrics {
    let clients = &data.clients;
    let inactive = count(clients, |client| client.status == ClientStatus::Inactive);

    ClientMetrics {
        total: clients.len(),
        active: count(clients, |client| client.status == ClientStatus::Active),
        new: count(clients, |client| client.registered_on >= month_start),
        churn: percent(inactive, clients.len()),
    }
}

fn task_metrics(data: &CrmData, today: NaiveDate) -> TaskMetrics {
    let tasks = &data.tasks;
    let done = count(tasks, |task| task.status == TaskStatus::Done);

    TaskMetrics {
        pending: count(tasks, |task| task.is_pending()),
        overdue: count(tasks, |task| task.is_overdue(today)),
        done,
        completion_rate: percent(done, tasks.len()),
    }
}

fn count<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> usize {
    items.iter().filter(|item| predicate(item)).count()
}

/// `part / whole * 100` rounded to one decimal; zero for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

fn previous_month_start(date: NaiveDate) -> NaiveDate {
    let first = month_start(date);
    month_start(first.pred_opt().unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::{month_start, percent, previous_month_start, round1};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn percent_rounds_to_one_decimal_and_handles_empty() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(0, 0), 0.0);
    }

    #[test]
    fn round1_keeps_exact_values() {
        assert_eq!(round1(15.0), 15.0);
        assert_eq!(round1(12.34), 12.3);
    }

    #[test]
    fn previous_month_crosses_year_boundary() {
        assert_eq!(previous_month_start(date(2024, 1, 15)), date(2023, 12, 1));
        assert_eq!(previous_month_start(date(2024, 3, 31)), date(2024, 2, 1));
        assert_eq!(month_start(date(2024, 2, 29)), date(2024, 2, 1));
    }
}
