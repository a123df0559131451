//! Sales report aggregation.
//!
//! # Invariants
//! - Period filters use `actual_close_date`; won deals without one only count
//!   toward all-time totals.
//! - Rates are percentages rounded to one decimal.

use crate::model::lead::{Lead, LeadStatus};
use crate::model::opportunity::{Opportunity, PipelineStage};
use crate::model::EntityId;
use crate::service::metrics::{month_start, percent, year_start};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSales {
    pub deals: usize,
    pub value: f64,
}

impl PeriodSales {
    fn add(&mut self, value: f64) {
        self.deals += 1;
        self.value += value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSales {
    pub owner: String,
    pub deals: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageValue {
    pub stage: PipelineStage,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub won_this_month: PeriodSales,
    pub won_this_year: PeriodSales,
    /// Won value per owner, highest first.
    pub sales_by_owner: Vec<OwnerSales>,
    /// Active pipeline value per stage, highest first.
    pub pipeline_by_stage: Vec<StageValue>,
    pub lead_conversion_rate: f64,
    /// Closed (won or lost) over all opportunities.
    pub close_rate: f64,
    /// Won over closed.
    pub win_rate: f64,
    pub total_won: f64,
    pub total_lost: f64,
    pub pipeline_value: f64,
    pub average_ticket: f64,
    /// Won opportunity ids, most recently closed first.
    pub recent_wins: Vec<EntityId>,
}

pub fn sales_report(opportunities: &[Opportunity], leads: &[Lead], today: NaiveDate) -> SalesReport {
    let month = month_start(today);
    let year = year_start(today);

    let mut won = Vec::new();
    let mut lost_count = 0usize;
    let mut total_lost = 0.0;
    let mut pipeline = BTreeMap::<PipelineStage, f64>::new();

    for opportunity in opportunities {
        match opportunity.stage {
            PipelineStage::Won => won.push(opportunity),
            PipelineStage::Lost => {
                lost_count += 1;
                total_lost += opportunity.value;
            }
            stage => *pipeline.entry(stage).or_default() += opportunity.value,
        }
    }

    let mut won_this_month = PeriodSales::default();
    let mut won_this_year = PeriodSales::default();
    let mut by_owner = BTreeMap::<&str, (usize, f64)>::new();
    for opportunity in &won {
        if let Some(closed) = opportunity.actual_close_date {
            if closed >= month && closed <= today {
                won_this_month.add(opportunity.value);
            }
            if closed >= year && closed <= today {
                won_this_year.add(opportunity.value);
            }
        }
        let entry = by_owner.entry(opportunity.owner.as_str()).or_default();
        entry.0 += 1;
        entry.1 += opportunity.value;
    }

    let mut sales_by_owner = by_owner
        .into_iter()
        .map(|(owner, (deals, value))| OwnerSales {
            owner: owner.to_string(),
            deals,
            value,
        })
        .collect::<Vec<_>>();
    sales_by_owner.sort_by(|a, b| b.value.total_cmp(&a.value));

    let pipeline_value = pipeline.values().sum::<f64>();
    let mut pipeline_by_stage = pipeline
        .into_iter()
        .map(|(stage, value)| StageValue { stage, value })
        .collect::<Vec<_>>();
    pipeline_by_stage.sort_by(|a, b| b.value.total_cmp(&a.value));

    let total_won = won.iter().map(|opportunity| opportunity.value).sum::<f64>();
    let average_ticket = if won.is_empty() {
        0.0
    } else {
        total_won / won.len() as f64
    };

    won.sort_by(|a, b| {
        let a_date = a.actual_close_date.unwrap_or(a.start_date);
        let b_date = b.actual_close_date.unwrap_or(b.start_date);
        b_date.cmp(&a_date)
    });

    let closed = won.len() + lost_count;
    let converted = leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::Converted)
        .count();

    SalesReport {
        won_this_month,
        won_this_year,
        sales_by_owner,
        pipeline_by_stage,
        lead_conversion_rate: percent(converted, leads.len()),
        close_rate: percent(closed, opportunities.len()),
        win_rate: percent(won.len(), closed),
        total_won,
        total_lost,
        pipeline_value,
        average_ticket,
        recent_wins: won.iter().map(|opportunity| opportunity.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::sales_report;
    use crate::model::lead::{Lead, LeadSource, LeadStatus};
    use crate::model::opportunity::{Opportunity, PipelineStage};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn deal(
        id: &str,
        owner: &str,
        stage: PipelineStage,
        value: f64,
        closed: Option<NaiveDate>,
    ) -> Opportunity {
        let mut opportunity =
            Opportunity::new("c1", id, value, owner, date(2023, 11, 1), date(2024, 3, 1));
        opportunity.id = id.to_string();
        opportunity.stage = stage;
        opportunity.actual_close_date = closed;
        opportunity
    }

    #[test]
    fn aggregates_wins_losses_and_pipeline() {
        let today = date(2024, 1, 20);
        let opportunities = vec![
            deal("a", "Ana", PipelineStage::Won, 50_000.0, Some(date(2024, 1, 5))),
            deal("b", "Pedro", PipelineStage::Won, 30_000.0, Some(date(2023, 12, 10))),
            deal("c", "Ana", PipelineStage::Won, 10_000.0, None),
            deal("d", "Pedro", PipelineStage::Lost, 5_000.0, Some(date(2024, 1, 2))),
            deal("e", "Ana", PipelineStage::Proposal, 20_000.0, None),
            deal("f", "Ana", PipelineStage::Negotiation, 40_000.0, None),
        ];
        let mut converted = Lead::new("L", "l@example.com", LeadSource::Event, "Ana", today);
        converted.status = LeadStatus::Converted;
        let fresh = Lead::new("M", "m@example.com", LeadSource::Event, "Ana", today);

        let report = sales_report(&opportunities, &[converted, fresh], today);

        assert_eq!(report.won_this_month.deals, 1);
        assert_eq!(report.won_this_month.value, 50_000.0);
        assert_eq!(report.won_this_year.deals, 1);
        assert_eq!(report.total_won, 90_000.0);
        assert_eq!(report.total_lost, 5_000.0);
        assert_eq!(report.pipeline_value, 60_000.0);
        assert_eq!(report.average_ticket, 30_000.0);
        assert_eq!(report.sales_by_owner[0].owner, "Ana");
        assert_eq!(report.sales_by_owner[0].value, 60_000.0);
        assert_eq!(report.pipeline_by_stage[0].stage, PipelineStage::Negotiation);
        assert_eq!(report.lead_conversion_rate, 50.0);
        assert_eq!(report.close_rate, 66.7);
        assert_eq!(report.win_rate, 75.0);
        assert_eq!(report.recent_wins, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_inputs_produce_zeroes() {
        let report = sales_report(&[], &[], date(2024, 1, 1));
        assert_eq!(report.total_won, 0.0);
        assert_eq!(report.average_ticket, 0.0);
        assert_eq!(report.win_rate, 0.0);
        assert!(report.sales_by_owner.is_empty());
    }
}
