//! Pipeline board aggregation.

use crate::model::opportunity::{Opportunity, PipelineStage};
use crate::service::metrics::round1;
use serde::Serialize;

/// Aggregate of one pipeline column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: PipelineStage,
    pub label: &'static str,
    pub order: u8,
    pub count: usize,
    pub value: f64,
    /// Share of `PipelineSummary::total_value`, in percent (one decimal).
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    /// One entry per stage, in pipeline order, including empty stages.
    pub stages: Vec<StageSummary>,
    /// Value across every stage, terminal ones included.
    pub total_value: f64,
}

impl PipelineSummary {
    pub fn stage(&self, stage: PipelineStage) -> Option<&StageSummary> {
        self.stages.iter().find(|summary| summary.stage == stage)
    }

    /// Stages holding at least one opportunity.
    pub fn non_empty(&self) -> impl Iterator<Item = &StageSummary> {
        self.stages.iter().filter(|summary| summary.count > 0)
    }
}

pub fn pipeline_summary(opportunities: &[Opportunity]) -> PipelineSummary {
    let mut stages = PipelineStage::ALL
        .iter()
        .map(|&stage| {
            let in_stage = opportunities
                .iter()
                .filter(|opportunity| opportunity.stage == stage);
            let (count, value) = in_stage.fold((0usize, 0.0f64), |(count, value), opportunity| {
                (count + 1, value + opportunity.value)
            });
            StageSummary {
                stage,
                label: stage.label(),
                order: stage.order(),
                count,
                value,
                share: 0.0,
            }
        })
        .collect::<Vec<_>>();

    let total_value = stages.iter().map(|summary| summary.value).sum::<f64>();
    if total_value > 0.0 {
        for summary in &mut stages {
            summary.share = round1(summary.value / total_value * 100.0);
        }
    }

    PipelineSummary {
        stages,
        total_value,
    }
}

#[cfg(test)]
mod tests {
    use super::pipeline_summary;
    use crate::model::opportunity::{Opportunity, PipelineStage};
    use chrono::NaiveDate;

    fn opportunity(stage: PipelineStage, value: f64) -> Opportunity {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date");
        let mut opportunity = Opportunity::new("c1", "Deal", value, "Ana", day, day);
        opportunity.stage = stage;
        opportunity
    }

    #[test]
    fn groups_by_stage_in_pipeline_order() {
        let summary = pipeline_summary(&[
            opportunity(PipelineStage::Proposal, 30_000.0),
            opportunity(PipelineStage::Prospecting, 10_000.0),
            opportunity(PipelineStage::Proposal, 20_000.0),
            opportunity(PipelineStage::Won, 40_000.0),
        ]);

        assert_eq!(summary.stages.len(), 7);
        assert_eq!(summary.stages[0].stage, PipelineStage::Prospecting);
        assert_eq!(summary.total_value, 100_000.0);

        let proposal = summary.stage(PipelineStage::Proposal).expect("proposal stage");
        assert_eq!(proposal.count, 2);
        assert_eq!(proposal.value, 50_000.0);
        assert_eq!(proposal.share, 50.0);
        assert_eq!(summary.non_empty().count(), 3);
    }

    #[test]
    fn empty_pipeline_has_zero_shares() {
        let summary = pipeline_summary(&[]);
        assert_eq!(summary.total_value, 0.0);
        assert!(summary.stages.iter().all(|stage| stage.share == 0.0));
    }
}
