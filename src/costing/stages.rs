//! Production stage machine: cutting -> printing -> stitching -> dispatch.
//!
//! The job card itself never stores a status; every screen derives it from
//! the child jobs through [`job_card_status`], so two views can no longer
//! disagree about the same card.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Production stages in their required order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Cutting,
    Printing,
    Stitching,
}

impl Stage {
    /// The stage that must clear its gate before this one may start.
    /// Cutting has no predecessor.
    pub fn prior(self) -> Option<Stage> {
        match self {
            Stage::Cutting => None,
            Stage::Printing => Some(Stage::Cutting),
            Stage::Stitching => Some(Stage::Printing),
        }
    }

    pub fn all() -> impl Iterator<Item = Stage> {
        Stage::iter()
    }
}

/// Status of a single stage job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    pub fn started(self) -> bool {
        self != JobStatus::Pending
    }
}

/// When a stage is allowed to begin relative to its predecessor.
///
/// The source system used both rules on different screens; neither was
/// authoritative, so both are kept selectable and the choice is service
/// configuration rather than something each call site decides.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GatePolicy {
    /// Every job of the prior stage must be completed (strict rule).
    #[default]
    AllCompleted,
    /// At least one job of the prior stage must have started (lenient rule).
    AnyStarted,
}

/// Whether the gate into a stage is open, given the statuses of every job in
/// the prior stage.
///
/// An empty prior stage keeps the gate closed under either policy: a stage
/// with no jobs at all has not begun, let alone finished.
pub fn stage_gate(policy: GatePolicy, prior_stage_jobs: &[JobStatus]) -> bool {
    if prior_stage_jobs.is_empty() {
        return false;
    }
    match policy {
        GatePolicy::AllCompleted => prior_stage_jobs
            .iter()
            .all(|status| *status == JobStatus::Completed),
        GatePolicy::AnyStarted => prior_stage_jobs.iter().any(|status| status.started()),
    }
}

/// Effective status of a job card, derived from all of its child jobs across
/// every stage.
///
/// A card with no jobs is pending; a card whose every job is completed is
/// completed; anything in between is in progress.
pub fn job_card_status(jobs: &[JobStatus]) -> JobStatus {
    if jobs.is_empty() {
        return JobStatus::Pending;
    }
    if jobs.iter().all(|status| *status == JobStatus::Completed) {
        return JobStatus::Completed;
    }
    if jobs.iter().any(|status| status.started()) {
        JobStatus::InProgress
    } else {
        JobStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn stage_order_is_cutting_printing_stitching() {
        let stages: Vec<Stage> = Stage::all().collect();
        assert_eq!(stages, vec![Stage::Cutting, Stage::Printing, Stage::Stitching]);
        assert_eq!(Stage::Cutting.prior(), None);
        assert_eq!(Stage::Printing.prior(), Some(Stage::Cutting));
        assert_eq!(Stage::Stitching.prior(), Some(Stage::Printing));
    }

    #[test]
    fn statuses_round_trip_as_snake_case() {
        assert_eq!(JobStatus::InProgress.to_string(), "in_progress");
        assert_eq!("in_progress".parse::<JobStatus>().unwrap(), JobStatus::InProgress);
        assert_eq!(Stage::Cutting.to_string(), "cutting");
        assert_eq!("stitching".parse::<Stage>().unwrap(), Stage::Stitching);
    }

    #[test_case(GatePolicy::AllCompleted ; "strict policy")]
    #[test_case(GatePolicy::AnyStarted ; "lenient policy")]
    fn empty_prior_stage_keeps_gate_closed(policy: GatePolicy) {
        assert!(!stage_gate(policy, &[]));
    }

    #[test]
    fn all_completed_requires_every_job_done() {
        let jobs = [JobStatus::Completed, JobStatus::InProgress];
        assert!(!stage_gate(GatePolicy::AllCompleted, &jobs));
        let done = [JobStatus::Completed, JobStatus::Completed];
        assert!(stage_gate(GatePolicy::AllCompleted, &done));
    }

    #[test]
    fn any_started_opens_on_first_progress() {
        let jobs = [JobStatus::Pending, JobStatus::InProgress];
        assert!(stage_gate(GatePolicy::AnyStarted, &jobs));
        let idle = [JobStatus::Pending, JobStatus::Pending];
        assert!(!stage_gate(GatePolicy::AnyStarted, &idle));
    }

    #[test]
    fn card_status_derivation() {
        assert_eq!(job_card_status(&[]), JobStatus::Pending);
        assert_eq!(
            job_card_status(&[JobStatus::Pending, JobStatus::Pending]),
            JobStatus::Pending
        );
        assert_eq!(
            job_card_status(&[JobStatus::Pending, JobStatus::InProgress]),
            JobStatus::InProgress
        );
        assert_eq!(
            job_card_status(&[JobStatus::Completed, JobStatus::Pending]),
            JobStatus::InProgress
        );
        assert_eq!(
            job_card_status(&[JobStatus::Completed, JobStatus::Completed]),
            JobStatus::Completed
        );
    }
}
