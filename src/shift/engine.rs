//! Restore, shift and persist in one call.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::offset::{AnchorPolicy, ColumnShift, OffsetComputation, apply_offset, compute_offset};
use super::plan::ShiftPlan;
use super::timestamp::format_offset;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::storage::{Catalog, RestoreReport, SnapshotStore};

/// What a shift did, or would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftReport {
    pub working_path: PathBuf,
    /// `false` for previews.
    pub persisted: bool,
    pub reference: String,
    pub zone: String,
    pub policy: AnchorPolicy,
    pub anchor: DateTime<FixedOffset>,
    pub current_time: DateTime<FixedOffset>,
    #[serde(skip)]
    pub offset: TimeDelta,
    pub offset_seconds: i64,
    /// Offset rendered as `+517 days 00:00:00`.
    pub offset_display: String,
    pub tables: usize,
    pub rows: usize,
    pub columns: Vec<ColumnShift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<RestoreReport>,
}

/// Rewrites the planned temporal columns of a snapshot so its latest
/// reference value lands on the clock's "now".
#[derive(Debug, Clone)]
pub struct TimeShiftEngine<C: Clock = SystemClock> {
    store: SnapshotStore,
    plan: ShiftPlan,
    policy: AnchorPolicy,
    load_all_tables: bool,
    clock: C,
}

impl TimeShiftEngine<SystemClock> {
    /// Engine with the default plan, policy and system clock.
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            plan: ShiftPlan::default(),
            policy: AnchorPolicy::default(),
            load_all_tables: true,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> TimeShiftEngine<C> {
    pub fn with_clock<D: Clock>(self, clock: D) -> TimeShiftEngine<D> {
        TimeShiftEngine {
            store: self.store,
            plan: self.plan,
            policy: self.policy,
            load_all_tables: self.load_all_tables,
            clock,
        }
    }

    #[must_use]
    pub fn with_plan(mut self, plan: ShiftPlan) -> Self {
        self.plan = plan;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: AnchorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When false, only the plan's tables are loaded and rewritten.
    #[must_use]
    pub const fn with_load_all_tables(mut self, load_all_tables: bool) -> Self {
        self.load_all_tables = load_all_tables;
        self
    }

    pub const fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub const fn plan(&self) -> &ShiftPlan {
        &self.plan
    }

    /// Restore the working copy from the backup, shift it and persist it.
    ///
    /// On error the working copy holds either the freshly restored backup
    /// or, if persisting failed, the same content rolled back.
    pub fn run(&self) -> Result<ShiftReport> {
        let restore = self.store.restore()?;
        let mut dataset = if self.load_all_tables {
            self.store.load_all_tables()?
        } else {
            self.store.load_tables(&self.plan.tables())?
        };

        let computation = self.compute(&dataset)?;
        let columns = apply_offset(&mut dataset, &self.plan, computation.offset)?;
        self.store.persist_all_tables(&dataset)?;

        let report = self.report(&dataset, computation, columns, Some(restore));
        info!(
            working = %report.working_path.display(),
            anchor = %report.anchor,
            current_time = %report.current_time,
            offset = %report.offset_display,
            "shifted snapshot"
        );
        Ok(report)
    }

    /// Compute what [`run`](Self::run) would do, reading the backup only.
    pub fn preview(&self) -> Result<ShiftReport> {
        let tables = self.plan.tables();
        let mut dataset = self
            .store
            .load_backup((!self.load_all_tables).then_some(tables.as_slice()))?;
        let computation = self.compute(&dataset)?;
        let columns = apply_offset(&mut dataset, &self.plan, computation.offset)?;
        Ok(self.report(&dataset, computation, columns, None))
    }

    /// Validate the plan against `dataset` and compute the global offset.
    pub fn compute_offset(&self, dataset: &Dataset) -> Result<OffsetComputation> {
        self.compute(dataset)
    }

    fn compute(&self, dataset: &Dataset) -> Result<OffsetComputation> {
        let catalog = Catalog::from_dataset(dataset);
        self.plan.validate(&catalog)?;
        for column in self.plan.undeclared_temporal_columns(&catalog) {
            debug!(%column, "temporal-looking column not in shift plan, left as is");
        }
        compute_offset(dataset, &self.plan, self.policy, self.clock.now())
    }

    fn report(
        &self,
        dataset: &Dataset,
        computation: OffsetComputation,
        columns: Vec<ColumnShift>,
        restore: Option<RestoreReport>,
    ) -> ShiftReport {
        ShiftReport {
            working_path: self.store.working_path().to_path_buf(),
            persisted: restore.is_some(),
            reference: self.plan.reference().to_string(),
            zone: computation.zone.to_string(),
            policy: self.policy,
            anchor: computation.anchor,
            current_time: computation.current_time,
            offset: computation.offset,
            offset_seconds: computation.offset.num_seconds(),
            offset_display: format_offset(computation.offset),
            tables: dataset.len(),
            rows: dataset.row_count(),
            columns,
            restore,
        }
    }
}

/// Restore `working` from `backup`, shift it to the system clock with the
/// default plan, and return the working path.
pub fn update_dates(working: impl AsRef<Path>, backup: impl AsRef<Path>) -> Result<PathBuf> {
    let store = SnapshotStore::new(working.as_ref(), backup.as_ref());
    let report = TimeShiftEngine::new(store).run()?;
    Ok(report.working_path)
}
