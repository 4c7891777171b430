//! Expands recurring chains into occurrences.
//!
//! The materializer persists every occurrence that is due as of today and
//! moves each chain's head to its newest occurrence. The projector computes
//! the occurrences that will fall due within a future window without
//! touching the store.

use time::Date;

use crate::{
    Error,
    clock::Clock,
    transaction::{
        NewTransaction, RangePreset, Transaction, TransactionFilter, TransactionStore,
        schedule::{next_occurrence, occurrences},
    },
};

/// What a call to [RecurringEngine::materialize] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// The number of occurrences created. Each one demoted its predecessor.
    pub created: usize,
    /// The number of chains whose head was demoted because the chain reached its end date.
    pub retired: usize,
    /// The number of chains left alone because another caller advanced them first.
    pub contended: usize,
}

impl MaterializeReport {
    fn add(&mut self, other: MaterializeReport) {
        self.created += other.created;
        self.retired += other.retired;
        self.contended += other.contended;
    }
}

/// Materializes and projects the recurring chains in one [TransactionStore].
///
/// The same engine serves income and expenses, the kind is decided by the
/// store it is given.
pub struct RecurringEngine<'a> {
    store: &'a dyn TransactionStore,
    clock: &'a dyn Clock,
}

impl<'a> RecurringEngine<'a> {
    /// Create an engine that reads and writes `store`, using `clock` for today's date.
    pub fn new(store: &'a dyn TransactionStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Persist every occurrence that is due as of today for the chains selected by `filter`.
    ///
    /// Only the scope, creator and tag conditions of `filter` are used. Chains
    /// are never advanced past today or past their own end date, so calling
    /// this again straight away changes nothing.
    ///
    /// # Errors
    /// Returns an error if the store fails. Occurrences created before the
    /// failure are kept and the chain resumes from its newest head on the next call.
    pub fn materialize(&self, filter: &TransactionFilter) -> Result<MaterializeReport, Error> {
        let today = self.clock.today();
        let heads = self.store.find(&TransactionFilter {
            scope: filter.scope.clone(),
            created_by: filter.created_by,
            tags: filter.tags.clone(),
            ..Default::default()
        }
        .recurring_heads())?;

        let mut report = MaterializeReport::default();

        for head in heads {
            report.add(self.materialize_chain(head, today)?);
        }

        if report.created > 0 || report.retired > 0 {
            tracing::info!(
                "Materialized {} {} occurrence(s), retired {} chain(s)",
                report.created,
                self.store.kind(),
                report.retired
            );
        }

        Ok(report)
    }

    /// Advance the chain headed by `head` up to `today`.
    pub(crate) fn materialize_chain(
        &self,
        head: Transaction,
        today: Date,
    ) -> Result<MaterializeReport, Error> {
        let limit = head.end_date.map_or(today, |end_date| end_date.min(today));
        let mut report = MaterializeReport::default();
        let mut frontier = head;

        for date in occurrences(frontier.recurring, frontier.date, limit) {
            match self.store.advance_head(&frontier, date)? {
                Some(successor) => {
                    tracing::debug!(
                        "Created {} occurrence {} on {date} after {}",
                        self.store.kind(),
                        successor.id,
                        frontier.id
                    );
                    report.created += 1;
                    frontier = successor;
                }
                None => {
                    tracing::warn!(
                        "The {} chain at {} was advanced by another request, skipping it",
                        self.store.kind(),
                        frontier.id
                    );
                    report.contended += 1;
                    return Ok(report);
                }
            }
        }

        if let Some(end_date) = frontier.end_date {
            // A next date that cannot be represented is past any end date.
            let next = next_occurrence(frontier.recurring, frontier.date).unwrap_or(None);

            if next.is_none_or(|next| next > end_date) && self.store.retire_head(frontier.id)? {
                tracing::debug!(
                    "Retired the {} chain at {} which ended on {end_date}",
                    self.store.kind(),
                    frontier.id
                );
                report.retired += 1;
            }
        }

        Ok(report)
    }

    /// Compute the occurrences of the chains selected by `filter` that fall
    /// between the heads and the end of the window `preset` ahead of today.
    ///
    /// Chains that ended before today are skipped. The result is sorted by
    /// date and nothing is written to the store.
    ///
    /// # Errors
    /// Returns an error if the store fails or a date cannot be represented.
    pub fn project(
        &self,
        filter: &TransactionFilter,
        preset: RangePreset,
    ) -> Result<Vec<NewTransaction>, Error> {
        let today = self.clock.today();
        let window_end = preset.horizon(today)?;
        let heads = self.store.find(
            &TransactionFilter {
                scope: filter.scope.clone(),
                created_by: filter.created_by,
                tags: filter.tags.clone(),
                ..Default::default()
            }
            .recurring_heads()
            .active_on(today),
        )?;

        let mut projected = Vec::new();

        for head in heads {
            let limit = head
                .end_date
                .map_or(window_end, |end_date| end_date.min(window_end));

            for date in occurrences(head.recurring, head.date, limit) {
                tracing::debug!(
                    "Projected {} occurrence of {} on {date}",
                    self.store.kind(),
                    head.id
                );
                projected.push(head.successor(date));
            }
        }

        projected.sort_by_key(|transaction| transaction.date);

        Ok(projected)
    }
}
