//! Append-only migration list.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A single schema-change step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStep {
    /// Position in the list. Strictly increasing, starting above zero.
    pub order: i64,

    /// Human-readable summary, stored in the migration log.
    #[serde(default)]
    pub description: String,

    /// SQL executed when the step is applied. May contain several statements.
    pub query: String,
}

impl MigrationStep {
    pub fn new(order: i64, description: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            order,
            description: description.into(),
            query: query.into(),
        }
    }
}

/// Ordered, immutable sequence of migration steps.
///
/// Appending returns a new list that shares structure with the original; the
/// original is left untouched. Order validation happens at append time, so an
/// invalid list can never reach the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationList {
    steps: Vector<MigrationStep>,
}

/// Start an empty migration list.
pub fn migration_list() -> MigrationList {
    MigrationList::new()
}

impl MigrationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list by appending `steps` in iteration order.
    pub fn from_steps<I>(steps: I) -> Result<Self>
    where
        I: IntoIterator<Item = MigrationStep>,
    {
        steps.into_iter().try_fold(Self::new(), |list, step| list.append(step))
    }

    /// Return a new list with `step` appended.
    ///
    /// Fails with [`StoreError::InvalidMigrationOrder`] if `step.order` is not
    /// positive or does not exceed the current last order.
    pub fn append(&self, step: MigrationStep) -> Result<Self> {
        let previous = self.last_order().unwrap_or(0);
        if step.order <= 0 || step.order <= previous {
            return Err(StoreError::InvalidMigrationOrder {
                order: step.order,
                previous,
            });
        }

        let mut steps = self.steps.clone();
        steps.push_back(step);
        Ok(Self { steps })
    }

    /// Shorthand for `append(MigrationStep::new(..))`.
    pub fn migration(&self, order: i64, description: impl Into<String>, query: impl Into<String>) -> Result<Self> {
        self.append(MigrationStep::new(order, description, query))
    }

    pub fn steps(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter()
    }

    pub fn find(&self, order: i64) -> Option<&MigrationStep> {
        // Orders are sorted, so binary search is valid.
        self.steps
            .binary_search_by_key(&order, |s| s.order)
            .ok()
            .and_then(|idx| self.steps.get(idx))
    }

    pub fn last_order(&self) -> Option<i64> {
        self.steps.last().map(|s| s.order)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps with an order strictly greater than `order`, ascending.
    pub fn pending_after(&self, order: i64) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter().filter(move |s| s.order > order)
    }
}
