//! Ordered collection of plans built as one unit

use tracing::{debug, warn};

use super::error::{PlannerError, PlannerResult};
use super::plan::Plan;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeState {
    Open,
    Built,
    Failed(PlannerError),
}

/// Plans built in insertion order; the first failure aborts the whole tree
#[derive(Debug)]
pub struct PlanTree<'a> {
    plans: Vec<Plan<'a>>,
    state: TreeState,
}

impl<'a> PlanTree<'a> {
    pub fn new() -> Self {
        Self {
            plans: Vec::new(),
            state: TreeState::Open,
        }
    }

    /// Append an unbuilt plan. Fails once the tree has been built.
    pub fn add(&mut self, plan: impl Into<Plan<'a>>) -> PlannerResult<()> {
        if self.state != TreeState::Open {
            return Err(PlannerError::TreeFrozen);
        }
        self.plans.push(plan.into());
        Ok(())
    }

    /// Build every plan in insertion order, stopping at the first error.
    ///
    /// A failed tree keeps returning that error and never hands out its plans.
    pub fn build(&mut self) -> PlannerResult<()> {
        match &self.state {
            TreeState::Built => return Ok(()),
            TreeState::Failed(err) => return Err(err.clone()),
            TreeState::Open => {}
        }

        for (index, plan) in self.plans.iter_mut().enumerate() {
            if let Err(err) = plan.build() {
                warn!(
                    index,
                    plan_type = %plan.plan_type(),
                    query = %plan.raw_query(),
                    error = %err,
                    "Plan tree build aborted"
                );
                self.state = TreeState::Failed(err.clone());
                return Err(err);
            }
        }

        debug!(plans = self.plans.len(), "Plan tree built");
        self.state = TreeState::Built;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.state == TreeState::Built
    }

    /// Plans in insertion order
    pub fn plans(&self) -> &[Plan<'a>] {
        &self.plans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Plan<'a>> {
        self.plans.iter()
    }

    /// Hand the built plans to the executor
    pub fn into_plans(self) -> PlannerResult<Vec<Plan<'a>>> {
        match self.state {
            TreeState::Built => Ok(self.plans),
            TreeState::Failed(err) => Err(err),
            TreeState::Open => Err(PlannerError::TreeNotBuilt),
        }
    }
}

impl Default for PlanTree<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t, 'a> IntoIterator for &'t PlanTree<'a> {
    type Item = &'t Plan<'a>;
    type IntoIter = std::slice::Iter<'t, Plan<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.plans.iter()
    }
}
