//! The application-facing expense contract.
//!
//! [`ExpenseService`] is the capability set any backend has to provide;
//! [`Expenses`] implements it on top of an [`ExpensesContext`]. Every call
//! acquires its own [`Scope`](crate::Scope) and releases it before returning.

use crate::{CategoryTotal, Expense, ExpensesContext, NewExpense, ResultEngine};

/// Run a block inside a scope, saving on success. On error the scope is
/// dropped and rolled back.
macro_rules! with_scope {
    ($context:expr, |$scope:ident| $body:expr) => {{
        let $scope = $context.scope().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $scope.save().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

#[allow(async_fn_in_trait)]
pub trait ExpenseService {
    /// Record a new expense and return it with its assigned identity.
    ///
    /// Non-positive amounts are rejected with
    /// [`EngineError::InvalidAmount`](crate::EngineError::InvalidAmount)
    /// before touching the database. A missing category is stored as
    /// [`UNCATEGORIZED`](crate::UNCATEGORIZED). Storage failures are returned
    /// unchanged and leave the store as it was.
    async fn add(&self, expense: NewExpense) -> ResultEngine<Expense>;

    /// Every stored expense.
    async fn all(&self) -> ResultEngine<Vec<Expense>>;

    /// Per-category totals of every stored expense.
    async fn chart_data(&self) -> ResultEngine<Vec<CategoryTotal>>;
}

/// [`ExpenseService`] backed by an [`ExpensesContext`].
#[derive(Clone, Debug)]
pub struct Expenses {
    context: ExpensesContext,
}

impl Expenses {
    pub fn new(context: ExpensesContext) -> Self {
        Self { context }
    }
}

impl ExpenseService for Expenses {
    async fn add(&self, expense: NewExpense) -> ResultEngine<Expense> {
        let expense = expense.normalized()?;
        let stored = with_scope!(self.context, |scope| {
            scope.expenses().add(expense).await
        })?;
        tracing::debug!(
            id = stored.id,
            category = %stored.category,
            amount_minor = stored.amount_minor,
            "expense added"
        );
        Ok(stored)
    }

    async fn all(&self) -> ResultEngine<Vec<Expense>> {
        let expenses = with_scope!(self.context, |scope| { scope.expenses().all().await })?;
        tracing::debug!(count = expenses.len(), "expenses listed");
        Ok(expenses)
    }

    async fn chart_data(&self) -> ResultEngine<Vec<CategoryTotal>> {
        let totals = with_scope!(self.context, |scope| {
            scope.expenses().totals_by_category().await
        })?;
        tracing::debug!(categories = totals.len(), "chart data computed");
        Ok(totals)
    }
}
