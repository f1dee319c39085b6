//! Expense data layer.
//!
//! - [`ExpensesContext`]: connection to the storage engine, handing out
//!   short-lived [`Scope`]s.
//! - [`ExpenseService`]: add, list and aggregate expenses, implemented by
//!   [`Expenses`].

pub use context::{ContextOptions, ExpenseSet, ExpensesContext, ExpensesContextBuilder, Scope};
pub use error::EngineError;
pub use expenses::{CategoryTotal, Expense, NewExpense, UNCATEGORIZED};
pub use service::{ExpenseService, Expenses};

mod context;
mod error;
mod expenses;
mod service;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
