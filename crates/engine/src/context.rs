//! Persistence context for expenses.
//!
//! [`ExpensesContext`] owns the connection to the storage engine. Work is done
//! through a [`Scope`]: a short-lived handle backed by one database
//! transaction. Mutations staged in a scope become durable only on
//! [`Scope::save`]; a scope dropped without saving is rolled back.

use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};

use crate::{
    ResultEngine,
    expenses::{self, CategoryTotal, Expense, NewExpense},
};

/// How to reach the storage engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextOptions {
    pub url: String,
    pub max_connections: Option<u32>,
    pub sqlx_logging: bool,
}

impl ContextOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: None,
            sqlx_logging: false,
        }
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn sqlx_logging(mut self, enabled: bool) -> Self {
        self.sqlx_logging = enabled;
        self
    }
}

/// Handle on the storage engine. Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct ExpensesContext {
    database: DatabaseConnection,
}

impl ExpensesContext {
    /// Return a builder for `ExpensesContext`. Help to build the struct.
    pub fn builder() -> ExpensesContextBuilder {
        ExpensesContextBuilder::default()
    }

    /// Open a connection pool described by `options`.
    pub async fn connect(options: &ContextOptions) -> ResultEngine<Self> {
        let mut connect = ConnectOptions::new(options.url.clone());
        if let Some(max_connections) = options.max_connections {
            connect.max_connections(max_connections);
        }
        connect.sqlx_logging(options.sqlx_logging);

        tracing::debug!(url = %options.url, "connecting expenses context");
        let database = Database::connect(connect).await?;
        Ok(Self { database })
    }

    /// Acquire a unit of work. Release it with [`Scope::save`] or
    /// [`Scope::discard`].
    pub async fn scope(&self) -> ResultEngine<Scope> {
        let tx = self.database.begin().await?;
        Ok(Scope { tx })
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `ExpensesContext`
#[derive(Default)]
pub struct ExpensesContextBuilder {
    database: DatabaseConnection,
}

impl ExpensesContextBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> ExpensesContextBuilder {
        self.database = db;
        self
    }

    /// Construct `ExpensesContext`
    pub fn build(self) -> ExpensesContext {
        ExpensesContext {
            database: self.database,
        }
    }
}

/// One transaction against the storage engine.
#[derive(Debug)]
pub struct Scope {
    tx: DatabaseTransaction,
}

impl Scope {
    /// The `expenses` collection as seen from this scope.
    pub fn expenses(&self) -> ExpenseSet<'_> {
        ExpenseSet { tx: &self.tx }
    }

    /// Commit every pending mutation atomically.
    ///
    /// Read-only service calls save their scope too: committing a
    /// transaction without mutations only releases its connection, while a
    /// dropped scope leaves the rollback to the pool.
    pub async fn save(self) -> ResultEngine<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Roll back every pending mutation.
    pub async fn discard(self) -> ResultEngine<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Queries and mutations over the `expenses` table inside a [`Scope`].
#[derive(Clone, Copy, Debug)]
pub struct ExpenseSet<'a> {
    tx: &'a DatabaseTransaction,
}

impl ExpenseSet<'_> {
    /// Stage an insert. The identity is assigned by the storage engine and
    /// is visible in the returned expense; the row is durable only once the
    /// scope is saved.
    ///
    /// Category and description are normalized like in the service. The
    /// amount is checked by the storage engine, which rejects anything not
    /// greater than zero.
    pub async fn add(&self, expense: NewExpense) -> ResultEngine<Expense> {
        let model = expenses::ActiveModel::from(&expense).insert(self.tx).await?;
        Ok(Expense::from(model))
    }

    /// Every stored expense, ordered by identity.
    pub async fn all(&self) -> ResultEngine<Vec<Expense>> {
        let models = expenses::Entity::find()
            .order_by_asc(expenses::Column::Id)
            .all(self.tx)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }

    /// Group every expense by category and sum the amounts, ordered by
    /// category name.
    pub async fn totals_by_category(&self) -> ResultEngine<Vec<CategoryTotal>> {
        let totals = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Category)
            .column_as(Expr::col(expenses::Column::AmountMinor).sum(), "total_minor")
            .group_by(expenses::Column::Category)
            .order_by_asc(expenses::Column::Category)
            .into_model::<CategoryTotal>()
            .all(self.tx)
            .await?;
        Ok(totals)
    }
}
