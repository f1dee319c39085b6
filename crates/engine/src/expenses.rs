//! Expense primitives.
//!
//! An `Expense` is a single recorded spending event. Amounts are stored in
//! minor units (cents) and every expense belongs to exactly one category.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, FromQueryResult, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    ResultEngine,
    util::{normalize_category, normalize_optional_text, validate_amount},
};

/// Category assigned to expenses recorded without one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A stored expense. `id` is assigned by the storage engine on insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Input record for a new expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NewExpense {
    /// A new expense occurring now, without description.
    pub fn new(amount_minor: i64, category: Option<&str>) -> Self {
        Self {
            amount_minor,
            category: category.map(ToString::to_string),
            description: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Validate the amount and canonicalize text fields.
    pub(crate) fn normalized(self) -> ResultEngine<Self> {
        let amount_minor = validate_amount(self.amount_minor)?;
        Ok(Self {
            amount_minor,
            category: Some(normalize_category(self.category.as_deref())),
            description: normalize_optional_text(self.description.as_deref()),
            occurred_at: self.occurred_at,
        })
    }
}

/// Sum of expense amounts for one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct CategoryTotal {
    pub category: String,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewExpense> for ActiveModel {
    fn from(expense: &NewExpense) -> Self {
        Self {
            id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(expense.amount_minor),
            category: ActiveValue::Set(normalize_category(expense.category.as_deref())),
            description: ActiveValue::Set(normalize_optional_text(
                expense.description.as_deref(),
            )),
            occurred_at: ActiveValue::Set(expense.occurred_at),
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            amount_minor: model.amount_minor,
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at,
        }
    }
}
