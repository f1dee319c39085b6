use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{ExpenseService, Expenses, ExpensesContext, NewExpense};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;

use error::Result;
use settings::Settings;

mod error;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "expenses")]
#[command(about = "Record expenses and summarize them per category")]
struct Cli {
    /// Optional settings file (TOML), defaults to `settings.toml`.
    #[arg(long, env = "EXPENSES_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new expense.
    Add(AddArgs),
    /// Print every stored expense.
    List,
    /// Print the total per category.
    Chart,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Amount in minor units (cents).
    #[arg(long)]
    amount_minor: i64,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// RFC 3339 timestamp, defaults to now.
    #[arg(long)]
    occurred_at: Option<DateTime<Utc>>,
}

impl From<AddArgs> for NewExpense {
    fn from(args: AddArgs) -> Self {
        let mut expense = NewExpense::new(args.amount_minor, args.category.as_deref());
        if let Some(description) = args.description.as_deref() {
            expense = expense.with_description(description);
        }
        if let Some(occurred_at) = args.occurred_at {
            expense = expense.with_occurred_at(occurred_at);
        }
        expense
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expenses={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let service = Expenses::new(connect(&settings).await?);

    match cli.command {
        Command::Add(args) => {
            let stored = service.add(args.into()).await?;
            tracing::info!(id = stored.id, "expense recorded");
            print_json(&stored)?;
        }
        Command::List => print_json(&service.all().await?)?,
        Command::Chart => print_json(&service.chart_data().await?)?,
    }

    Ok(())
}

async fn connect(settings: &Settings) -> Result<ExpensesContext> {
    let context = ExpensesContext::connect(&settings.context_options()).await?;
    Migrator::up(context.database(), None).await?;
    Ok(context)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
