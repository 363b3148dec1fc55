use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    field_messages, AuthError, BudgetClient, CategoryColumn, CategoryDraft,
    CategoryListController, CategoryPatch, ClientOptions, FetchOutcome, LoginForm,
    MutationError, RegisterForm, Route, SortDirection, ValidationErrors,
};
use shared::domain::{CategoryId, HouseholdId};
use storage::{KeyValueStore, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(name = "budget", about = "Manage budget categories from the terminal")]
struct Cli {
    /// Backend base URL. Overrides budget.toml and BUDGET_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Local session database.
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Upper bound for loading the category list, in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BUDGET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BUDGET_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    Logout,
    Whoami,
    #[command(subcommand)]
    Categories(CategoriesCommand),
}

#[derive(Subcommand, Debug)]
enum CategoriesCommand {
    List(ListArgs),
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        household_id: Option<i64>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        household_id: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// Column to sort by (name, description, household, status, active,
    /// created_at, updated_at).
    #[arg(long)]
    sort: Option<CategoryColumn>,
    #[arg(long, requires = "sort")]
    desc: bool,
    /// COLUMN=TEXT, repeatable.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(CategoryColumn, String)>,
    #[arg(long = "hide")]
    hidden: Vec<CategoryColumn>,
    #[arg(long = "show")]
    shown: Vec<CategoryColumn>,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
    /// Mark rows as selected.
    #[arg(long = "select")]
    selected: Vec<i64>,
    /// FROM:TO drag of one row onto another, as 0-based positions on the
    /// shown page. Display only; not allowed together with --sort.
    #[arg(long = "move", value_parser = parse_move, conflicts_with = "sort")]
    moves: Vec<(usize, usize)>,
    /// Extra attempts when loading fails.
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

fn parse_filter(raw: &str) -> Result<(CategoryColumn, String), String> {
    let (column, query) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=TEXT, got '{raw}'"))?;
    let column = column.parse::<CategoryColumn>().map_err(|err| err.to_string())?;
    Ok((column, query.to_string()))
}

fn parse_move(raw: &str) -> Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{raw}'"))?;
    let from = from.trim().parse().map_err(|_| format!("invalid index '{from}'"))?;
    let to = to.trim().parse().map_err(|_| format!("invalid index '{to}'"))?;
    Ok((from, to))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = normalize_database_url(&database_url);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        settings.fetch_timeout_secs = timeout_secs.max(1);
    }
    info!(
        "budget: api_url={} database_url={}",
        settings.api_url, settings.database_url
    );

    let storage: Arc<dyn KeyValueStore> = Arc::new(Storage::new(&settings.database_url).await?);
    let client = BudgetClient::connect(
        ClientOptions {
            api_url: settings.api_url.clone(),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
        },
        storage,
    )
    .await?;

    match cli.command {
        Command::Login { email, password } => {
            let snapshot = client
                .sign_in(&LoginForm { email, password })
                .await
                .map_err(report_auth_error)?;
            match snapshot.user {
                Some(user) => println!("Signed in as {} <{}>", user.username, user.email),
                None => println!("Signed in"),
            }
        }
        Command::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            client
                .sign_up(&RegisterForm {
                    username,
                    email,
                    password,
                    confirm_password,
                })
                .await
                .map_err(report_auth_error)?;
            println!("Account created. Sign in with `budget login`.");
        }
        Command::Logout => {
            client.sign_out().await;
            println!("Signed out");
        }
        Command::Whoami => {
            let snapshot = client.session().snapshot().await;
            match (snapshot.token.is_some(), snapshot.user) {
                (false, _) => println!("Not signed in"),
                (true, Some(user)) => {
                    println!("{} <{}> (id {})", user.username, user.email, user.id)
                }
                (true, None) => println!("Signed in (no profile stored)"),
            }
        }
        Command::Categories(command) => run_categories(&client, command).await?,
    }

    Ok(())
}

async fn run_categories(client: &BudgetClient, command: CategoriesCommand) -> Result<()> {
    if client.landing_route().await == Route::Login {
        bail!("not signed in; run `budget login` first");
    }
    let controller = client.open_categories().await.map_err(report_auth_error)?;

    match command {
        CategoriesCommand::List(args) => {
            let mut attempts = 0;
            while controller.snapshot().await.error.is_some() && attempts < args.retries {
                attempts += 1;
                eprintln!("Retrying ({attempts}/{})...", args.retries);
                controller.retry().await;
            }
            print_table(&controller, &args).await?;
        }
        CategoriesCommand::Create {
            name,
            description,
            inactive,
            household_id,
        } => {
            let draft = CategoryDraft {
                name,
                description,
                is_active: !inactive,
                household_id: household_id.map(HouseholdId),
            };
            let outcome = controller.create(draft).await.map_err(report_mutation_error)?;
            println!("Category created");
            after_mutation(&controller, outcome).await?;
        }
        CategoriesCommand::Update {
            id,
            name,
            description,
            active,
            household_id,
        } => {
            let patch = CategoryPatch {
                name,
                description,
                is_active: active,
                household_id: household_id.map(HouseholdId),
            };
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let outcome = controller
                .update(CategoryId(id), patch)
                .await
                .map_err(report_mutation_error)?;
            println!("Category {id} updated");
            after_mutation(&controller, outcome).await?;
        }
        CategoriesCommand::Delete { id } => {
            let outcome = controller
                .delete(CategoryId(id))
                .await
                .map_err(report_mutation_error)?;
            println!("Category {id} deleted");
            after_mutation(&controller, outcome).await?;
        }
    }

    Ok(())
}

async fn print_table(controller: &CategoryListController, args: &ListArgs) -> Result<()> {
    let snapshot = controller.snapshot().await;
    if let Some(error) = &snapshot.error {
        eprintln!("{error} (retry with --retries N)");
        if snapshot.rows.is_empty() {
            bail!("categories unavailable");
        }
    }

    let selected = controller
        .update_view(|view, rows| -> Result<_> {
            if let Some(column) = args.sort {
                let direction = if args.desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                view.set_sort(column, direction);
            }
            for (column, query) in &args.filters {
                view.set_filter(*column, query.clone());
            }
            for column in &args.hidden {
                view.set_column_visible(*column, false)?;
            }
            for column in &args.shown {
                view.set_column_visible(*column, true)?;
            }
            if let Some(page_size) = args.page_size {
                view.set_page_size(page_size)?;
            }
            view.set_page(args.page.saturating_sub(1), rows);
            for id in &args.selected {
                view.set_row_selected(CategoryId(*id), true);
            }
            Ok(view.selected_ids())
        })
        .await?;

    for (from, to) in &args.moves {
        let page = controller.page().await;
        let (Some(active), Some(over)) = (page.rows.get(*from), page.rows.get(*to)) else {
            bail!(
                "cannot move row {from} to {to}: the page shows {} row(s)",
                page.rows.len()
            );
        };
        controller.move_row_by_id(active.id, over.id).await;
    }

    let page = controller.page().await;
    print!("{}", render::render_page(&page, &selected));
    Ok(())
}

async fn after_mutation(controller: &CategoryListController, outcome: FetchOutcome) -> Result<()> {
    if let FetchOutcome::Failed { message } = &outcome {
        eprintln!("{message}");
    }
    print_table(controller, &ListArgs::default()).await
}

fn report_auth_error(err: AuthError) -> anyhow::Error {
    match err {
        AuthError::Validation(errors) => report_field_errors(&errors),
        AuthError::Unauthenticated => anyhow!("not signed in; run `budget login` first"),
        other => anyhow!(other),
    }
}

fn report_mutation_error(err: MutationError) -> anyhow::Error {
    match err {
        MutationError::Validation(errors) => report_field_errors(&errors),
        other => anyhow!(other),
    }
}

fn report_field_errors(errors: &ValidationErrors) -> anyhow::Error {
    for (field, message) in field_messages(errors) {
        eprintln!("  {field}: {message}");
    }
    anyhow!("please correct the highlighted fields")
}
