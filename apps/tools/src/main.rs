use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::session::{TOKEN_KEY, USER_KEY};
use shared::domain::UserProfile;
use storage::{KeyValueStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "BUDGET_DATABASE_URL")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print what a client would restore on start.
    ShowSession,
    /// Remove the stored token and user.
    ClearSession,
    /// Remove the stored user entry if it no longer parses.
    RepairUser,
    ListKeys,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    storage.health_check().await?;

    match cli.command {
        Command::ShowSession => {
            let token = storage.get(TOKEN_KEY).await?;
            println!("token={}", if token.is_some() { "present" } else { "absent" });
            match storage.get(USER_KEY).await? {
                None => println!("user=absent"),
                Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                    Ok(user) => println!(
                        "user id={} username={} email={}",
                        user.id, user.username, user.email
                    ),
                    Err(err) => println!("user=corrupt ({err})"),
                },
            }
        }
        Command::ClearSession => {
            for key in [TOKEN_KEY, USER_KEY] {
                storage
                    .remove(key)
                    .await
                    .with_context(|| format!("failed to remove '{key}'"))?;
            }
            println!("session cleared");
        }
        Command::RepairUser => match storage.get(USER_KEY).await? {
            Some(raw) if serde_json::from_str::<UserProfile>(&raw).is_err() => {
                storage.remove(USER_KEY).await?;
                println!("removed corrupt user entry");
            }
            Some(_) => println!("user entry is valid"),
            None => println!("no user entry"),
        },
        Command::ListKeys => {
            for key in storage.keys().await? {
                println!("{key}");
            }
        }
    }

    Ok(())
}
