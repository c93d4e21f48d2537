mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{
    controller::preferences::PreferenceEdit, FileSessionStore, HttpTripPlannerApi, Navigation,
    PlannerRuntime, RuntimeConfig, Screen, Session, UiAction, Update,
};
use shared::domain::{Activity, AuthMode, CredentialField, GroupSize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "planner", about = "Plan a trip and watch the itinerary unfold")]
struct Args {
    /// Path to a TOML config file (default: ./planner.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Request a password-reset email.
    Reset {
        #[arg(long)]
        email: String,
        /// Accepted for parity with the reset form; the request only carries the email.
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Submit trip preferences and reveal the generated itinerary. Omitted values fall
    /// back to the stored preferences of the logged-in user.
    Plan {
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Budget in INR.
        #[arg(long)]
        budget: Option<String>,
        /// Repeat for several activities (Hiking, Beach, "City Tour", Adventure, Relaxation).
        #[arg(long = "activity")]
        activities: Vec<Activity>,
        /// One of 1, 2, 3-5, 6+.
        #[arg(long)]
        group_size: Option<GroupSize>,
    },
    /// Fetch and reveal the latest itinerary.
    Show,
    /// Forget the stored session.
    Logout,
    /// Print the stored session.
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(session_file) = args.session_file {
        settings.session_file = session_file;
    }

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(FileSessionStore::new(&settings.session_file));
    let session = Session::init(store).context("failed to load stored session")?;
    let api =
        HttpTripPlannerApi::with_timeout(&settings.api_base_url, settings.request_timeout())?;
    info!(api = %api.base_url(), "planner client starting");
    let mut runtime = PlannerRuntime::new(
        Arc::new(api),
        session,
        RuntimeConfig {
            reveal_interval: settings.reveal_interval(),
        },
    );

    match args.command {
        Command::Signup {
            username,
            email,
            phone,
            password,
        } => {
            authenticate(
                &mut runtime,
                AuthMode::Signup,
                vec![
                    (CredentialField::Username, username),
                    (CredentialField::Email, email),
                    (CredentialField::Phone, phone),
                    (CredentialField::Password, password),
                ],
            )
            .await
        }
        Command::Login { email, password } => {
            authenticate(
                &mut runtime,
                AuthMode::Login,
                vec![
                    (CredentialField::Email, email),
                    (CredentialField::Password, password),
                ],
            )
            .await?;
            if runtime.screen() == Screen::Preferences {
                let who = runtime
                    .session()
                    .current()
                    .and_then(|record| record.username.clone())
                    .unwrap_or_else(|| "user".into());
                println!("Logged in as {who}");
            }
            Ok(())
        }
        Command::Reset {
            email,
            new_password,
        } => {
            let mut fields = vec![(CredentialField::Email, email)];
            if let Some(new_password) = new_password {
                fields.push((CredentialField::NewPassword, new_password));
            }
            authenticate(&mut runtime, AuthMode::ResetRequest, fields).await
        }
        Command::Plan {
            destination,
            start,
            end,
            budget,
            activities,
            group_size,
        } => {
            runtime.dispatch(UiAction::Navigate(Navigation::Preferences));
            runtime.run_until_settled().await;

            let mut edits = Vec::new();
            edits.extend(destination.map(PreferenceEdit::Destination));
            edits.extend(start.map(|date| PreferenceEdit::StartDate(Some(date))));
            edits.extend(end.map(|date| PreferenceEdit::EndDate(Some(date))));
            edits.extend(budget.map(PreferenceEdit::Budget));
            edits.extend(group_size.map(|size| PreferenceEdit::GroupSize(Some(size))));
            if !activities.is_empty() {
                edits.extend(Activity::CATALOG.into_iter().map(|activity| {
                    PreferenceEdit::SetActivity(activity, activities.contains(&activity))
                }));
            }
            for edit in edits {
                runtime.dispatch(UiAction::EditPreferences(edit));
            }

            if let Update::Rejected(err) = runtime.dispatch(UiAction::SubmitPreferences) {
                bail!("{}", err.user_message());
            }
            present_itinerary(&mut runtime).await
        }
        Command::Show => {
            runtime.dispatch(UiAction::Navigate(Navigation::Itinerary { forwarded: None }));
            present_itinerary(&mut runtime).await
        }
        Command::Logout => {
            if let Update::Rejected(err) = runtime.dispatch(UiAction::Logout) {
                bail!("{}", err.user_message());
            }
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            match runtime.session().current() {
                Some(record) => println!(
                    "Logged in as {} (user id {})",
                    record.username.as_deref().unwrap_or("unknown"),
                    record
                        .user_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".into())
                ),
                None => println!("Not logged in"),
            }
            Ok(())
        }
    }
}

async fn authenticate(
    runtime: &mut PlannerRuntime,
    mode: AuthMode,
    fields: Vec<(CredentialField, String)>,
) -> Result<()> {
    runtime.dispatch(UiAction::SwitchAuthMode(mode));
    for (field, value) in fields {
        runtime.dispatch(UiAction::EditCredential(field, value));
    }
    if let Update::Rejected(err) = runtime.dispatch(UiAction::SubmitAuth) {
        bail!("{}", err.user_message());
    }

    match runtime.step().await {
        Some(Update::Rejected(err)) => bail!("{}", err.user_message()),
        Some(_) => {}
        None => bail!("no response from the planner API"),
    }
    if let Some(message) = runtime.auth().info_message() {
        println!("{message}");
    }
    Ok(())
}

async fn present_itinerary(runtime: &mut PlannerRuntime) -> Result<()> {
    while let Some(update) = runtime.step().await {
        match update {
            Update::Rejected(err) => bail!("{}", err.user_message()),
            Update::ItineraryFailed(text) => bail!("{text}"),
            Update::ItineraryResolved { days: 0 } => println!("No days planned yet."),
            Update::DayRevealed { index } => {
                if let Some(day) = runtime
                    .itinerary()
                    .and_then(|itinerary| itinerary.visible_days().get(index))
                {
                    print!("{}", render::day(day));
                }
            }
            _ => {}
        }
    }

    if let Some(itinerary) = runtime.itinerary() {
        if !itinerary.visible_days().is_empty() {
            print!(
                "{}",
                render::map(itinerary.map_center(), &itinerary.markers())
            );
        }
    }
    Ok(())
}
