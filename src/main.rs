//! Command-line front end.
//!
//! Every command builds the configured store, loads the signed-in user's records into an
//! [`AppState`], feeds one or more [`Event`]s through [`handle_event`] and carries out
//! the returned [`Action`]s:
//!
//! - `Alert` is printed to stderr and makes the command fail
//! - `Confirm` asks on the terminal unless `--yes` was given
//! - `Download` is written into the export directory
//! - `SignedOut` removes the saved session
//!
//! Running `miley` without a command shows the dashboard.

#![allow(clippy::multiple_crate_versions)]

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use miley::app::DeleteTarget;
use miley::domain::{SessionUser, VehicleForm};
use miley::export::Download;
use miley::storage::{JsonStore, PostgrestStore, RemoteStore, Session};
use miley::{handle_event, initialize, observability, ui, Action, AppState, Backend, Config, Event};
use miley::{MileyError, Result};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Account used by the `file` backend.
const LOCAL_USER_ID: &str = "local";

#[derive(Parser)]
#[command(name = "miley", version)]
#[command(about = "Track motorcycle fuel mileage")]
#[command(
    after_help = "Environment:\n  MILEY_BACKEND            postgrest or file\n  MILEY_SUPABASE_URL       Hosted project URL\n  MILEY_SUPABASE_ANON_KEY  Hosted project anon key\n  MILEY_EXPORT_DIR         Where CSV exports are written\n  MILEY_LOG                Log filter"
)]
struct Cli {
    /// Configuration file (default: ~/.config/miley/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the hosted store
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// End the session and forget the saved credentials
    Logout,
    /// Print the signed-in user
    Whoami,
    /// Show the dashboard
    Show,
    Vehicle {
        #[command(subcommand)]
        command: VehicleCommand,
    },
    Fillup {
        #[command(subcommand)]
        command: FillupCommand,
    },
    /// Export every fillup as CSV
    Export {
        /// Directory to write into (default: configured export directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum VehicleCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        model: String,
    },
    List,
    /// Delete a vehicle and all of its fillups
    Delete {
        id: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum FillupCommand {
    /// Record a fillup; a missing liters or cost is estimated from the other
    Add {
        #[arg(long)]
        vehicle: String,
        #[arg(long)]
        odometer: u32,
        #[arg(long)]
        liters: Option<f64>,
        #[arg(long)]
        cost: Option<f64>,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        pump: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        odometer: Option<u32>,
        #[arg(long)]
        liters: Option<f64>,
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        pump: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// A loaded application bound to its store.
struct App {
    state: AppState,
    store: Box<dyn RemoteStore>,
    config: Config,
    export_dir: PathBuf,
    assume_yes: bool,
}

impl App {
    /// Signs in through the store's session and loads the user's records.
    fn open(config: &Config) -> Result<Option<Self>> {
        let store = open_store(config)?;
        let user = store.current_user()?;
        let today = Local::now().date_naive();

        let mut app = Self {
            state: initialize(config, user, today),
            store,
            config: config.clone(),
            export_dir: config.export_dir.clone(),
            assume_yes: false,
        };
        Ok(app.dispatch(Event::Load).then_some(app))
    }

    /// Runs `event` and carries out its actions. Returns `false` if anything failed.
    fn dispatch(&mut self, event: Event) -> bool {
        let (_, actions) = handle_event(&mut self.state, self.store.as_mut(), &event);

        let mut ok = true;
        for action in actions {
            ok &= self.perform(action);
        }
        ok
    }

    fn perform(&mut self, action: Action) -> bool {
        match action {
            Action::Alert(message) => {
                eprintln!("{message}");
                false
            }
            Action::Confirm { prompt } => {
                if self.assume_yes || confirm(&prompt) {
                    self.dispatch(Event::ConfirmDelete)
                } else {
                    println!("Cancelled.");
                    self.dispatch(Event::CloseDialog)
                }
            }
            Action::Download(download) => match write_download(&self.export_dir, &download) {
                Ok(path) => {
                    println!("Exported {}", path.display());
                    true
                }
                Err(e) => {
                    eprintln!("Error exporting data: {e}");
                    false
                }
            },
            Action::SignedOut => match Session::forget(&self.config.session_path()) {
                Ok(()) => {
                    println!("Signed out.");
                    true
                }
                Err(e) => {
                    eprintln!("{e}");
                    false
                }
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    observability::init_tracing(&config);

    let command = cli.command.unwrap_or(Commands::Show);
    match run(command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            match e {
                MileyError::Auth(_) => eprintln!("{e}. Run `miley login` first."),
                _ => eprintln!("{e}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Login { email, password } => login(config, &email, password),
        Commands::Logout => logout(config),
        Commands::Whoami => {
            let user = open_store(config)?.current_user()?;
            println!("{} ({})", user.email.as_deref().unwrap_or("no email"), user.id);
            Ok(true)
        }
        command => {
            let Some(mut app) = App::open(config)? else {
                return Ok(false);
            };
            Ok(run_with_app(&mut app, command))
        }
    }
}

fn run_with_app(app: &mut App, command: Commands) -> bool {
    match command {
        Commands::Show => {
            let stdout = io::stdout();
            match ui::render(&app.state, &mut stdout.lock()) {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("{e}");
                    false
                }
            }
        }
        Commands::Vehicle { command } => run_vehicle(app, command),
        Commands::Fillup { command } => run_fillup(app, command),
        Commands::Export { output } => {
            if let Some(dir) = output {
                app.export_dir = dir;
            }
            app.dispatch(Event::Export)
        }
        Commands::Login { .. } | Commands::Logout | Commands::Whoami => true,
    }
}

fn run_vehicle(app: &mut App, command: VehicleCommand) -> bool {
    match command {
        VehicleCommand::Add { name, model } => {
            app.dispatch(Event::OpenAddVehicle);
            app.state.vehicle_form = VehicleForm::new(name, model);
            let before = app.state.vehicles.len();
            if !app.dispatch(Event::SubmitVehicle) {
                return false;
            }
            match app.state.vehicles.get(before) {
                Some(vehicle) => {
                    println!("Added {} [{}]", vehicle.label(), vehicle.id);
                    true
                }
                None => {
                    eprintln!("A motorcycle needs a name.");
                    false
                }
            }
        }
        VehicleCommand::List => {
            for card in app.state.compute_viewmodel().cards {
                let average = card.average.map_or_else(String::new, |a| format!(", {a} km/l"));
                println!("{}  {} ({} fillups{average})", card.id, card.title, card.fillup_count);
            }
            true
        }
        VehicleCommand::Delete { id, yes } => {
            app.assume_yes = yes;
            delete(app, DeleteTarget::Vehicle(id))
        }
    }
}

fn run_fillup(app: &mut App, command: FillupCommand) -> bool {
    match command {
        FillupCommand::Add {
            vehicle,
            odometer,
            liters,
            cost,
            date,
            pump,
        } => {
            if app.state.vehicle(&vehicle).is_none() {
                eprintln!("No motorcycle with id {vehicle}.");
                return false;
            }
            app.dispatch(Event::OpenAddFillup {
                vehicle_id: Some(vehicle),
            });
            let form = &mut app.state.fillup_form;
            form.odometer = Some(odometer);
            form.liters = liters;
            form.cost = cost;
            form.pump_name = pump;
            if let Some(date) = date {
                form.date = date;
            }

            let before = app.state.fillups.len();
            if !app.dispatch(Event::SubmitFillup) {
                return false;
            }
            match app.state.fillups.get(before) {
                Some(fillup) => {
                    println!(
                        "Added fillup [{}]: {:.2} L, {:.2} INR",
                        fillup.id, fillup.liters, fillup.cost
                    );
                    true
                }
                None => {
                    eprintln!("A fillup needs a non-negative --liters or --cost.");
                    false
                }
            }
        }
        FillupCommand::Edit {
            id,
            date,
            odometer,
            liters,
            cost,
            pump,
        } => {
            if !app.dispatch(Event::EditFillup(id.clone())) || app.state.editing.is_none() {
                eprintln!("No fillup with id {id}.");
                return false;
            }
            if let Some(edit) = app.state.editing.as_mut() {
                if let Some(date) = date {
                    edit.date = date;
                }
                if let Some(odometer) = odometer {
                    edit.odometer = odometer;
                }
                if let Some(liters) = liters {
                    edit.liters = liters;
                }
                if let Some(cost) = cost {
                    edit.cost = cost;
                }
                if let Some(pump) = pump {
                    edit.pump_name = pump;
                }
            }
            if !app.dispatch(Event::SubmitEdit) {
                return false;
            }
            let updated = app.state.editing.is_none();
            if updated {
                println!("Updated fillup [{id}].");
            } else {
                eprintln!("Liters and cost must be non-negative numbers.");
            }
            updated
        }
        FillupCommand::Delete { id, yes } => {
            app.assume_yes = yes;
            delete(app, DeleteTarget::Fillup(id))
        }
    }
}

fn delete(app: &mut App, target: DeleteTarget) -> bool {
    if app.state.delete_prompt(&target).is_none() {
        eprintln!("Nothing to delete.");
        return false;
    }
    app.dispatch(Event::RequestDelete(target))
}

fn login(config: &Config, email: &str, password: Option<String>) -> Result<bool> {
    if config.backend == Backend::File {
        println!("The file backend does not need a sign-in.");
        return Ok(true);
    }

    let password = match password {
        Some(password) => password,
        None => read_line("Password: ")?,
    };

    let (url, key) = hosted_project(config)?;
    let mut store = PostgrestStore::new(url, key, None)?;
    let session = store.sign_in_with_password(email, &password)?;
    session.save(&config.session_path())?;

    println!(
        "Signed in as {}.",
        session.user.email.as_deref().unwrap_or(&session.user.id)
    );
    Ok(true)
}

fn logout(config: &Config) -> Result<bool> {
    let session_path = config.session_path();
    if config.backend == Backend::Postgrest && Session::load(&session_path)?.is_none() {
        println!("Not signed in.");
        return Ok(true);
    }

    let store = open_store(config)?;
    let user = match store.current_user() {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "session no longer valid, forgetting it");
            Session::forget(&session_path)?;
            println!("Signed out.");
            return Ok(true);
        }
    };

    let mut app = App {
        state: initialize(config, user, Local::now().date_naive()),
        store,
        config: config.clone(),
        export_dir: config.export_dir.clone(),
        assume_yes: true,
    };
    Ok(app.dispatch(Event::SignOut))
}

fn open_store(config: &Config) -> Result<Box<dyn RemoteStore>> {
    match config.backend {
        Backend::Postgrest => {
            let (url, key) = hosted_project(config)?;
            let session_path = config.session_path();
            let session = Session::load(&session_path)?;
            let store = PostgrestStore::new(url, key, session)?.with_session_file(session_path);
            Ok(Box::new(store))
        }
        Backend::File => {
            let user = SessionUser {
                id: LOCAL_USER_ID.to_string(),
                email: None,
            };
            Ok(Box::new(JsonStore::open(config.store_path(), user)?))
        }
    }
}

fn hosted_project(config: &Config) -> Result<(&str, &str)> {
    let url = config
        .supabase_url
        .as_deref()
        .ok_or_else(|| MileyError::Config("supabase_url is not set".to_string()))?;
    let key = config
        .supabase_anon_key
        .as_deref()
        .ok_or_else(|| MileyError::Config("supabase_anon_key is not set".to_string()))?;
    Ok((url, key))
}

fn write_download(dir: &Path, download: &Download) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&download.file_name);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(download.contents.as_bytes())?;
    file.flush()?;
    Ok(path)
}

fn confirm(prompt: &str) -> bool {
    match read_line(&format!("{prompt} [y/N] ")) {
        Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
