use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use stockkid::auth::{AuthState, SystemClock, TokenPair};
use stockkid::net::ApiClient;
use stockkid::persist::DirStore;
use stockkid::state::{Breakpoint, PanelCode, PanelError, PanelId, PanelStatePatch, ScreenId};
use stockkid::{AppContext, Config, ContextError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("storage unavailable: {0}")]
    Storage(#[from] stockkid::persist::StorageError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("api client: {0}")]
    Api(#[from] stockkid::net::ApiError),
    #[error("no screen at index {0}")]
    NoScreen(usize),
    #[error("unknown panel code `{0}`")]
    UnknownPanelCode(String),
    #[error("unknown panel `{0}`")]
    UnknownPanel(String),
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error("unknown breakpoint `{0}`")]
    UnknownBreakpoint(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("tokens rejected: malformed or already expired")]
    TokensRejected,
}

#[derive(Parser, Debug)]
#[command(name = "stockkid", about = "StockKid dashboard state CLI")]
struct Cli {
    #[arg(long, env = "STOCKKID_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Screen(ScreenCommand),
    Panel(PanelCommand),
    Layout(LayoutCommand),
    Auth(AuthCommand),
    /// Print the persisted workspace slices as JSON.
    Export,
}

#[derive(Args, Debug)]
struct ScreenCommand {
    #[command(subcommand)]
    command: ScreenSubcommand,
}

#[derive(Subcommand, Debug)]
enum ScreenSubcommand {
    Add,
    Remove { index: usize },
    Move { from: usize, to: usize },
    Copy { index: usize },
    List,
}

#[derive(Args, Debug)]
struct PanelCommand {
    #[command(subcommand)]
    command: PanelSubcommand,
}

#[derive(Subcommand, Debug)]
enum PanelSubcommand {
    Add {
        screen_index: usize,
        code: String,
    },
    Remove {
        screen_index: usize,
        panel_id: String,
    },
    /// Merge a JSON patch into a panel's state.
    Set {
        panel_id: String,
        patch: String,
    },
}

#[derive(Args, Debug)]
struct LayoutCommand {
    #[command(subcommand)]
    command: LayoutSubcommand,
}

#[derive(Subcommand, Debug)]
enum LayoutSubcommand {
    Show {
        screen_index: usize,
        #[arg(long, help = "Only this tier (lg, md, sm, xs, xxs)")]
        breakpoint: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Status,
    /// Adopt an already issued token pair.
    Login {
        access_token: String,
        refresh_token: String,
    },
    /// Log in against the backend with username and password.
    Signin {
        username: String,
        #[arg(long, env = "STOCKKID_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }

    let store = Arc::new(DirStore::open(&config.storage_dir)?);
    let mut ctx = AppContext::load(store, Arc::new(SystemClock));

    match cli.command {
        Command::Screen(screen) => run_screen(&mut ctx, screen),
        Command::Panel(panel) => run_panel(&mut ctx, panel),
        Command::Layout(layout) => run_layout(&ctx, layout),
        Command::Auth(auth) => run_auth(&mut ctx, &config, auth).await,
        Command::Export => run_export(&ctx),
    }
}

type Ctx = AppContext<DirStore>;

fn run_screen(ctx: &mut Ctx, screen: ScreenCommand) -> Result<(), CliError> {
    match screen.command {
        ScreenSubcommand::Add => {
            let id = ctx.add_screen()?;
            println!("{id}");
        }
        ScreenSubcommand::Remove { index } => {
            let id = ctx.remove_screen(index)?;
            println!("removed {id}");
        }
        ScreenSubcommand::Move { from, to } => {
            ctx.move_screen(from, to)?;
            print_screens(ctx);
        }
        ScreenSubcommand::Copy { index } => {
            let id = ctx.copy_screen(index)?;
            println!("{id}");
        }
        ScreenSubcommand::List => print_screens(ctx),
    }
    Ok(())
}

fn print_screens(ctx: &Ctx) {
    let workspace = ctx.workspace();
    for (index, id) in workspace.list().iter().enumerate() {
        let panels = workspace.screens().get(id).map_or(0, |s| s.panel_ids.len());
        println!("{index}\t{id}\t{panels} panels");
    }
}

fn run_panel(ctx: &mut Ctx, panel: PanelCommand) -> Result<(), CliError> {
    match panel.command {
        PanelSubcommand::Add { screen_index, code } => {
            let code = PanelCode::parse(&code).ok_or(CliError::UnknownPanelCode(code))?;
            let screen_id = screen_id_at(ctx, screen_index)?;
            let id = ctx.add_panel(&screen_id, code, None)?;
            println!("{id}");
        }
        PanelSubcommand::Remove { screen_index, panel_id } => {
            let screen_id = screen_id_at(ctx, screen_index)?;
            ctx.remove_panel(&screen_id, &PanelId::from(panel_id))?;
        }
        PanelSubcommand::Set { panel_id, patch } => {
            let panel_id = PanelId::from(panel_id);
            let value: Value = serde_json::from_str(&patch)?;
            let code = ctx
                .workspace()
                .panels()
                .get(&panel_id)
                .map(|p| p.panel_code)
                .ok_or_else(|| CliError::UnknownPanel(panel_id.to_string()))?;
            let patch = PanelStatePatch::from_json(code, value)?;
            ctx.update_panel_state(&panel_id, patch)?;
            if let Some(panel) = ctx.workspace().panels().get(&panel_id) {
                print_json(&serde_json::to_value(panel)?)?;
            }
        }
    }
    Ok(())
}

fn screen_id_at(ctx: &Ctx, index: usize) -> Result<ScreenId, CliError> {
    ctx.workspace()
        .list()
        .get(index)
        .cloned()
        .ok_or(CliError::NoScreen(index))
}

fn run_layout(ctx: &Ctx, layout: LayoutCommand) -> Result<(), CliError> {
    match layout.command {
        LayoutSubcommand::Show { screen_index, breakpoint } => {
            let screen_id = screen_id_at(ctx, screen_index)?;
            let Some(screen) = ctx.workspace().screens().get(&screen_id) else {
                return Err(CliError::NoScreen(screen_index));
            };
            let json = match breakpoint {
                Some(name) => {
                    let bp = Breakpoint::parse(&name).map_err(|_| CliError::UnknownBreakpoint(name))?;
                    serde_json::to_value(screen.layouts.tier(bp))?
                }
                None => serde_json::to_value(&screen.layouts)?,
            };
            print_json(&json)?;
        }
    }
    Ok(())
}

async fn run_auth(ctx: &mut Ctx, config: &Config, auth: AuthCommand) -> Result<(), CliError> {
    match auth.command {
        AuthSubcommand::Status => print_auth(ctx),
        AuthSubcommand::Login { access_token, refresh_token } => {
            let transition = ctx.login(TokenPair { access_token, refresh_token })?;
            if !ctx.auth().is_authenticated() {
                tracing::warn!(?transition, "login refused");
                return Err(CliError::TokensRejected);
            }
            print_auth(ctx);
        }
        AuthSubcommand::Signin { username, password } => {
            let api = ApiClient::new(&config.api_base_url, config.request_timeout)?;
            ctx.sign_in(&api, &config.login_path, &username, &password).await?;
            print_auth(ctx);
        }
        AuthSubcommand::Logout => {
            ctx.logout()?;
            println!("logged out");
        }
    }
    Ok(())
}

fn print_auth(ctx: &Ctx) {
    match ctx.auth() {
        AuthState::Anonymous => println!("anonymous"),
        AuthState::Authenticated { claims, .. } => {
            let remaining = ctx.remaining().map_or(0, |d| d.as_secs());
            println!(
                "authenticated as {} (expires in {remaining}s)",
                claims.display_name().unwrap_or("?")
            );
        }
    }
}

fn run_export(ctx: &Ctx) -> Result<(), CliError> {
    let workspace = ctx.workspace();
    let json = serde_json::json!({
        "virtualScreenUuidList": workspace.list(),
        "screens": workspace.screens(),
        "panels": workspace.panels(),
    });
    print_json(&json)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
