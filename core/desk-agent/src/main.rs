//! desk-agent: CLI driver for Opsdesk agent sessions.
//!
//! Stands in for the browser host page: every invocation logs in (which
//! recovers the day state from the device cache, the shared store, or
//! fresh), applies one action, flushes, and exits. Because recovery is
//! idempotent, repeated invocations over a day behave like one continuous
//! session on this device.
//!
//! ## Subcommands
//!
//! - `status`: switch to a new work status
//! - `usage`: print live minute totals
//! - `watch`: run the periodic tick loop in the foreground
//! - `logout`: force `unavailable` and flush a final snapshot

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use desk_core::clock::SystemClock;
use desk_core::{
    config, format_minutes, AgentSession, DayCache, DeskConfig, DeskError, JsonSnapshotStore,
    SessionEvent, SessionHandle,
};
use desk_protocol::{Role, Status, UserProfile};

#[derive(Parser)]
#[command(name = "desk-agent")]
#[command(about = "Opsdesk agent status driver")]
#[command(version)]
struct Cli {
    /// Agent identifier assigned by the identity provider
    #[arg(long)]
    user_id: String,

    /// Display name shown on the supervisor board (defaults to the id)
    #[arg(long)]
    name: Option<String>,

    /// Role tag: agent or supervisor
    #[arg(long, default_value = "agent")]
    role: String,

    /// Snapshot store file (defaults to ~/.opsdesk/snapshots.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Day cache file (defaults to ~/.opsdesk/day-cache.json)
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch to a new work status
    Status {
        /// One of: operating, break, meeting, handling, unavailable
        #[arg(value_name = "STATUS")]
        status: String,
    },

    /// Print live minute totals for today
    Usage {
        /// Emit JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Run the periodic tick loop in the foreground
    Watch {
        /// Stop after this many ticks (runs until killed if omitted)
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// End the session: force unavailable and flush
    Logout,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "desk-agent failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let name = cli.name.clone().unwrap_or_else(|| cli.user_id.clone());
    let profile = UserProfile::new(cli.user_id.clone(), name, parse_role(&cli.role)?);

    let store_path = cli
        .store
        .or_else(config::default_store_path)
        .ok_or("Cannot resolve the snapshot store path (no home directory)")?;
    let cache_path = cli
        .cache
        .or_else(config::default_cache_path)
        .ok_or("Cannot resolve the day cache path (no home directory)")?;

    let desk_config = DeskConfig::from_env();
    let session = AgentSession::login(
        profile,
        desk_config.clone(),
        DayCache::new(cache_path),
        Arc::new(JsonSnapshotStore::new(store_path)),
        Arc::new(SystemClock),
    );

    match cli.command {
        Commands::Status { status } => set_status(session, &status),
        Commands::Usage { json } => print_usage(&session, &desk_config, json),
        Commands::Watch { ticks } => watch(session, &desk_config, ticks),
        Commands::Logout => {
            let mut session = session;
            session.logout();
            println!("Logged out; status is now {}", Status::Unavailable.label());
            Ok(())
        }
    }
}

fn set_status(mut session: AgentSession, raw: &str) -> Result<(), String> {
    let status: Status = raw.parse().map_err(|err| format!("{}", err))?;
    match session.set_status(status) {
        Ok(()) => {
            println!("Status set to {}", status.label());
            Ok(())
        }
        Err(DeskError::InvalidTransition { used, limit }) => Err(format!(
            "cannot enter break: {:.0} of {:.0} budget minutes already used",
            used, limit
        )),
        Err(err) => Err(err.to_string()),
    }
}

fn print_usage(session: &AgentSession, config: &DeskConfig, json: bool) -> Result<(), String> {
    let live = session.live_usage();
    let status = session.status();

    if json {
        let value = serde_json::json!({
            "status": status,
            "operating": live.operating,
            "breakUsed": live.break_used,
            "meeting": live.meeting,
            "handling": live.handling,
            "unavailable": live.unavailable,
            "workedMinutes": live.worked_minutes(),
            "workTargetMinutes": config.work_target_min,
        });
        println!("{}", value);
        return Ok(());
    }

    println!("Current status: {}", status.label());
    println!("  operating:   {}", format_minutes(live.operating));
    println!(
        "  break:       {} of {}",
        format_minutes(live.break_used),
        format_minutes(config.break_limit_min)
    );
    println!("  meeting:     {}", format_minutes(live.meeting));
    println!("  handling:    {}", format_minutes(live.handling));
    println!("  unavailable: {}", format_minutes(live.unavailable));
    println!(
        "  worked:      {} of {}",
        format_minutes(live.worked_minutes()),
        format_minutes(config.work_target_min)
    );
    Ok(())
}

fn watch(session: AgentSession, config: &DeskConfig, ticks: Option<u64>) -> Result<(), String> {
    println!(
        "Watching (tick every {}s, Ctrl-C to stop)...",
        config.tick_interval.as_secs()
    );

    let handle = SessionHandle::start(session);
    let events = handle.subscribe();
    let mut seen: u64 = 0;

    loop {
        match events.recv() {
            Ok(SessionEvent::Usage(live)) => {
                println!(
                    "worked {} │ break {} │ status {}",
                    format_minutes(live.worked_minutes()),
                    format_minutes(live.break_used),
                    handle.status().label()
                );
                seen += 1;
                if let Some(limit) = ticks {
                    if seen >= limit {
                        break;
                    }
                }
            }
            Ok(SessionEvent::BreakLimitReached(notice)) => {
                eprintln!("{}", notice.message());
            }
            Ok(SessionEvent::StatusChanged(status)) => {
                println!("status changed to {}", status.label());
            }
            Err(_) => break,
        }
    }

    // The watch window is over, not the workday: stop ticking but leave
    // the session resumable from its last flush.
    drop(handle);
    Ok(())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    match raw.to_ascii_lowercase().as_str() {
        "agent" => Ok(Role::Agent),
        "supervisor" => Ok(Role::Supervisor),
        other => Err(format!(
            "unknown role '{}' (expected agent or supervisor)",
            other
        )),
    }
}
