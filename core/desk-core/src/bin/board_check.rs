//! Debug utility for inspecting the snapshot store and supervisor board.

use desk_core::clock::{Clock, SystemClock};
use desk_core::{board_for_day, config, format_minutes, JsonSnapshotStore};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let day = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| SystemClock.day_key());

    let store_path = match args.get(2) {
        Some(path) => std::path::PathBuf::from(path),
        None => match config::default_store_path() {
            Some(path) => path,
            None => {
                eprintln!("Could not resolve the default store path (no home directory)");
                std::process::exit(1);
            }
        },
    };

    println!("═══════════════════════════════════════════════════════════");
    println!("  Opsdesk Board Check");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Store file: {}", store_path.display());
    println!("Day:        {}", day);
    println!();

    let store = JsonSnapshotStore::new(&store_path);
    let board = match board_for_day(&store, &day) {
        Ok(board) => board,
        Err(err) => {
            eprintln!("Failed to read the board: {}", err);
            std::process::exit(1);
        }
    };

    println!("── Status Counts ─────────────────────────────────────────");
    println!("  operating:   {}", board.counts.operating);
    println!("  break:       {}", board.counts.on_break);
    println!("  meeting:     {}", board.counts.meeting);
    println!("  handling:    {}", board.counts.handling);
    println!("  unavailable: {}", board.counts.unavailable);
    println!("  total:       {}", board.counts.total());
    println!();

    println!("── Agents ────────────────────────────────────────────────");
    if board.agents.is_empty() {
        println!("  (no snapshots for this day)");
    } else {
        for agent in &board.agents {
            println!(
                "  {:<20} │ {:<12} │ {:<8} │ worked {}",
                agent.name,
                agent.status.label(),
                format!("{:?}", agent.presence),
                format_minutes(agent.worked_minutes)
            );
        }
    }
    println!();
    println!("═══════════════════════════════════════════════════════════");
}
