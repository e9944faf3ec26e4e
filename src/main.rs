//! Saltwake - headless NPC simulation for the harbor town
//!
//! Loads settings, spawns the roster, runs the world for a fixed number of
//! ticks, and prints the final NPC snapshots as JSON.

mod demo;
mod settings;

use std::fs;

use anyhow::{Context, Result};
use saltwake_game::{parse_roster, NpcEvent, NpcId, NpcWorld};
use saltwake_world::{ClockTime, WorldClock};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use demo::Action;
use settings::SimSettings;

fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Saltwake...");

    let settings = SimSettings::load();
    if std::env::args().any(|arg| arg == "--write-settings") {
        return settings.save();
    }

    let roster = match &settings.run.roster {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("Failed to read roster {:?}", path))?;
            parse_roster(&json)?
        }
        None => demo::roster()?,
    };
    let start: ClockTime = settings
        .run
        .start_time
        .parse()
        .with_context(|| format!("Invalid start_time '{}'", settings.run.start_time))?;

    let mut world = NpcWorld::new(demo::harbor_map()?, demo::harbor_locations(), settings.ai.clone())
        .with_clock(WorldClock::new(start));
    for record in &roster {
        if let Err(e) = world.spawn(record) {
            warn!("Skipping '{}': {}", record.name, e);
        }
    }
    world.set_player_position(Some(demo::PLAYER_START));
    info!("Simulating {} NPCs for {} ticks", world.count(), settings.run.ticks);

    for _ in 0..settings.run.ticks {
        let report = world.tick(settings.run.tick_seconds);
        for event in &report.events {
            match event {
                NpcEvent::Struck { .. } | NpcEvent::PathFailed { .. } => info!("{:?}", event),
                _ => debug!("{:?}", event),
            }
        }
        run_script(&mut world, report.tick);

        if settings.run.report_every > 0 && report.tick % settings.run.report_every == 0 {
            info!("Day {} {}", report.time.day, report.time.time);
            for snapshot in world.snapshots() {
                info!(
                    "  {} {:<10} {} {:?} {:?} {:?} hp {:.0}",
                    snapshot.id,
                    snapshot.name,
                    snapshot.position,
                    snapshot.state,
                    snapshot.mood,
                    snapshot.tier,
                    snapshot.health
                );
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&world.snapshots())?);
    Ok(())
}

fn find_by_name(world: &NpcWorld, name: &str) -> Option<NpcId> {
    world.agents().find(|a| a.name() == name).map(|a| a.id())
}

/// Play the scripted player actions due on `tick`
fn run_script(world: &mut NpcWorld, tick: u64) {
    for (_, name, action) in demo::SCRIPT.iter().filter(|(at, _, _)| *at == tick) {
        let Some(id) = find_by_name(world, name) else {
            warn!("Script names unknown NPC '{}'", name);
            continue;
        };
        let result = match action {
            Action::Interact(kind) => world.interact(id, *kind).map(|o| format!("{} -> {}", kind.name(), o.dialogue_line)),
            Action::Gift(item) => world.gift(id, item).map(|o| format!("gift {} -> {}", item, o.dialogue_line)),
            Action::EndDialogue => world.end_dialogue(id).map(|line| format!("farewell -> {}", line)),
        };
        match result {
            Ok(line) => info!("Player and {}: {}", name, line),
            Err(e) => warn!("Script step failed: {}", e),
        }
    }
}
