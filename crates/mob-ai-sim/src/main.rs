use std::io::ErrorKind;

use mob_ai_sim::config::SimConfig;
use mob_ai_sim::error::SimError;
use mob_ai_sim::steering;
use mob_ai_sim::world::{GameEvent, SimWorld};
use tracing::{info, warn};

const CONFIG_PATH: &str = "sim.toml";

#[derive(Debug, Default)]
struct Tally {
    attacks: u64,
    mob_deaths: u64,
    player_deaths: u64,
    faults: u64,
}

impl Tally {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::MobAttackPlayer { .. } => self.attacks += 1,
            GameEvent::MobDied { .. } => self.mob_deaths += 1,
            GameEvent::PlayerDied { .. } => self.player_deaths += 1,
            GameEvent::AiFault { .. } => self.faults += 1,
            _ => {}
        }
    }
}

fn populate(sim: &mut SimWorld, config: &SimConfig) -> Result<(), SimError> {
    let mut rng = rand::thread_rng();
    let radius = config.world.spawn_radius;
    let origin = (0.0, 4.0, 0.0);

    for _ in 0..config.world.players {
        sim.spawn_player(steering::random_point_near(origin, radius, &mut rng));
    }
    let mobs = [
        ("minecraft:zombie", config.world.zombies),
        ("minecraft:cow", config.world.cows),
        ("minecraft:piglin_brute", config.world.piglin_brutes),
    ];
    for (type_id, count) in mobs {
        for _ in 0..count {
            sim.spawn_mob(type_id, steering::random_point_near(origin, radius, &mut rng))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match SimConfig::load(CONFIG_PATH) {
        Ok(c) => c,
        Err(SimError::Io(e)) if e.kind() == ErrorKind::NotFound => SimConfig::default(),
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "mob-ai-sim v{} starting at {} ticks/s",
        env!("CARGO_PKG_VERSION"),
        config.simulation.ticks_per_second
    );
    info!(
        "Spawning {} zombies, {} cows, {} piglin brutes, {} players",
        config.world.zombies, config.world.cows, config.world.piglin_brutes, config.world.players
    );

    let mut sim = SimWorld::new(&config);
    if let Err(e) = populate(&mut sim, &config) {
        eprintln!("Failed to populate world: {e}");
        std::process::exit(1);
    }
    sim.drain_events();

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
        let _ = shutdown_tx.send(true);
    });

    let mut tally = Tally::default();
    let mut tick_interval = tokio::time::interval(config.tick_period());
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                sim.tick();
                for event in sim.drain_events() {
                    if let GameEvent::AiFault { runtime_id, reason } = &event {
                        warn!(runtime_id, %reason, "AI fault");
                    }
                    tally.record(&event);
                }

                let tick = sim.current_tick();
                let every = config.simulation.summary_interval;
                if every > 0 && tick % every == 0 {
                    info!(
                        tick,
                        mobs = sim.mob_count(),
                        players = sim.player_count(),
                        attacks = tally.attacks,
                        mob_deaths = tally.mob_deaths,
                        player_deaths = tally.player_deaths,
                        faults = tally.faults,
                        "status"
                    );
                }
                if config.simulation.max_ticks > 0 && tick >= config.simulation.max_ticks {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    sim.shutdown();
    info!("Simulation stopped after {} ticks: {:?}", sim.current_tick(), tally);
}
