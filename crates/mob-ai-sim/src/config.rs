//! `sim.toml` loading.

use std::path::Path;

use mob_ai::SchedulerConfig;
use serde::Deserialize;

use crate::error::{SimError, SimResult};

/// Upper bound keeping the tick period at one millisecond or more.
pub const MAX_TICKS_PER_SECOND: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct SimulationSection {
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
    /// Stop after this many ticks. 0 = run until Ctrl+C.
    #[serde(default)]
    pub max_ticks: u64,
    /// Ticks between status lines. 0 = disabled.
    #[serde(default = "default_summary_interval")]
    pub summary_interval: u64,
}

fn default_ticks_per_second() -> u32 {
    20
}

fn default_summary_interval() -> u64 {
    100
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            max_ticks: 0,
            summary_interval: default_summary_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_zombies")]
    pub zombies: u32,
    #[serde(default = "default_cows")]
    pub cows: u32,
    #[serde(default = "default_piglin_brutes")]
    pub piglin_brutes: u32,
    #[serde(default = "default_players")]
    pub players: u32,
    /// Radius around the origin that initial entities are scattered in.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,
    /// Simulated players take a random step every few ticks.
    #[serde(default = "default_true")]
    pub players_wander: bool,
    /// Simulated players punch the nearest mob within reach.
    #[serde(default = "default_true")]
    pub players_fight_back: bool,
}

fn default_zombies() -> u32 {
    3
}

fn default_cows() -> u32 {
    4
}

fn default_piglin_brutes() -> u32 {
    2
}

fn default_players() -> u32 {
    2
}

fn default_spawn_radius() -> f32 {
    24.0
}

fn default_true() -> bool {
    true
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            zombies: default_zombies(),
            cows: default_cows(),
            piglin_brutes: default_piglin_brutes(),
            players: default_players(),
            spawn_radius: default_spawn_radius(),
            players_wander: true,
            players_fight_back: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> SimResult<Self> {
        let config: SimConfig = toml::from_str(content)?;
        let tps = config.simulation.ticks_per_second;
        if !(1..=MAX_TICKS_PER_SECOND).contains(&tps) {
            return Err(SimError::TickRate {
                got: tps,
                max: MAX_TICKS_PER_SECOND,
            });
        }
        config.scheduler.validate()?;
        Ok(config)
    }

    /// Simulation tick period derived from `ticks_per_second`.
    pub fn tick_period(&self) -> std::time::Duration {
        let tps = self
            .simulation
            .ticks_per_second
            .clamp(1, MAX_TICKS_PER_SECOND);
        std::time::Duration::from_millis(1000 / u64::from(tps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SimConfig::parse("").unwrap();
        assert_eq!(config.simulation.ticks_per_second, 20);
        assert_eq!(config.simulation.max_ticks, 0);
        assert_eq!(config.world.zombies, 3);
        assert_eq!(config.scheduler.goal_tick_interval, 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tick_period().as_millis(), 50);
    }

    #[test]
    fn sections_override_defaults() {
        let toml_str = r#"
[simulation]
ticks_per_second = 10
max_ticks = 600

[world]
zombies = 0
players_wander = false

[scheduler]
goal_tick_interval = 1

[logging]
level = "debug,mob_ai=trace"
"#;
        let config = SimConfig::parse(toml_str).unwrap();
        assert_eq!(config.simulation.max_ticks, 600);
        assert_eq!(config.tick_period().as_millis(), 100);
        assert_eq!(config.world.zombies, 0);
        assert_eq!(config.world.cows, 4);
        assert!(!config.world.players_wander);
        assert!(config.world.players_fight_back);
        assert_eq!(config.scheduler.goal_tick_interval, 1);
        assert_eq!(config.logging.level, "debug,mob_ai=trace");
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let err = SimConfig::parse("[scheduler]\ngoal_tick_interval = 0\n").unwrap_err();
        assert!(matches!(err, SimError::Ai(mob_ai::AiError::ZeroTickInterval)));
    }

    #[test]
    fn tick_rate_out_of_range_rejected() {
        for tps in [0, 1001, 2000] {
            let content = format!("[simulation]\nticks_per_second = {tps}\n");
            assert!(matches!(
                SimConfig::parse(&content),
                Err(SimError::TickRate { got, max: 1000 }) if got == tps
            ));
        }
        let fastest = SimConfig::parse("[simulation]\nticks_per_second = 1000\n").unwrap();
        assert_eq!(fastest.tick_period().as_millis(), 1);
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            SimConfig::parse("[world]\nzombies = \"many\"\n"),
            Err(SimError::Config(_))
        ));
    }
}
