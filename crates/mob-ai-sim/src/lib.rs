//! Headless mob simulation hosting the `mob-ai` schedulers on a `bevy_ecs`
//! world. Zombies and cows run goal selectors, piglin brutes run a brain.

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod goals;
pub mod mob_behaviors;
pub mod mob_registry;
pub mod piglin;
pub mod steering;
pub mod system;
pub mod world;
