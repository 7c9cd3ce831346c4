//! Stalker Simulation Core
//!
//! ECS-симуляция на Bevy 0.16 (headless)
//!
//! - `stalker` — state machine врага + ECS plugin
//! - `logger` — глобальный logger (один sink на процесс)

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod logger;
pub mod stalker;

pub use logger::{
    init_logger, log, log_error, log_info, log_level, log_warning, set_log_level, set_logger, set_logger_if_needed,
    LogLevel, LogPrinter,
};
pub use stalker::*;

/// Fixed timestep симуляции (50Hz)
pub const FIXED_TIMESTEP: Duration = Duration::from_millis(20);

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_duration(FIXED_TIMESTEP))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .add_plugins(StalkerPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Отдельный RNG для одного stalker'а (порядок fork'ов = порядок spawn'ов)
    pub fn fork(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rng.gen())
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную: каждый `app.update()` = ровно один fixed step.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(StalkerPlugin)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_duration(FIXED_TIMESTEP))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FIXED_TIMESTEP));

    app
}

/// Snapshot stalker'ов для сравнения детерминизма
///
/// Сортируем по Entity index, сериализуем через Debug.
pub fn stalker_snapshot(world: &mut World) -> Vec<u8> {
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &Stalker, &Transform)>();
    let mut stalkers: Vec<_> = query.iter(world).collect();
    stalkers.sort_by_key(|(entity, _, _)| entity.index());

    for (entity, stalker, transform) in stalkers {
        let machine = &stalker.machine;
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(
            format!(
                "{:?}|{:?}|{:?}|{:?}|{}",
                machine.state(),
                machine.current_point().map(|point| point.id),
                transform.translation,
                machine.representation().map(|repr| repr.prefab.clone()),
                machine.interval(),
            )
            .as_bytes(),
        );
    }

    snapshot
}
