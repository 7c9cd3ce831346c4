//! Stalker module
//!
//! Враг, который двигается по графу точек к цели дискретными шагами.
//! Виден только когда цель "смотрит" (gesture) — и, однажды показавшись,
//! остаётся видимым пока gesture активен.
//!
//! Ядро (`StalkerStateMachine`) не зависит от ECS: коллабораторы (граф,
//! инстанцирование, аудио) передаются в конструктор. ECS слой — тонкая обёртка:
//! события на вход/выход + тик в FixedUpdate.

use bevy::prelude::*;

pub mod cadence;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod headless;
pub mod machine;
pub mod point;
pub mod representation;
pub mod services;
pub mod signals;
pub mod spawn_effect;
pub mod systems;
pub mod visibility;

#[cfg(test)]
mod machine_tests;

// Re-export основных типов
pub use cadence::CadenceController;
pub use components::{spawn_stalker, Stalker, StalkerDebugRadius, StalkerTarget};
pub use config::{AudioClip, PrefabHandle, RepresentationSet, StalkerConfig};
pub use error::StalkerConfigError;
pub use events::{
    AmbientLevelChanged, GestureChanged, SightChanged, StalkerAction, StalkerCommand, StalkerMoved, TargetCaught,
    VisionImpact,
};
pub use machine::{DebugSphere, StalkerEvent, StalkerState, StalkerStateMachine};
pub use point::{Point, PointCategory, PointId};
pub use representation::{select_representation, Representation, RepresentationSlot};
pub use services::{AudioPlayer, InstanceId, Instantiator, StalkerServices, WaypointGraph};
pub use signals::{SignalBus, SubscriptionToken};
pub use spawn_effect::SpawnEffectGate;
pub use visibility::{TargetSignals, VisibilityDecision, VisibilityGate};

/// Stalker Plugin
///
/// Lifecycle системы в Update (подписка/освобождение токенов).
/// Simulation системы в FixedUpdate для детерминизма:
/// 1. apply_stalker_commands — spawn/pause/resume/despawn
/// 2. route_target_signals — gesture/ambient broadcast, sight адресно
/// 3. sync_target_position — позиция StalkerTarget
/// 4. tick_stalkers — state machine tick → TargetCaught/VisionImpact/StalkerMoved
/// 5. sync_stalker_transforms — Transform ← позиция
pub struct StalkerPlugin;

impl Plugin for StalkerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SignalBus>()
            .register_type::<StalkerTarget>()
            .register_type::<StalkerDebugRadius>()
            .add_event::<GestureChanged>()
            .add_event::<SightChanged>()
            .add_event::<AmbientLevelChanged>()
            .add_event::<StalkerCommand>()
            .add_event::<TargetCaught>()
            .add_event::<VisionImpact>()
            .add_event::<StalkerMoved>();

        app.add_systems(
            Update,
            (systems::subscribe_new_stalkers, systems::release_removed_stalkers).chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_stalker_commands,
                systems::route_target_signals,
                systems::sync_target_position,
                systems::tick_stalkers,
                systems::sync_stalker_transforms,
            )
                .chain(), // Последовательное выполнение для детерминизма
        );

        #[cfg(debug_assertions)]
        app.add_systems(
            FixedUpdate,
            systems::update_debug_radius.after(systems::sync_stalker_transforms),
        );
    }
}
