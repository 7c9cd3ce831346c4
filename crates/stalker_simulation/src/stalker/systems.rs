//! Stalker ECS системы
//!
//! Lifecycle (Update): подписка новых stalker'ов, освобождение токенов удалённых.
//! Simulation (FixedUpdate, chain): команды → сигналы → цель → tick → Transform.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::{Stalker, StalkerTarget};
use super::events::{
    AmbientLevelChanged, GestureChanged, SightChanged, StalkerAction, StalkerCommand, StalkerMoved,
    TargetCaught, VisionImpact,
};
use super::machine::StalkerEvent;
use super::signals::SignalBus;
use crate::logger::{log, log_error, log_warning};

#[cfg(debug_assertions)]
use super::components::StalkerDebugRadius;

/// Исходящие события stalker'ов
#[derive(SystemParam)]
pub struct StalkerEventWriters<'w> {
    caught: EventWriter<'w, TargetCaught>,
    vision: EventWriter<'w, VisionImpact>,
    moved: EventWriter<'w, StalkerMoved>,
}

impl StalkerEventWriters<'_> {
    /// Конвертирует события state machine в ECS события
    pub fn publish(&mut self, stalker: Entity, events: Vec<StalkerEvent>) {
        for event in events {
            match event {
                StalkerEvent::Spawned { point, position } | StalkerEvent::Moved { point, position } => {
                    self.moved.write(StalkerMoved {
                        stalker,
                        point,
                        position,
                    });
                }
                StalkerEvent::Revealed { position } => {
                    self.vision.write(VisionImpact {
                        stalker,
                        position,
                        revealed: true,
                    });
                }
                StalkerEvent::Concealed { position } => {
                    self.vision.write(VisionImpact {
                        stalker,
                        position,
                        revealed: false,
                    });
                }
                StalkerEvent::TargetCaught { damage } => {
                    self.caught.write(TargetCaught { stalker, damage });
                }
                // Логируется самой state machine
                StalkerEvent::Stalled => {}
                StalkerEvent::ArrivalEffectStarted { position } => {
                    log(&format!("Stalker {:?}: arrival effect at {:?}", stalker, position));
                }
            }
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Новый Stalker → подписка на сигналы + start (play_on_awake)
pub fn subscribe_new_stalkers(
    mut stalkers: Query<(Entity, &mut Stalker), Added<Stalker>>,
    mut bus: ResMut<SignalBus>,
    mut writers: StalkerEventWriters,
) {
    for (entity, mut stalker) in stalkers.iter_mut() {
        stalker.subscription = Some(bus.subscribe(entity));

        let events = stalker.machine.start();
        writers.publish(entity, events);
    }
}

/// Удалённый Stalker (despawn entity / remove component) → освободить подписку
pub fn release_removed_stalkers(mut removed: RemovedComponents<Stalker>, mut bus: ResMut<SignalBus>) {
    for entity in removed.read() {
        if let Some(token) = bus.release_entity(entity) {
            log(&format!("Stalker {:?}: released subscription {:?}", entity, token));
        }
    }
}

// ============================================================================
// Simulation (FixedUpdate)
// ============================================================================

pub fn apply_stalker_commands(
    mut commands: EventReader<StalkerCommand>,
    mut stalkers: Query<&mut Stalker>,
    mut writers: StalkerEventWriters,
) {
    for command in commands.read() {
        let Ok(mut stalker) = stalkers.get_mut(command.stalker) else {
            log_warning(&format!("StalkerCommand: {:?} is not a stalker", command.stalker));
            continue;
        };

        let machine = &mut stalker.machine;
        let events = match &command.action {
            StalkerAction::SpawnAt(point) => machine.spawn_at(point.clone()),
            StalkerAction::SpawnAtRandom => machine.spawn_at_random(),
            StalkerAction::SetSpawnPoints(points) => match machine.set_spawn_points(points.clone()) {
                Ok(events) => events,
                Err(err) => {
                    log_error(&format!("Stalker {:?}: set_spawn_points rejected: {}", command.stalker, err));
                    Vec::new()
                }
            },
            StalkerAction::Resume => {
                machine.resume();
                Vec::new()
            }
            StalkerAction::Pause => {
                machine.pause();
                Vec::new()
            }
            StalkerAction::Despawn => {
                machine.despawn();
                Vec::new()
            }
        };

        writers.publish(command.stalker, events);
    }
}

/// Сигналы цели → подписанные stalker'ы
///
/// Gesture и ambient — broadcast всем подписанным, sight — адресный.
pub fn route_target_signals(
    mut gestures: EventReader<GestureChanged>,
    mut sights: EventReader<SightChanged>,
    mut ambient: EventReader<AmbientLevelChanged>,
    bus: Res<SignalBus>,
    mut stalkers: Query<&mut Stalker>,
) {
    for event in gestures.read() {
        for entity in bus.subscribers() {
            if let Ok(mut stalker) = stalkers.get_mut(entity) {
                stalker.machine.set_gesture_active(event.active);
            }
        }
    }

    for event in ambient.read() {
        for entity in bus.subscribers() {
            if let Ok(mut stalker) = stalkers.get_mut(entity) {
                stalker.machine.on_ambient_level_changed(event.level);
            }
        }
    }

    for event in sights.read() {
        if !bus.is_subscribed(event.stalker) {
            continue;
        }
        if let Ok(mut stalker) = stalkers.get_mut(event.stalker) {
            stalker.machine.set_in_sight(event.in_sight);
        }
    }
}

/// Позиция StalkerTarget → все stalker'ы
pub fn sync_target_position(targets: Query<&Transform, With<StalkerTarget>>, mut stalkers: Query<&mut Stalker>) {
    let Ok(target) = targets.single() else {
        return;
    };

    for mut stalker in stalkers.iter_mut() {
        stalker.machine.track_target(target.translation);
    }
}

pub fn tick_stalkers(
    mut stalkers: Query<(Entity, &mut Stalker)>,
    time: Res<Time<Fixed>>,
    mut writers: StalkerEventWriters,
) {
    let delta = time.delta_secs();

    for (entity, mut stalker) in stalkers.iter_mut() {
        let events = stalker.machine.tick(delta);
        writers.publish(entity, events);
    }
}

/// Transform ← позиция state machine
pub fn sync_stalker_transforms(mut stalkers: Query<(&Stalker, &mut Transform)>) {
    for (stalker, mut transform) in stalkers.iter_mut() {
        let position = stalker.machine.position();
        if transform.translation != position {
            transform.translation = position;
        }
    }
}

#[cfg(debug_assertions)]
pub fn update_debug_radius(mut stalkers: Query<(&Stalker, &mut StalkerDebugRadius)>) {
    for (stalker, mut debug) in stalkers.iter_mut() {
        let sphere = stalker.machine.debug_radius();
        debug.center = sphere.center;
        debug.radius = sphere.radius;
    }
}
