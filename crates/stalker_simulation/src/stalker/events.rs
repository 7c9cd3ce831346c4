//! Stalker события (ECS ↔ внешний мир)
//!
//! Входящие: GestureChanged / AmbientLevelChanged (broadcast всем подписанным),
//! SightChanged (конкретному stalker'у), StalkerCommand (управление).
//! Исходящие: TargetCaught, VisionImpact, StalkerMoved.

use bevy::prelude::*;

use super::point::{Point, PointId};

/// Gesture цели включён/выключен (broadcast)
#[derive(Event, Debug, Clone, Copy)]
pub struct GestureChanged {
    pub active: bool,
}

/// Stalker попал/выпал из поля зрения цели
#[derive(Event, Debug, Clone, Copy)]
pub struct SightChanged {
    pub stalker: Entity,
    pub in_sight: bool,
}

/// Ambient уровень шума изменился (broadcast, без фильтра по слушателям)
#[derive(Event, Debug, Clone, Copy)]
pub struct AmbientLevelChanged {
    pub level: i32,
}

#[derive(Debug, Clone)]
pub enum StalkerAction {
    SpawnAt(Point),
    SpawnAtRandom,
    SetSpawnPoints(Vec<Point>),
    Resume,
    Pause,
    Despawn,
}

/// Команда управления stalker'ом (от владеющего контроллера)
#[derive(Event, Debug, Clone)]
pub struct StalkerCommand {
    pub stalker: Entity,
    pub action: StalkerAction,
}

/// Цель поймана. Ровно одно событие на поимку.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TargetCaught {
    pub stalker: Entity,
    pub damage: u32,
}

/// Переключение видимости stalker'а (vision impact эффект в `position`)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct VisionImpact {
    pub stalker: Entity,
    pub position: Vec3,
    pub revealed: bool,
}

/// Stalker появился на точке (spawn или шаг по графу)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StalkerMoved {
    pub stalker: Entity,
    pub point: PointId,
    pub position: Vec3,
}
