//! Внешние коллабораторы stalker'а
//!
//! Граф точек, инстанцирование префабов и аудио — не наша ответственность.
//! StalkerStateMachine получает их через конструктор (`StalkerServices`),
//! никаких глобальных singleton'ов.

use bevy::prelude::*;

use super::config::{AudioClip, PrefabHandle};
use super::point::Point;

/// Handle живого инстанса во внешней сцене
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Граф waypoint'ов (pathfinding снаружи)
pub trait WaypointGraph: Send + Sync {
    /// Следующая точка от `current` к `target`.
    ///
    /// `None` — валидной точки нет (stalker ждёт на месте).
    /// Точка с `is_target == true` — цель достигнута.
    fn next_point(&mut self, current: &Point, target: &Point, min_distance: f32) -> Option<Point>;

    /// Сбросить состояние обхода (despawn)
    fn clear_path(&mut self);
}

/// Инстанцирование/уничтожение префабов
pub trait Instantiator: Send + Sync {
    fn create(
        &mut self,
        prefab: &PrefabHandle,
        position: Vec3,
        rotation: Quat,
        parent: Option<InstanceId>,
    ) -> InstanceId;

    /// Уничтожить инстанс. Неизвестный/уже удалённый id — no-op.
    fn destroy(&mut self, instance: InstanceId);

    /// Эффект ещё играет (false для несуществующих инстансов)
    fn is_playing(&self, instance: InstanceId) -> bool;

    /// Включить/выключить отрисовку меша
    fn set_shown(&mut self, instance: InstanceId, shown: bool);

    fn set_rotation(&mut self, instance: InstanceId, rotation: Quat);
}

pub trait AudioPlayer: Send + Sync {
    fn play_one_shot(&mut self, clip: &AudioClip);
}

/// Набор коллабораторов одного stalker'а
pub struct StalkerServices {
    pub graph: Box<dyn WaypointGraph>,
    pub instantiator: Box<dyn Instantiator>,
    pub audio: Box<dyn AudioPlayer>,
    /// Родитель для визуала (root stalker'а во внешней сцене)
    pub anchor: Option<InstanceId>,
}

impl StalkerServices {
    pub fn new(
        graph: impl WaypointGraph + 'static,
        instantiator: impl Instantiator + 'static,
        audio: impl AudioPlayer + 'static,
    ) -> Self {
        Self {
            graph: Box::new(graph),
            instantiator: Box::new(instantiator),
            audio: Box::new(audio),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: InstanceId) -> Self {
        self.anchor = Some(anchor);
        self
    }
}
