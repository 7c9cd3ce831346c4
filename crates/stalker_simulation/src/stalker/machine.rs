//! StalkerStateMachine — ядро stalker'а
//!
//! Состояния:
//! Disabled → (spawn) → Idle ⇄ Blocked → (цель достигнута) → Dead
//!
//! Тик (только когда enabled):
//! 1. Arrival effect играет → только visibility/rotation/effect, таймер стоит (Blocked)
//! 2. Иначе → timer += delta, visibility/rotation/effect, timer ≥ interval → move step
//!
//! Move step:
//! - уничтожаем текущий визуал
//! - спрашиваем граф следующую точку (None → ждём на месте)
//! - точка цели → TargetCaught один раз, Dead
//! - иначе новый визуал (скрытым) на новой точке

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::cadence::CadenceController;
use super::config::StalkerConfig;
use super::error::StalkerConfigError;
use super::point::{Point, PointId};
use super::representation::{select_representation, Representation, RepresentationSlot};
use super::services::StalkerServices;
use super::spawn_effect::SpawnEffectGate;
use super::visibility::{TargetSignals, VisibilityGate};

/// Состояние stalker'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalkerState {
    /// Не заспавнен или на паузе
    #[default]
    Disabled,
    /// Таймер тикает, движение разрешено
    Idle,
    /// Arrival effect играет — движение заблокировано
    Blocked,
    /// Цель поймана. Тики — no-op до нового spawn
    Dead,
}

/// Что произошло за тик / операцию
#[derive(Debug, Clone, PartialEq)]
pub enum StalkerEvent {
    Spawned { point: PointId, position: Vec3 },
    Moved { point: PointId, position: Vec3 },
    /// Граф не дал следующей точки — ждём на месте
    Stalled,
    /// Визуал стал видимым (vision impact в `position`)
    Revealed { position: Vec3 },
    /// Визуал скрылся (vision impact в `position`)
    Concealed { position: Vec3 },
    ArrivalEffectStarted { position: Vec3 },
    TargetCaught { damage: u32 },
}

/// Debug сфера min distance вокруг stalker'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Горизонтальная дистанция, ниже которой поворот к цели не считаем
const FACE_TARGET_EPSILON: f32 = 1e-4;

pub struct StalkerStateMachine {
    config: StalkerConfig,
    services: StalkerServices,
    rng: ChaCha8Rng,

    state: StalkerState,
    enabled: bool,
    /// Заспавнен (resume разрешён)
    spawning: bool,
    timer: f32,

    position: Vec3,
    /// Позиция до pause (для resume)
    last_position: Vec3,
    current_point: Option<Point>,
    /// Точка цели (is_target), позиция обновляется через `track_target`
    target: Point,

    signals: TargetSignals,
    visibility: VisibilityGate,
    cadence: CadenceController,
    spawn_effect: SpawnEffectGate,
    representation: RepresentationSlot,
}

impl StalkerStateMachine {
    /// Создать stalker'а. Невалидный конфиг отклоняется сразу.
    ///
    /// Stalker стартует в `Disabled`; `start()` спавнит при `play_on_awake`.
    pub fn new(
        config: StalkerConfig,
        services: StalkerServices,
        rng: ChaCha8Rng,
    ) -> Result<Self, StalkerConfigError> {
        config.validate()?;

        let cadence = CadenceController::new(config.movement_interval, config.cadence_step);

        Ok(Self {
            config,
            services,
            rng,
            state: StalkerState::Disabled,
            enabled: false,
            spawning: false,
            timer: 0.0,
            position: Vec3::ZERO,
            last_position: Vec3::ZERO,
            current_point: None,
            target: Point::target(u32::MAX, Vec3::ZERO),
            signals: TargetSignals::default(),
            visibility: VisibilityGate::new(),
            cadence,
            spawn_effect: SpawnEffectGate::new(),
            representation: RepresentationSlot::new(),
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> StalkerState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn interval(&self) -> f32 {
        self.cadence.interval()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn current_point(&self) -> Option<&Point> {
        self.current_point.as_ref()
    }

    pub fn representation(&self) -> Option<&Representation> {
        self.representation.get()
    }

    pub fn signals(&self) -> TargetSignals {
        self.signals
    }

    pub fn config(&self) -> &StalkerConfig {
        &self.config
    }

    pub fn debug_radius(&self) -> DebugSphere {
        DebugSphere {
            center: self.position,
            radius: self.config.min_distance_to_next_point,
        }
    }

    // ------------------------------------------------------------------
    // Signals (только кэшируют значения, читает следующий тик)
    // ------------------------------------------------------------------

    pub fn set_gesture_active(&mut self, active: bool) {
        self.signals.gesture_active = active;
    }

    pub fn set_in_sight(&mut self, in_sight: bool) {
        self.signals.in_sight = in_sight;
    }

    pub fn on_ambient_level_changed(&mut self, level: i32) {
        self.cadence.on_ambient_level_changed(level);
    }

    pub fn track_target(&mut self, position: Vec3) {
        self.target.position = position;
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Первый запуск: spawn на случайной точке если `play_on_awake`
    pub fn start(&mut self) -> Vec<StalkerEvent> {
        if self.config.play_on_awake {
            self.spawn_at_random()
        } else {
            self.enabled = false;
            self.state = StalkerState::Disabled;
            Vec::new()
        }
    }

    pub fn spawn_at(&mut self, point: Point) -> Vec<StalkerEvent> {
        self.spawn(point)
    }

    /// Spawn на случайной точке из `spawn_points` (набор не пустой — проверено в `new`)
    pub fn spawn_at_random(&mut self) -> Vec<StalkerEvent> {
        let Some(point) = self.config.spawn_points.choose(&mut self.rng).cloned() else {
            crate::log_error("Stalker: spawn_at_random with empty spawn point set");
            return Vec::new();
        };
        self.spawn(point)
    }

    /// Заменить точки спавна и сразу заспавниться на случайной из них
    pub fn set_spawn_points(&mut self, points: Vec<Point>) -> Result<Vec<StalkerEvent>, StalkerConfigError> {
        if points.is_empty() {
            return Err(StalkerConfigError::NoSpawnPoints);
        }
        self.config.spawn_points = points;
        Ok(self.spawn_at_random())
    }

    /// Вернуть stalker'а после `pause()` (только если заспавнен, на паузе и цель не поймана)
    pub fn resume(&mut self) {
        if !self.spawning || self.enabled || self.state == StalkerState::Dead {
            return;
        }
        self.position = self.last_position;
        self.enabled = true;
        self.state = StalkerState::Idle;
        crate::log(&format!("Stalker: resumed at {:?}", self.position));
    }

    /// Временно выключить, не забывая прогресс
    pub fn pause(&mut self) {
        self.last_position = self.position;
        self.position = Vec3::ZERO;
        self.timer = 0.0;
        self.enabled = false;
        if self.state != StalkerState::Dead {
            self.state = StalkerState::Disabled;
        }
    }

    /// Полный сброс в незаспавненное состояние
    pub fn despawn(&mut self) {
        self.pause();
        self.services.graph.clear_path();
        self.spawning = false;

        let instantiator = self.services.instantiator.as_mut();
        self.representation.release(instantiator);
        self.spawn_effect.release(instantiator);

        self.state = StalkerState::Disabled;
        crate::log("Stalker: despawned");
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    pub fn tick(&mut self, delta: f32) -> Vec<StalkerEvent> {
        let mut events = Vec::new();
        if !self.enabled {
            return events;
        }

        if self.spawn_effect.is_blocking(self.services.instantiator.as_ref()) {
            self.state = StalkerState::Blocked;
            self.refresh_presence(&mut events);
            return events;
        }

        self.state = StalkerState::Idle;
        self.timer += delta;
        self.refresh_presence(&mut events);

        if self.timer >= self.cadence.interval() {
            self.move_step(&mut events);
            self.timer = 0.0;
        }

        events
    }

    fn spawn(&mut self, point: Point) -> Vec<StalkerEvent> {
        self.spawning = true;

        if let Some(clip) = self.config.spawn_clips.choose(&mut self.rng) {
            self.services.audio.play_one_shot(clip);
        }

        self.position = point.position;
        self.instantiate_representation(&point);

        let event = StalkerEvent::Spawned {
            point: point.id,
            position: point.position,
        };
        crate::log_info(&format!("🧛 Stalker: spawned at point {:?} {:?}", point.id, point.position));

        self.current_point = Some(point);
        self.timer = 0.0;
        self.enabled = true;
        self.state = StalkerState::Idle;

        vec![event]
    }

    fn move_step(&mut self, events: &mut Vec<StalkerEvent>) {
        self.representation.release(self.services.instantiator.as_mut());

        let Some(current) = self.current_point.as_ref() else {
            return;
        };

        let next = self.services.graph.next_point(
            current,
            &self.target,
            self.config.min_distance_to_next_point,
        );

        let Some(next) = next else {
            crate::log(&format!("Stalker: no next point from {:?}, waiting", current.id));
            events.push(StalkerEvent::Stalled);
            return;
        };

        if next.is_target {
            self.catch_target(events);
            return;
        }

        self.position = next.position;
        self.instantiate_representation(&next);

        crate::log(&format!("Stalker: moved to point {:?} ({:?})", next.id, next.category));
        events.push(StalkerEvent::Moved {
            point: next.id,
            position: next.position,
        });
        self.current_point = Some(next);
    }

    fn catch_target(&mut self, events: &mut Vec<StalkerEvent>) {
        let damage = self.config.catch_damage;
        events.push(StalkerEvent::TargetCaught { damage });

        self.enabled = false;
        self.timer = 0.0;
        self.state = StalkerState::Dead;
        crate::log_info(&format!("💀 Stalker: target caught (damage {})", damage));
    }

    fn instantiate_representation(&mut self, point: &Point) {
        let instantiator = self.services.instantiator.as_mut();

        match select_representation(&self.config.representations, point.category, &mut self.rng) {
            Some(prefab) => {
                self.representation
                    .replace(instantiator, prefab, point.position, self.services.anchor);
            }
            None => {
                self.representation.release(instantiator);
                crate::log_warning(&format!(
                    "Stalker: no representation configured for {:?}",
                    point.category
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Presence: visibility + rotation + arrival effect (каждый тик)
    // ------------------------------------------------------------------

    fn refresh_presence(&mut self, events: &mut Vec<StalkerEvent>) {
        self.update_visibility(events);
        self.face_target();
        self.refresh_spawn_effect(events);
    }

    fn update_visibility(&mut self, events: &mut Vec<StalkerEvent>) {
        let Some(shown) = self.representation.get().map(|r| r.shown) else {
            return;
        };

        let decision = self.visibility.evaluate(self.signals, shown);
        if !decision.transitioned {
            return;
        }

        let instantiator = self.services.instantiator.as_mut();
        self.representation.set_shown(instantiator, decision.should_show);

        if let Some(prefab) = self.config.vision_effect.as_ref() {
            instantiator.create(prefab, self.position, Quat::IDENTITY, None);
        }

        events.push(if decision.should_show {
            StalkerEvent::Revealed { position: self.position }
        } else {
            StalkerEvent::Concealed { position: self.position }
        });
    }

    /// Поворот визуала к цели в горизонтальной плоскости
    fn face_target(&mut self) {
        if self.representation.is_empty() {
            return;
        }

        let look_at = Vec3::new(self.target.position.x, self.position.y, self.target.position.z);
        if (look_at - self.position).length_squared() < FACE_TARGET_EPSILON {
            return;
        }

        let rotation = Transform::from_translation(self.position)
            .looking_at(look_at, Dir3::Y)
            .rotation;
        self.representation
            .set_rotation(self.services.instantiator.as_mut(), rotation);
    }

    fn refresh_spawn_effect(&mut self, events: &mut Vec<StalkerEvent>) {
        let started = self.spawn_effect.refresh(
            self.signals.reveal_condition(),
            self.config.spawn_effect.as_ref(),
            self.position,
            self.services.instantiator.as_mut(),
        );

        if started.is_some() {
            events.push(StalkerEvent::ArrivalEffectStarted { position: self.position });
        }
    }
}

/// Визуал и arrival effect живут не дольше владельца (despawn entity, drop в тестах)
impl Drop for StalkerStateMachine {
    fn drop(&mut self) {
        let instantiator = self.services.instantiator.as_mut();
        self.representation.release(instantiator);
        self.spawn_effect.release(instantiator);
    }
}
