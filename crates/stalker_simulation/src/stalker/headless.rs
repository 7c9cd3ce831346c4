//! Headless коллабораторы (без движка)
//!
//! Используются headless бинарником и тестами:
//! - `HeadlessScene` — Instantiator в памяти, эффекты играют заданное время
//! - `PointGraph` — простой граф: шаг к цели по ближайшей точке
//! - `ScriptedGraph` — граф с заранее заданными ответами
//! - `RecordingAudio` — запоминает проигранные клипы
//!
//! Все handle'ы Clone и разделяют состояние: одну копию отдаём stalker'у,
//! второй читаем/двигаем время снаружи.

use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::config::{AudioClip, PrefabHandle};
use super::point::{Point, PointId};
use super::services::{AudioPlayer, InstanceId, Instantiator, WaypointGraph};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// HeadlessScene
// ============================================================================

#[derive(Debug, Clone)]
pub struct SceneInstance {
    pub prefab: PrefabHandle,
    pub position: Vec3,
    pub rotation: Quat,
    pub parent: Option<InstanceId>,
    pub shown: bool,
    /// Оставшееся время эффекта (None — не эффект)
    pub remaining: Option<f32>,
}

#[derive(Debug, Default)]
struct SceneState {
    next_id: u64,
    instances: BTreeMap<InstanceId, SceneInstance>,
    effect_durations: HashMap<PrefabHandle, f32>,
    created: usize,
    destroyed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    state: Arc<Mutex<SceneState>>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Зарегистрировать префаб как эффект с длительностью (секунды).
    /// Закончившийся эффект удаляет себя сам.
    pub fn with_effect(self, prefab: PrefabHandle, duration: f32) -> Self {
        lock(&self.state).effect_durations.insert(prefab, duration);
        self
    }

    /// Продвинуть время эффектов
    pub fn advance(&self, delta: f32) {
        let mut state = lock(&self.state);
        state.instances.retain(|_, instance| match instance.remaining.as_mut() {
            Some(remaining) => {
                *remaining -= delta;
                *remaining > 0.0
            }
            None => true,
        });
    }

    pub fn instance(&self, id: InstanceId) -> Option<SceneInstance> {
        lock(&self.state).instances.get(&id).cloned()
    }

    pub fn is_alive(&self, id: InstanceId) -> bool {
        lock(&self.state).instances.contains_key(&id)
    }

    pub fn is_shown(&self, id: InstanceId) -> Option<bool> {
        self.instance(id).map(|instance| instance.shown)
    }

    pub fn live_count(&self) -> usize {
        lock(&self.state).instances.len()
    }

    pub fn live_of(&self, prefab: &PrefabHandle) -> Vec<InstanceId> {
        lock(&self.state)
            .instances
            .iter()
            .filter(|(_, instance)| &instance.prefab == prefab)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn created_count(&self) -> usize {
        lock(&self.state).created
    }

    pub fn destroyed_count(&self) -> usize {
        lock(&self.state).destroyed
    }
}

impl Instantiator for HeadlessScene {
    fn create(
        &mut self,
        prefab: &PrefabHandle,
        position: Vec3,
        rotation: Quat,
        parent: Option<InstanceId>,
    ) -> InstanceId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        state.created += 1;

        let id = InstanceId(state.next_id);
        let remaining = state.effect_durations.get(prefab).copied();
        state.instances.insert(
            id,
            SceneInstance {
                prefab: prefab.clone(),
                position,
                rotation,
                parent,
                shown: true,
                remaining,
            },
        );
        id
    }

    fn destroy(&mut self, instance: InstanceId) {
        let mut state = lock(&self.state);
        if state.instances.remove(&instance).is_some() {
            state.destroyed += 1;
        }
    }

    fn is_playing(&self, instance: InstanceId) -> bool {
        lock(&self.state)
            .instances
            .get(&instance)
            .and_then(|instance| instance.remaining)
            .map(|remaining| remaining > 0.0)
            .unwrap_or(false)
    }

    fn set_shown(&mut self, instance: InstanceId, shown: bool) {
        if let Some(instance) = lock(&self.state).instances.get_mut(&instance) {
            instance.shown = shown;
        }
    }

    fn set_rotation(&mut self, instance: InstanceId, rotation: Quat) {
        if let Some(instance) = lock(&self.state).instances.get_mut(&instance) {
            instance.rotation = rotation;
        }
    }
}

// ============================================================================
// PointGraph
// ============================================================================

/// Граф "шаг к цели"
///
/// Следующая точка — ближайшая к текущей среди точек, которые ближе к цели
/// чем текущая и не ближе `min_distance`. Цель в `catch_radius` → возвращаем
/// точку цели.
#[derive(Debug, Clone)]
pub struct PointGraph {
    points: Vec<Point>,
    catch_radius: f32,
    path: Vec<PointId>,
}

impl PointGraph {
    pub fn new(points: Vec<Point>, catch_radius: f32) -> Self {
        Self {
            points,
            catch_radius,
            path: Vec::new(),
        }
    }

    /// Пройденные точки с последнего `clear_path`
    pub fn path(&self) -> &[PointId] {
        &self.path
    }
}

impl WaypointGraph for PointGraph {
    fn next_point(&mut self, current: &Point, target: &Point, min_distance: f32) -> Option<Point> {
        let remaining = current.distance(target);
        if remaining <= self.catch_radius {
            return Some(target.clone());
        }

        let next = self
            .points
            .iter()
            .filter(|point| point.id != current.id)
            .filter(|point| point.distance(target) < remaining)
            .filter(|point| point.distance(current) >= min_distance)
            .min_by(|a, b| a.distance(current).total_cmp(&b.distance(current)))
            .cloned()?;

        self.path.push(next.id);
        Some(next)
    }

    fn clear_path(&mut self) {
        self.path.clear();
    }
}

// ============================================================================
// ScriptedGraph
// ============================================================================

#[derive(Debug, Default)]
struct ScriptState {
    answers: VecDeque<Option<Point>>,
    queries: usize,
    clears: usize,
}

/// Граф с очередью ответов. Пустая очередь → `None`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGraph {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, answer: Option<Point>) {
        lock(&self.state).answers.push_back(answer);
    }

    pub fn queries(&self) -> usize {
        lock(&self.state).queries
    }

    pub fn clears(&self) -> usize {
        lock(&self.state).clears
    }
}

impl WaypointGraph for ScriptedGraph {
    fn next_point(&mut self, _current: &Point, _target: &Point, _min_distance: f32) -> Option<Point> {
        let mut state = lock(&self.state);
        state.queries += 1;
        state.answers.pop_front().flatten()
    }

    fn clear_path(&mut self) {
        lock(&self.state).clears += 1;
    }
}

// ============================================================================
// RecordingAudio
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    played: Arc<Mutex<Vec<AudioClip>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<AudioClip> {
        lock(&self.played).clone()
    }
}

impl AudioPlayer for RecordingAudio {
    fn play_one_shot(&mut self, clip: &AudioClip) {
        lock(&self.played).push(clip.clone());
    }
}
