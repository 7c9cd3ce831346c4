//! StalkerConfig — tuning stalker'а (неизменяем в течение сессии)
//!
//! Загружается из JSON (serde) или собирается в коде. `validate()` вызывается
//! при создании StalkerStateMachine — некорректный конфиг отклоняется сразу.

use serde::{Deserialize, Serialize};

use super::error::StalkerConfigError;
use super::point::{Point, PointCategory};

/// Допустимые диапазоны на старте сессии
pub const MOVEMENT_INTERVAL_RANGE: (f32, f32) = (0.2, 30.0);
pub const CADENCE_STEP_RANGE: (f32, f32) = (0.0, 10.0);
pub const MIN_DISTANCE_RANGE: (f32, f32) = (0.0, 50.0);

/// Handle префаба во внешнем Instantiator (data-driven, как путь к сцене)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefabHandle(pub String);

impl PrefabHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

/// Handle аудио клипа во внешнем AudioPlayer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioClip(pub String);

impl AudioClip {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

/// Визуалы stalker'а по категориям точек (любой может отсутствовать)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepresentationSet {
    pub none: Option<PrefabHandle>,
    pub sexy: Option<PrefabHandle>,
    pub stand: Option<PrefabHandle>,
    pub cross: Option<PrefabHandle>,
    pub hand: Option<PrefabHandle>,
    pub fly: Option<PrefabHandle>,
}

impl RepresentationSet {
    pub fn get(&self, category: PointCategory) -> Option<&PrefabHandle> {
        match category {
            PointCategory::None => self.none.as_ref(),
            PointCategory::Sexy => self.sexy.as_ref(),
            PointCategory::Stand => self.stand.as_ref(),
            PointCategory::Cross => self.cross.as_ref(),
            PointCategory::Hand => self.hand.as_ref(),
            PointCategory::Fly => self.fly.as_ref(),
        }
    }
}

/// Параметры stalker'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalkerConfig {
    /// Базовый интервал между перемещениями (секунды)
    pub movement_interval: f32,
    /// Шаг изменения интервала при смене ambient уровня
    pub cadence_step: f32,
    /// Минимальная дистанция до следующей точки (передаётся в граф)
    pub min_distance_to_next_point: f32,
    /// Точки спавна (не пустой набор)
    pub spawn_points: Vec<Point>,
    pub representations: RepresentationSet,
    /// Arrival effect — блокирует движение пока играет
    pub spawn_effect: Option<PrefabHandle>,
    /// Vision impact — fire-and-forget эффект на каждом переключении видимости
    pub vision_effect: Option<PrefabHandle>,
    pub spawn_clips: Vec<AudioClip>,
    /// Спавниться сразу при `start()`
    pub play_on_awake: bool,
    /// Урон в событии поимки цели
    pub catch_damage: u32,
}

impl Default for StalkerConfig {
    fn default() -> Self {
        Self {
            movement_interval: 7.0,
            cadence_step: 2.0,
            min_distance_to_next_point: 6.0,
            spawn_points: Vec::new(),
            representations: RepresentationSet::default(),
            spawn_effect: None,
            vision_effect: None,
            spawn_clips: Vec::new(),
            play_on_awake: true,
            catch_damage: 1,
        }
    }
}

impl StalkerConfig {
    /// Парсинг + валидация
    pub fn from_json_str(json: &str) -> Result<Self, StalkerConfigError> {
        let config: StalkerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StalkerConfigError> {
        if self.spawn_points.is_empty() {
            return Err(StalkerConfigError::NoSpawnPoints);
        }

        let (min, max) = MOVEMENT_INTERVAL_RANGE;
        if !(min..=max).contains(&self.movement_interval) {
            return Err(StalkerConfigError::IntervalOutOfRange {
                value: self.movement_interval,
                min,
                max,
            });
        }

        let (min, max) = CADENCE_STEP_RANGE;
        if !(min..=max).contains(&self.cadence_step) {
            return Err(StalkerConfigError::CadenceStepOutOfRange {
                value: self.cadence_step,
                min,
                max,
            });
        }

        let (min, max) = MIN_DISTANCE_RANGE;
        if !(min..=max).contains(&self.min_distance_to_next_point) {
            return Err(StalkerConfigError::MinDistanceOutOfRange {
                value: self.min_distance_to_next_point,
                min,
                max,
            });
        }

        Ok(())
    }
}
