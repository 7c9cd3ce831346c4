//! Ошибки конфигурации stalker'а (fail-fast при инициализации)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StalkerConfigError {
    #[error("spawn point set is empty")]
    NoSpawnPoints,

    #[error("movement interval {value} is outside {min}..={max} seconds")]
    IntervalOutOfRange { value: f32, min: f32, max: f32 },

    #[error("cadence step {value} is outside {min}..={max}")]
    CadenceStepOutOfRange { value: f32, min: f32, max: f32 },

    #[error("min distance to next point {value} is outside {min}..={max}")]
    MinDistanceOutOfRange { value: f32, min: f32, max: f32 },

    #[error("failed to parse stalker config: {0}")]
    Parse(#[from] serde_json::Error),
}
