//! Waypoint данные: Point, PointId, PointCategory
//!
//! Points принадлежат внешнему WaypointGraph. Stalker хранит только snapshot
//! текущей точки (никогда не мутирует данные графа).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable ID точки в графе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(pub u32);

/// Категория точки — определяет визуал stalker'а на этой точке
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointCategory {
    /// Без тега: визуал выбирается случайно (Fly/Stand/Cross)
    #[default]
    None,
    Sexy,
    Stand,
    Cross,
    Hand,
    Fly,
}

/// Waypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub position: Vec3,
    #[serde(default)]
    pub category: PointCategory,
    /// true — это текущая точка цели (переход на неё = поимка)
    #[serde(default)]
    pub is_target: bool,
}

impl Point {
    pub fn new(id: u32, position: Vec3, category: PointCategory) -> Self {
        Self {
            id: PointId(id),
            position,
            category,
            is_target: false,
        }
    }

    /// Точка цели (is_target = true)
    pub fn target(id: u32, position: Vec3) -> Self {
        Self {
            id: PointId(id),
            position,
            category: PointCategory::None,
            is_target: true,
        }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        self.position.distance(other.position)
    }
}
