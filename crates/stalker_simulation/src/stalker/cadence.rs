//! CadenceController — интервал движения от ambient уровня шума
//!
//! Уровень упал → stalker медленнее (+step). Иначе → быстрее (-step), но
//! интервал не уходит ниже нуля. Верхнего предела нет.
//! Сравнение строгое: повтор того же уровня тоже ускоряет.

#[derive(Debug, Clone)]
pub struct CadenceController {
    interval: f32,
    step: f32,
    last_level: i32,
}

impl CadenceController {
    pub fn new(interval: f32, step: f32) -> Self {
        Self {
            interval,
            step,
            last_level: 0,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn last_level(&self) -> i32 {
        self.last_level
    }

    pub fn on_ambient_level_changed(&mut self, level: i32) {
        if level < self.last_level {
            self.interval += self.step;
        } else if self.interval - self.step >= 0.0 {
            self.interval -= self.step;
        }
        self.last_level = level;
    }
}
