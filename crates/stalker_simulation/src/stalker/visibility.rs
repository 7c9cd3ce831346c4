//! VisibilityGate — показать/спрятать stalker'а
//!
//! Правило: показан если (in_sight && gesture) || (gesture && mesh_active).
//! Пока gesture активен, уже показанный stalker остаётся видимым даже без
//! line-of-sight. Gesture off → прячется всегда.

/// Сигналы от цели (кэшируются до следующего тика)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSignals {
    /// Gesture цели активен (уже debounced снаружи)
    pub gesture_active: bool,
    /// Stalker в поле зрения цели
    pub in_sight: bool,
}

impl TargetSignals {
    /// Оба сигнала сразу — условие reveal'а и arrival effect'а
    pub fn reveal_condition(&self) -> bool {
        self.in_sight && self.gesture_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityDecision {
    pub should_show: bool,
    /// Пересечение границы shown ↔ hidden (ровно один раз на пересечение)
    pub transitioned: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityGate {
    /// Sticky флаг "меш показан" — отличается от in_sight и переживает смену визуала
    mesh_active: bool,
}

impl VisibilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_active(&self) -> bool {
        self.mesh_active
    }

    /// `currently_shown` — фактическое состояние отрисовки текущего визуала
    pub fn evaluate(&mut self, signals: TargetSignals, currently_shown: bool) -> VisibilityDecision {
        let should_show =
            signals.reveal_condition() || (signals.gesture_active && self.mesh_active);
        let transitioned = should_show != currently_shown;

        if transitioned {
            self.mesh_active = should_show;
        }

        VisibilityDecision {
            should_show,
            transitioned,
        }
    }
}
