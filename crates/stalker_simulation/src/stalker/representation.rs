//! Визуал stalker'а: выбор префаба по категории + single-slot владение
//!
//! В слоте живёт не больше одного инстанса. `replace` уничтожает старый
//! инстанс до создания нового, в рамках одного вызова.

use bevy::prelude::*;
use rand::Rng;

use super::config::{PrefabHandle, RepresentationSet};
use super::point::PointCategory;
use super::services::{InstanceId, Instantiator};

/// Re-roll таблица для точек без тега.
///
/// Индекс берётся из `0..NONE_REROLL_RANGE`, поэтому Hand никогда не выпадает.
pub const NONE_REROLL: [PointCategory; 4] = [
    PointCategory::Fly,
    PointCategory::Stand,
    PointCategory::Cross,
    PointCategory::Hand,
];
pub const NONE_REROLL_RANGE: usize = 3;

/// Порядок override'ов (последний совпавший выигрывает)
const OVERRIDE_ORDER: [PointCategory; 5] = [
    PointCategory::Sexy,
    PointCategory::Stand,
    PointCategory::Cross,
    PointCategory::Hand,
    PointCategory::Fly,
];

/// Выбор префаба для категории точки
///
/// - Старт с None префаба
/// - None точка + None префаб настроен → случайная категория из Fly/Stand/Cross
/// - Категория с настроенным префабом перекрывает None
///
/// `None` в результате — не настроен даже None префаб.
pub fn select_representation<'a, R: Rng + ?Sized>(
    set: &'a RepresentationSet,
    category: PointCategory,
    rng: &mut R,
) -> Option<&'a PrefabHandle> {
    let mut chosen = set.none.as_ref();
    let mut category = category;

    if category == PointCategory::None && chosen.is_some() {
        category = NONE_REROLL[rng.gen_range(0..NONE_REROLL_RANGE)];
    }

    for candidate in OVERRIDE_ORDER {
        if category == candidate {
            if let Some(prefab) = set.get(candidate) {
                chosen = Some(prefab);
            }
        }
    }

    chosen
}

/// Живой визуал
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub instance: InstanceId,
    pub prefab: PrefabHandle,
    /// Меш сейчас отрисовывается
    pub shown: bool,
}

#[derive(Debug, Default)]
pub struct RepresentationSlot {
    current: Option<Representation>,
}

impl RepresentationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Representation> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Уничтожить текущий инстанс и создать новый (скрытым)
    pub fn replace(
        &mut self,
        instantiator: &mut dyn Instantiator,
        prefab: &PrefabHandle,
        position: Vec3,
        parent: Option<InstanceId>,
    ) -> InstanceId {
        self.release(instantiator);

        let instance = instantiator.create(prefab, position, Quat::IDENTITY, parent);
        instantiator.set_shown(instance, false);

        self.current = Some(Representation {
            instance,
            prefab: prefab.clone(),
            shown: false,
        });

        instance
    }

    /// Уничтожить инстанс (если есть). true — что-то было уничтожено
    pub fn release(&mut self, instantiator: &mut dyn Instantiator) -> bool {
        match self.current.take() {
            Some(representation) => {
                instantiator.destroy(representation.instance);
                true
            }
            None => false,
        }
    }

    pub fn set_shown(&mut self, instantiator: &mut dyn Instantiator, shown: bool) {
        if let Some(representation) = self.current.as_mut() {
            instantiator.set_shown(representation.instance, shown);
            representation.shown = shown;
        }
    }

    pub fn set_rotation(&self, instantiator: &mut dyn Instantiator, rotation: Quat) {
        if let Some(representation) = self.current.as_ref() {
            instantiator.set_rotation(representation.instance, rotation);
        }
    }
}
