//! SpawnEffectGate — arrival effect блокирует движение пока играет

use bevy::prelude::*;

use super::config::PrefabHandle;
use super::services::{InstanceId, Instantiator};

#[derive(Debug, Default)]
pub struct SpawnEffectGate {
    instance: Option<InstanceId>,
}

impl SpawnEffectGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// true ровно пока инстанс существует и играет
    pub fn is_blocking(&self, instantiator: &dyn Instantiator) -> bool {
        self.instance
            .map(|instance| instantiator.is_playing(instance))
            .unwrap_or(false)
    }

    /// Создаёт новый эффект если reveal условие выполнено и прошлый
    /// отсутствует или закончился. Возвращает id нового инстанса.
    pub fn refresh(
        &mut self,
        reveal_condition: bool,
        prefab: Option<&PrefabHandle>,
        position: Vec3,
        instantiator: &mut dyn Instantiator,
    ) -> Option<InstanceId> {
        if !reveal_condition {
            return None;
        }
        let prefab = prefab?;

        if let Some(previous) = self.instance {
            if instantiator.is_playing(previous) {
                return None;
            }
            instantiator.destroy(previous);
        }

        let instance = instantiator.create(prefab, position, Quat::IDENTITY, None);
        self.instance = Some(instance);
        Some(instance)
    }

    pub fn release(&mut self, instantiator: &mut dyn Instantiator) {
        if let Some(instance) = self.instance.take() {
            instantiator.destroy(instance);
        }
    }
}
