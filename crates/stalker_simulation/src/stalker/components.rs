//! ECS компоненты stalker'а

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::config::StalkerConfig;
use super::error::StalkerConfigError;
use super::machine::StalkerStateMachine;
use super::services::StalkerServices;
use super::signals::SubscriptionToken;
use crate::DeterministicRng;

/// Stalker entity — владеет своей state machine
///
/// Transform синхронизируется из `machine.position()` каждый fixed тик.
#[derive(Component)]
#[require(Transform)]
pub struct Stalker {
    pub machine: StalkerStateMachine,
    /// Подписка на broadcast сигналы (выдаётся при появлении компонента)
    pub(crate) subscription: Option<SubscriptionToken>,
}

impl Stalker {
    pub fn new(machine: StalkerStateMachine) -> Self {
        Self {
            machine,
            subscription: None,
        }
    }

    pub fn subscription(&self) -> Option<SubscriptionToken> {
        self.subscription
    }
}

/// Маркер цели: её Transform — позиция, к которой идёт stalker
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StalkerTarget;

/// Debug-only: сфера min distance вокруг stalker'а (для оверлея)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StalkerDebugRadius {
    pub center: Vec3,
    pub radius: f32,
}

/// Helper: spawn stalker entity
///
/// RNG форкается из `DeterministicRng` (порядок spawn'ов определяет seed'ы).
/// Debug builds получают `StalkerDebugRadius`.
pub fn spawn_stalker(
    world: &mut World,
    config: StalkerConfig,
    services: StalkerServices,
) -> Result<Entity, StalkerConfigError> {
    let rng = match world.get_resource_mut::<DeterministicRng>() {
        Some(mut rng) => rng.fork(),
        None => {
            crate::log_warning("spawn_stalker: no DeterministicRng resource, using seed 0");
            ChaCha8Rng::seed_from_u64(0)
        }
    };

    let machine = StalkerStateMachine::new(config, services, rng)?;
    let mut entity = world.spawn(Stalker::new(machine));

    #[cfg(debug_assertions)]
    entity.insert(StalkerDebugRadius::default());

    Ok(entity.id())
}
