//! SignalBus — подписки stalker'ов на broadcast сигналы
//!
//! Токен выдаётся когда появляется компонент `Stalker` и освобождается когда
//! компонент удалён (despawn entity). Сигналы получают только подписанные.

use bevy::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

/// BTreeMap — детерминированный порядок доставки
#[derive(Resource, Debug, Default)]
pub struct SignalBus {
    next_token: u64,
    subscribers: BTreeMap<SubscriptionToken, Entity>,
}

impl SignalBus {
    pub fn subscribe(&mut self, entity: Entity) -> SubscriptionToken {
        if let Some(token) = self.token_of(entity) {
            return token;
        }

        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.subscribers.insert(token, entity);
        token
    }

    pub fn release(&mut self, token: SubscriptionToken) -> Option<Entity> {
        self.subscribers.remove(&token)
    }

    pub fn release_entity(&mut self, entity: Entity) -> Option<SubscriptionToken> {
        let token = self.token_of(entity)?;
        self.subscribers.remove(&token);
        Some(token)
    }

    pub fn token_of(&self, entity: Entity) -> Option<SubscriptionToken> {
        self.subscribers
            .iter()
            .find(|(_, subscriber)| **subscriber == entity)
            .map(|(token, _)| *token)
    }

    pub fn is_subscribed(&self, entity: Entity) -> bool {
        self.token_of(entity).is_some()
    }

    pub fn subscribers(&self) -> impl Iterator<Item = Entity> + '_ {
        self.subscribers.values().copied()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
