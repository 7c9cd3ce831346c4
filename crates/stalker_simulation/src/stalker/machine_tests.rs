//! Tests for StalkerStateMachine.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::stalker::config::{AudioClip, PrefabHandle, RepresentationSet, StalkerConfig};
    use crate::stalker::error::StalkerConfigError;
    use crate::stalker::headless::{HeadlessScene, RecordingAudio, ScriptedGraph};
    use crate::stalker::machine::{StalkerEvent, StalkerState, StalkerStateMachine};
    use crate::stalker::point::{Point, PointCategory, PointId};
    use crate::stalker::services::{InstanceId, StalkerServices};
    use crate::logger::{set_logger, MemoryLogger};

    const ARRIVAL_FX: &str = "fx/arrival";
    const VISION_FX: &str = "fx/vision";

    struct Fixture {
        machine: StalkerStateMachine,
        scene: HeadlessScene,
        graph: ScriptedGraph,
        audio: RecordingAudio,
    }

    fn prefab(name: &str) -> PrefabHandle {
        PrefabHandle::new(name)
    }

    fn point(id: u32, x: f32, category: PointCategory) -> Point {
        Point::new(id, Vec3::new(x, 0.0, 0.0), category)
    }

    fn test_config() -> StalkerConfig {
        StalkerConfig {
            movement_interval: 3.0,
            cadence_step: 1.0,
            min_distance_to_next_point: 6.0,
            spawn_points: vec![
                point(1, 0.0, PointCategory::Fly),
                point(2, 10.0, PointCategory::Stand),
            ],
            representations: RepresentationSet {
                none: Some(prefab("rep/none")),
                fly: Some(prefab("rep/fly")),
                stand: Some(prefab("rep/stand")),
                cross: Some(prefab("rep/cross")),
                ..Default::default()
            },
            spawn_effect: Some(prefab(ARRIVAL_FX)),
            vision_effect: Some(prefab(VISION_FX)),
            spawn_clips: vec![AudioClip::new("sfx/spawn_a"), AudioClip::new("sfx/spawn_b")],
            play_on_awake: true,
            catch_damage: 1,
        }
    }

    fn fixture_with(config: StalkerConfig) -> Fixture {
        let scene = HeadlessScene::new()
            .with_effect(prefab(ARRIVAL_FX), 1.5)
            .with_effect(prefab(VISION_FX), 0.5);
        let graph = ScriptedGraph::new();
        let audio = RecordingAudio::new();

        let services = StalkerServices::new(graph.clone(), scene.clone(), audio.clone())
            .with_anchor(InstanceId(999));
        let machine = StalkerStateMachine::new(config, services, ChaCha8Rng::seed_from_u64(7))
            .expect("valid config");

        Fixture {
            machine,
            scene,
            graph,
            audio,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(test_config())
    }

    /// Fixture, заспавненный на точке 1 (Fly, origin)
    fn spawned() -> Fixture {
        let mut f = fixture();
        f.machine.spawn_at(point(1, 0.0, PointCategory::Fly));
        f
    }

    fn tick_n(machine: &mut StalkerStateMachine, n: usize, delta: f32) -> Vec<StalkerEvent> {
        (0..n).flat_map(|_| machine.tick(delta)).collect()
    }

    fn caught_count(events: &[StalkerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, StalkerEvent::TargetCaught { .. }))
            .count()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    #[test]
    fn test_new_rejects_invalid_config() {
        let services = StalkerServices::new(
            ScriptedGraph::new(),
            HeadlessScene::new(),
            RecordingAudio::new(),
        );
        let config = StalkerConfig {
            spawn_points: Vec::new(),
            ..test_config()
        };

        let result = StalkerStateMachine::new(config, services, ChaCha8Rng::seed_from_u64(1));
        assert!(matches!(result, Err(StalkerConfigError::NoSpawnPoints)));
    }

    #[test]
    fn test_initially_disabled_and_ticks_are_noop() {
        let mut f = fixture();
        assert_eq!(f.machine.state(), StalkerState::Disabled);
        assert!(!f.machine.is_enabled());

        assert!(tick_n(&mut f.machine, 10, 1.0).is_empty());
        assert_eq!(f.machine.timer(), 0.0);
        assert_eq!(f.graph.queries(), 0);
    }

    #[test]
    fn test_start_spawns_when_play_on_awake() {
        let mut f = fixture();
        let events = f.machine.start();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StalkerEvent::Spawned { .. }));
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert!(f.machine.is_enabled());
        assert!(f.machine.is_spawning());
        assert_eq!(f.audio.played().len(), 1);

        let representation = f.machine.representation().expect("representation");
        assert!(!representation.shown);
        assert_eq!(f.scene.is_shown(representation.instance), Some(false));
        assert_eq!(
            f.scene.instance(representation.instance).and_then(|i| i.parent),
            Some(InstanceId(999))
        );
    }

    #[test]
    fn test_start_without_play_on_awake_stays_disabled() {
        let mut f = fixture_with(StalkerConfig {
            play_on_awake: false,
            ..test_config()
        });

        assert!(f.machine.start().is_empty());
        assert_eq!(f.machine.state(), StalkerState::Disabled);
        assert!(f.machine.representation().is_none());
        assert!(f.audio.played().is_empty());
    }

    #[test]
    fn test_spawn_at_uses_point_category() {
        let mut f = fixture();
        f.machine.spawn_at(point(5, 4.0, PointCategory::Stand));

        let representation = f.machine.representation().expect("representation");
        assert_eq!(representation.prefab, prefab("rep/stand"));
        assert_eq!(f.machine.position(), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(f.machine.current_point().map(|p| p.id), Some(PointId(5)));
    }

    #[test]
    fn test_respawn_replaces_representation() {
        let mut f = spawned();
        let first = f.machine.representation().map(|r| r.instance);

        f.machine.spawn_at(point(2, 10.0, PointCategory::Stand));
        let second = f.machine.representation().map(|r| r.instance);

        assert_ne!(first, second);
        assert!(!f.scene.is_alive(first.expect("first")));
        assert_eq!(f.scene.live_count(), 1);
    }

    // ------------------------------------------------------------------
    // Timer + move step
    // ------------------------------------------------------------------

    #[test]
    fn test_move_after_interval() {
        let mut f = spawned();
        let old = f.machine.representation().map(|r| r.instance).expect("rep");
        f.graph.push(Some(point(3, 20.0, PointCategory::Cross)));

        let events = tick_n(&mut f.machine, 2, 1.0);
        assert!(events.is_empty());
        assert_eq!(f.machine.timer(), 2.0);
        assert_eq!(f.graph.queries(), 0);

        let events = f.machine.tick(1.0);
        assert_eq!(
            events,
            vec![StalkerEvent::Moved {
                point: PointId(3),
                position: Vec3::new(20.0, 0.0, 0.0),
            }]
        );
        assert_eq!(f.graph.queries(), 1);
        assert_eq!(f.machine.timer(), 0.0);
        assert_eq!(f.machine.current_point().map(|p| p.id), Some(PointId(3)));
        assert_eq!(f.machine.position(), Vec3::new(20.0, 0.0, 0.0));

        let representation = f.machine.representation().expect("representation");
        assert_eq!(representation.prefab, prefab("rep/cross"));
        assert!(!representation.shown);
        assert!(!f.scene.is_alive(old));
        assert_eq!(f.scene.live_count(), 1);
    }

    #[test]
    fn test_catching_target_fires_once_and_enters_dead() {
        let mut f = spawned();
        f.graph.push(Some(Point::target(100, Vec3::new(3.0, 0.0, 0.0))));

        let events = tick_n(&mut f.machine, 3, 1.0);
        assert_eq!(caught_count(&events), 1);
        assert!(events.contains(&StalkerEvent::TargetCaught { damage: 1 }));
        assert_eq!(f.machine.state(), StalkerState::Dead);
        assert!(!f.machine.is_enabled());
        assert!(f.machine.representation().is_none());
        assert_eq!(f.scene.live_count(), 0);

        // Повторные тики — тишина
        let events = tick_n(&mut f.machine, 20, 1.0);
        assert!(events.is_empty());
        assert_eq!(f.graph.queries(), 1);
    }

    #[test]
    fn test_dead_ignores_resume_until_respawn() {
        let mut f = spawned();
        f.graph.push(Some(Point::target(100, Vec3::ZERO)));
        tick_n(&mut f.machine, 3, 1.0);

        f.machine.pause();
        f.machine.resume();
        assert_eq!(f.machine.state(), StalkerState::Dead);
        assert!(!f.machine.is_enabled());

        f.machine.spawn_at_random();
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert!(f.machine.is_enabled());
    }

    #[test]
    fn test_missing_next_point_waits_in_place() {
        let mut f = spawned();
        let old = f.machine.representation().map(|r| r.instance).expect("rep");

        let events = tick_n(&mut f.machine, 3, 1.0);
        assert_eq!(events, vec![StalkerEvent::Stalled]);
        assert!(f.machine.representation().is_none());
        assert!(!f.scene.is_alive(old));
        assert_eq!(f.scene.live_count(), 0);
        assert_eq!(f.machine.current_point().map(|p| p.id), Some(PointId(1)));
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert_eq!(f.machine.timer(), 0.0);

        // Следующий таймаут — повторный запрос
        f.graph.push(Some(point(2, 10.0, PointCategory::Stand)));
        let events = tick_n(&mut f.machine, 3, 1.0);
        assert_eq!(f.graph.queries(), 2);
        assert!(matches!(events.as_slice(), [StalkerEvent::Moved { point: PointId(2), .. }]));
        assert!(f.machine.representation().is_some());
    }

    #[test]
    fn test_at_most_one_representation_over_many_moves() {
        let mut f = spawned();
        for i in 0..30 {
            let answer = if i % 4 == 3 {
                None
            } else {
                Some(point(10 + i, i as f32 * 7.0, PointCategory::None))
            };
            f.graph.push(answer);
        }

        for _ in 0..(30 * 3) {
            f.machine.tick(1.0);
            assert!(f.scene.live_count() <= 1);
        }
        assert_eq!(f.graph.queries(), 30);
    }

    #[test]
    fn test_ambient_level_changes_cadence() {
        let mut f = spawned();
        f.machine.on_ambient_level_changed(5);
        assert_eq!(f.machine.interval(), 2.0);

        f.graph.push(Some(point(2, 10.0, PointCategory::Stand)));
        let events = tick_n(&mut f.machine, 2, 1.0);
        assert_eq!(events.len(), 1);

        f.machine.on_ambient_level_changed(1);
        assert_eq!(f.machine.interval(), 3.0);
    }

    // ------------------------------------------------------------------
    // Visibility + arrival effect
    // ------------------------------------------------------------------

    #[test]
    fn test_reveal_spawns_vision_and_arrival_effects() {
        let mut f = spawned();
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);

        let events = f.machine.tick(0.5);
        assert_eq!(
            events,
            vec![
                StalkerEvent::Revealed { position: Vec3::ZERO },
                StalkerEvent::ArrivalEffectStarted { position: Vec3::ZERO },
            ]
        );

        let representation = f.machine.representation().expect("representation");
        assert!(representation.shown);
        assert_eq!(f.scene.is_shown(representation.instance), Some(true));
        assert_eq!(f.scene.live_of(&prefab(VISION_FX)).len(), 1);
        assert_eq!(f.scene.live_of(&prefab(ARRIVAL_FX)).len(), 1);
    }

    #[test]
    fn test_arrival_effect_blocks_timer() {
        let mut f = spawned();
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);
        f.machine.tick(0.5);
        assert_eq!(f.machine.timer(), 0.5);

        let events = tick_n(&mut f.machine, 10, 1.0);
        assert_eq!(f.machine.state(), StalkerState::Blocked);
        assert_eq!(f.machine.timer(), 0.5);
        assert_eq!(f.graph.queries(), 0);
        assert!(events.is_empty());

        // Эффект закончился, reveal условие снято → движение снова
        f.machine.set_in_sight(false);
        f.scene.advance(2.0);
        f.machine.tick(1.0);
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert_eq!(f.machine.timer(), 1.5);
    }

    #[test]
    fn test_finished_effect_is_replaced_while_revealed() {
        let mut f = spawned();
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);
        f.machine.tick(0.5);
        let first = f.scene.live_of(&prefab(ARRIVAL_FX));

        f.scene.advance(2.0);
        let events = f.machine.tick(0.5);
        assert!(events.contains(&StalkerEvent::ArrivalEffectStarted { position: Vec3::ZERO }));

        let second = f.scene.live_of(&prefab(ARRIVAL_FX));
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
        assert_eq!(f.machine.state(), StalkerState::Idle);
    }

    #[test]
    fn test_sticky_visibility_through_machine() {
        let mut f = spawned();
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);
        f.machine.tick(0.1);

        f.machine.set_in_sight(false);
        let events = f.machine.tick(0.1);
        assert!(!events.iter().any(|e| matches!(e, StalkerEvent::Concealed { .. })));
        assert!(f.machine.representation().map(|r| r.shown).unwrap_or(false));

        f.machine.set_gesture_active(false);
        let events = f.machine.tick(0.1);
        assert_eq!(events, vec![StalkerEvent::Concealed { position: Vec3::ZERO }]);
        assert!(!f.machine.representation().map(|r| r.shown).unwrap_or(true));
    }

    #[test]
    fn test_new_representation_reveals_again_while_gesture_held() {
        let mut f = fixture_with(StalkerConfig {
            spawn_effect: None,
            ..test_config()
        });
        f.machine.spawn_at(point(1, 0.0, PointCategory::Fly));
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);
        f.machine.tick(1.0);

        f.machine.set_in_sight(false);
        f.graph.push(Some(point(2, 10.0, PointCategory::Stand)));
        tick_n(&mut f.machine, 2, 1.0);
        assert_eq!(f.machine.current_point().map(|p| p.id), Some(PointId(2)));
        assert!(!f.machine.representation().map(|r| r.shown).unwrap_or(true));

        // Новый визуал создан скрытым — sticky флаг показывает его на следующем тике
        let events = f.machine.tick(1.0);
        assert!(events.iter().any(|e| matches!(e, StalkerEvent::Revealed { .. })));
        assert!(f.machine.representation().map(|r| r.shown).unwrap_or(false));
    }

    #[test]
    fn test_representation_faces_target_horizontally() {
        let mut f = spawned();
        f.machine.track_target(Vec3::new(10.0, 5.0, 0.0));
        f.machine.tick(0.1);

        let instance = f.machine.representation().map(|r| r.instance).expect("rep");
        let rotation = f.scene.instance(instance).map(|i| i.rotation).expect("instance");
        let forward = rotation * Vec3::NEG_Z;

        assert!(forward.distance(Vec3::X) < 1e-4, "forward = {:?}", forward);
    }

    // ------------------------------------------------------------------
    // Pause / resume / despawn
    // ------------------------------------------------------------------

    #[test]
    fn test_pause_then_resume_restores_position() {
        let mut f = fixture();
        f.machine.spawn_at(point(2, 10.0, PointCategory::Stand));
        f.machine.tick(1.0);

        f.machine.pause();
        assert_eq!(f.machine.state(), StalkerState::Disabled);
        assert_eq!(f.machine.position(), Vec3::ZERO);
        assert_eq!(f.machine.timer(), 0.0);
        assert!(tick_n(&mut f.machine, 10, 1.0).is_empty());

        f.machine.resume();
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert!(f.machine.is_enabled());
        assert_eq!(f.machine.position(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_pause_then_despawn_blocks_resume() {
        let mut f = fixture();
        f.machine.spawn_at(point(2, 10.0, PointCategory::Stand));

        f.machine.pause();
        f.machine.despawn();
        f.machine.resume();

        assert_eq!(f.machine.state(), StalkerState::Disabled);
        assert!(!f.machine.is_enabled());
        assert!(!f.machine.is_spawning());
        assert_eq!(f.machine.position(), Vec3::ZERO);
        assert_eq!(f.graph.clears(), 1);
        assert!(f.machine.representation().is_none());
        assert_eq!(f.scene.live_count(), 0);
    }

    #[test]
    fn test_resume_while_running_is_noop() {
        let mut f = fixture();
        f.machine.spawn_at(point(2, 10.0, PointCategory::Stand));
        f.machine.resume();
        assert_eq!(f.machine.position(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_despawn_then_spawn_at_random_restores_idle() {
        let mut f = spawned();
        f.machine.tick(2.0);
        let old = f.machine.representation().map(|r| r.instance).expect("rep");

        f.machine.despawn();
        let events = f.machine.spawn_at_random();

        assert!(matches!(events.as_slice(), [StalkerEvent::Spawned { .. }]));
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert_eq!(f.machine.timer(), 0.0);
        assert!(f.machine.is_spawning());

        let fresh = f.machine.representation().map(|r| r.instance).expect("fresh rep");
        assert_ne!(old, fresh);
        assert!(f.scene.is_alive(fresh));
        assert_eq!(f.scene.live_count(), 1);
    }

    #[test]
    fn test_set_spawn_points_rejects_empty_and_spawns_otherwise() {
        let mut f = spawned();
        let before = f.machine.current_point().map(|p| p.id);

        assert!(matches!(
            f.machine.set_spawn_points(Vec::new()),
            Err(StalkerConfigError::NoSpawnPoints)
        ));
        assert_eq!(f.machine.current_point().map(|p| p.id), before);

        let events = f
            .machine
            .set_spawn_points(vec![point(40, 40.0, PointCategory::Cross)])
            .expect("non-empty set");
        assert!(matches!(events.as_slice(), [StalkerEvent::Spawned { point: PointId(40), .. }]));
        assert_eq!(f.machine.config().spawn_points.len(), 1);
        assert_eq!(
            f.machine.representation().map(|r| r.prefab.clone()),
            Some(prefab("rep/cross"))
        );
        assert_eq!(f.machine.position(), Vec3::new(40.0, 0.0, 0.0));
    }

    #[test]
    fn test_spawn_clip_chosen_from_config() {
        let mut f = fixture();
        for _ in 0..10 {
            f.machine.spawn_at_random();
        }

        let played = f.audio.played();
        assert_eq!(played.len(), 10);
        assert!(played
            .iter()
            .all(|clip| clip.0 == "sfx/spawn_a" || clip.0 == "sfx/spawn_b"));
    }

    #[test]
    fn test_debug_radius_follows_position() {
        let mut f = fixture();
        f.machine.spawn_at(point(2, 10.0, PointCategory::Stand));

        let sphere = f.machine.debug_radius();
        assert_eq!(sphere.center, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(sphere.radius, 6.0);
    }

    #[test]
    fn test_drop_releases_representation_and_arrival_effect() {
        let mut f = spawned();
        f.machine.set_gesture_active(true);
        f.machine.set_in_sight(true);
        f.machine.tick(0.1);

        let representation = f.machine.representation().map(|r| r.instance).expect("representation");
        assert_eq!(f.scene.live_of(&prefab(ARRIVAL_FX)).len(), 1);

        let Fixture { machine, scene, .. } = f;
        drop(machine);

        assert!(!scene.is_alive(representation));
        assert!(scene.live_of(&prefab(ARRIVAL_FX)).is_empty());
        // Vision impact — fire-and-forget, доигрывает сам
        assert_eq!(scene.live_of(&prefab(VISION_FX)).len(), 1);
    }

    #[test]
    fn test_missing_prefab_keeps_slot_empty_and_logs() {
        let logger = MemoryLogger::new();
        set_logger(Box::new(logger.clone()));

        let mut f = fixture_with(StalkerConfig {
            representations: RepresentationSet::default(),
            spawn_effect: None,
            ..test_config()
        });
        f.machine.spawn_at(point(1, 0.0, PointCategory::Fly));
        assert!(f.machine.representation().is_none());

        f.graph.push(Some(point(2, 10.0, PointCategory::Stand)));
        let events = tick_n(&mut f.machine, 3, 1.0);

        assert!(events.contains(&StalkerEvent::Moved {
            point: PointId(2),
            position: Vec3::new(10.0, 0.0, 0.0),
        }));
        assert!(f.machine.representation().is_none());
        assert_eq!(f.scene.live_count(), 0);
        assert_eq!(f.machine.state(), StalkerState::Idle);
        assert!(logger.contains("no representation configured for Fly"));
        assert!(logger.contains("no representation configured for Stand"));
    }
}
