//! Headless симуляция stalker'а
//!
//! Прямой коридор из точек, цель в конце. Stalker идёт к цели шагами,
//! gesture цели включён, in sight — короткое окно после каждого шага.
//! Останавливаемся на поимке, без поимки — exit 1.
//!
//! Опционально: путь к JSON конфигу первым аргументом.

use bevy::prelude::*;
use std::error::Error;

use stalker_simulation::stalker::headless::{HeadlessScene, PointGraph, RecordingAudio};
use stalker_simulation::{
    create_headless_app, log_error, log_info, spawn_stalker, GestureChanged, Point, PointCategory, PrefabHandle,
    RepresentationSet, SightChanged, StalkerConfig, StalkerMoved, StalkerServices, StalkerTarget, TargetCaught,
    VisionImpact, FIXED_TIMESTEP,
};

const SEED: u64 = 42;
const MAX_UPDATES: usize = 20_000;
const CATCH_RADIUS: f32 = 8.0;
/// Сколько update'ов цель смотрит на stalker'а после его шага
const SIGHT_WINDOW: usize = 25;

fn corridor() -> Vec<Point> {
    let categories = [
        PointCategory::None,
        PointCategory::Stand,
        PointCategory::Cross,
        PointCategory::Fly,
        PointCategory::Sexy,
    ];

    (0..=10)
        .map(|i| {
            let category = categories[i as usize % categories.len()];
            Point::new(i, Vec3::new(i as f32 * 10.0, 0.0, 0.0), category)
        })
        .collect()
}

fn default_config(points: &[Point]) -> StalkerConfig {
    StalkerConfig {
        movement_interval: 2.0,
        spawn_points: vec![points[0].clone()],
        representations: RepresentationSet {
            none: Some(PrefabHandle::new("stalker/idle")),
            stand: Some(PrefabHandle::new("stalker/stand")),
            cross: Some(PrefabHandle::new("stalker/cross")),
            fly: Some(PrefabHandle::new("stalker/fly")),
            ..Default::default()
        },
        spawn_effect: Some(PrefabHandle::new("fx/arrival")),
        vision_effect: Some(PrefabHandle::new("fx/vision")),
        ..Default::default()
    }
}

fn load_config(points: &[Point]) -> Result<StalkerConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(StalkerConfig::from_json_str(&json)?)
        }
        None => Ok(default_config(points)),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let points = corridor();
    let config = load_config(&points)?;

    log_info(&format!("Starting stalker headless simulation (seed: {})", SEED));

    let mut app = create_headless_app(SEED);

    let scene = HeadlessScene::new()
        .with_effect(PrefabHandle::new("fx/arrival"), 1.0)
        .with_effect(PrefabHandle::new("fx/vision"), 0.3);
    let services = StalkerServices::new(
        PointGraph::new(points.clone(), CATCH_RADIUS),
        scene.clone(),
        RecordingAudio::new(),
    );

    // Цель чуть дальше последней точки (внутри catch radius)
    let target_position = points[points.len() - 1].position + Vec3::new(5.0, 0.0, 0.0);
    app.world_mut()
        .spawn((StalkerTarget, Transform::from_translation(target_position)));
    let stalker = spawn_stalker(app.world_mut(), config, services)?;

    // Первый update: подписка + spawn
    app.update();
    app.world_mut().send_event(GestureChanged { active: true });

    // Цель замечает stalker'а на каждой новой точке (включая spawn), потом
    // отворачивается: arrival effect играет один раз, дальше таймер идёт до шага
    let mut sight_off_at = None;

    for update in 0..MAX_UPDATES {
        app.update();
        scene.advance(FIXED_TIMESTEP.as_secs_f32());

        if sight_off_at == Some(update) {
            app.world_mut().send_event(SightChanged {
                stalker,
                in_sight: false,
            });
            sight_off_at = None;
        }

        let moved: Vec<_> = app.world_mut().resource_mut::<Events<StalkerMoved>>().drain().collect();
        if moved.iter().any(|event| event.stalker == stalker) {
            sight_off_at = reveal(&mut app, stalker, update);
        }

        for impact in app.world_mut().resource_mut::<Events<VisionImpact>>().drain() {
            log_info(&format!(
                "Update {}: vision impact at {:?} (revealed: {})",
                update, impact.position, impact.revealed
            ));
        }

        let caught: Vec<_> = app.world_mut().resource_mut::<Events<TargetCaught>>().drain().collect();
        if let Some(event) = caught.first() {
            log_info(&format!(
                "Update {}: target caught by {:?} (damage {})",
                update, event.stalker, event.damage
            ));
            log_info(&format!("Simulation complete! Live instances: {}", scene.live_count()));
            return Ok(());
        }
    }

    Err(format!("target not caught after {} updates", MAX_UPDATES).into())
}

/// Stalker в поле зрения на `SIGHT_WINDOW` update'ов
fn reveal(app: &mut App, stalker: Entity, update: usize) -> Option<usize> {
    app.world_mut().send_event(SightChanged {
        stalker,
        in_sight: true,
    });
    Some(update + SIGHT_WINDOW)
}

fn main() {
    if let Err(err) = run() {
        log_error(&format!("Simulation failed: {}", err));
        std::process::exit(1);
    }
}
