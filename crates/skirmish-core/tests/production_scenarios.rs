//! Construction, repair, and training scenarios.

use glam::{IVec2, Vec2};
use skirmish_core::faction::FoodCounter;
use skirmish_core::prelude::*;
use skirmish_core::spatial::Region;

fn step() -> SimulationStep {
    SimulationStep::new(0, 0.0, 0.5)
}

struct Base {
    world: World,
    red: FactionId,
    food: FoodCounter,
}

fn base() -> Base {
    let mut world = World::new(WorldConfig::default());
    let faction = BasicFaction::new("red");
    let food = faction.food_counter();
    let red = world.factions_mut().register(Box::new(faction));

    let prototypes = world.prototypes_mut();
    prototypes
        .register(
            "barracks",
            &[
                Spatial::new(Vec2::ZERO, IVec2::splat(2), CollisionLayer::Ground).into(),
                Health::new(100, Constitution::Mechanical).into(),
                Cost::new(4.0, 0).into(),
                Trainer::new(1.0, ["footman"]).into(),
                TaskQueue::new().into(),
            ],
        )
        .unwrap();
    prototypes
        .register(
            "footman",
            &[
                Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
                Health::new(40, Constitution::Biological).into(),
                Cost::new(2.0, 1).into(),
                Mobile::new(1.0).into(),
                TaskQueue::new().into(),
            ],
        )
        .unwrap();
    prototypes
        .register(
            "worker",
            &[
                Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
                Health::new(20, Constitution::Biological).into(),
                Builder::new(1.0).into(),
                Mobile::new(1.0).into(),
                TaskQueue::new().into(),
            ],
        )
        .unwrap();
    prototypes
        .register(
            "rock",
            &[Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into()],
        )
        .unwrap();

    Base { world, red, food }
}

fn count<F: Fn(&SimEvent) -> bool>(events: &[SimEvent], predicate: F) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn construction_raises_health_linearly_then_unveils_behaviour() {
    let mut b = base();
    let site = b
        .world
        .spawn_under_construction("barracks", Vec2::new(10.0, 10.0), Some(b.red))
        .unwrap();
    assert_eq!(b.world.current_health(site), Some(1.0));
    assert!(!b.world.has_component::<Trainer>(site));
    assert!(!b.world.has_component::<TaskQueue>(site));
    assert!(matches!(
        b.world.train(site, "footman"),
        Err(SimError::NotTrainable { .. })
    ));

    let worker = b.world.spawn("worker", Vec2::new(9.0, 10.0), Some(b.red)).unwrap();
    b.world
        .enqueue_task(worker, Box::new(BuildTask::new(worker, site)))
        .unwrap();

    for _ in 0..4 {
        b.world.update(&step());
    }
    assert_eq!(b.world.current_health(site), Some(50.5));
    let progress = b.world.component::<BuildProgress>(site).unwrap().progress();
    assert_eq!(progress, 0.5);

    for _ in 0..4 {
        b.world.update(&step());
    }
    assert_eq!(b.world.current_health(site), Some(100.0));
    assert!(!b.world.has_component::<BuildProgress>(site));
    assert!(b.world.has_component::<Trainer>(site));
    assert!(b.world.has_component::<TaskQueue>(site));
    assert!(b.world.component::<TaskQueue>(worker).unwrap().is_empty());

    let events = b.world.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, SimEvent::ConstructionCompleted { entity } if *entity == site)),
        1
    );
}

#[test]
fn builder_walks_to_a_distant_site() {
    let mut b = base();
    let site = b
        .world
        .spawn_under_construction("barracks", Vec2::new(10.0, 10.0), Some(b.red))
        .unwrap();
    let worker = b.world.spawn("worker", Vec2::new(3.0, 10.5), Some(b.red)).unwrap();
    b.world
        .enqueue_task(worker, Box::new(BuildTask::new(worker, site)))
        .unwrap();

    b.world.update(&step());
    assert_eq!(b.world.component::<BuildProgress>(site).unwrap().progress(), 0.0);
    assert_eq!(
        b.world.component::<Spatial>(worker).unwrap().position().x,
        3.5
    );

    for _ in 0..40 {
        b.world.update(&step());
    }
    assert!(!b.world.has_component::<BuildProgress>(site));
}

#[test]
fn repair_restores_mechanical_health() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::new(10.0, 10.0), Some(b.red)).unwrap();
    let worker = b.world.spawn("worker", Vec2::new(12.0, 10.0), Some(b.red)).unwrap();
    b.world.apply_damage(barracks, 30.0);

    b.world
        .enqueue_task(worker, Box::new(BuildTask::new(worker, barracks)))
        .unwrap();
    // 100 health over 4 seconds of work, half a second per tick.
    b.world.update(&step());
    assert_eq!(b.world.current_health(barracks), Some(82.5));

    for _ in 0..3 {
        b.world.update(&step());
    }
    assert_eq!(b.world.current_health(barracks), Some(100.0));
    assert!(b.world.component::<TaskQueue>(worker).unwrap().is_empty());
}

#[test]
fn trained_unit_disembarks_next_to_trainer() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::new(10.0, 10.0), Some(b.red)).unwrap();
    b.world.train(barracks, "footman").unwrap();

    b.world.update(&step());
    assert_eq!(b.food.get(), 1);

    for _ in 0..3 {
        b.world.update(&step());
    }
    let events = b.world.drain_events();
    let unit = events
        .iter()
        .find_map(|event| match event {
            SimEvent::TrainingCompleted { trainer, unit } if *trainer == barracks => Some(*unit),
            _ => None,
        })
        .expect("footman should have been released");

    assert_eq!(b.world.state(unit), Some(EntityState::Active));
    assert_eq!(b.world.current_health(unit), Some(40.0));
    assert!(b.world.has_component::<TaskQueue>(unit));
    assert!(!b.world.has_component::<TrainProgress>(unit));
    assert_eq!(b.world.faction_of(unit), Some(b.red));

    let unit_region = b.world.spatial().region_of(unit).unwrap();
    let barracks_region = b.world.spatial().region_of(barracks).unwrap();
    assert!(Region::are_adjacent_or_intersecting(&unit_region, &barracks_region));
    assert!(!unit_region.intersects(&barracks_region));
    assert!(b.world.component::<TaskQueue>(barracks).unwrap().is_empty());
}

#[test]
fn blocked_exit_warns_once_and_retries() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::ZERO, Some(b.red)).unwrap();
    let rocks: Vec<EntityId> = [(2.0, 0.0), (2.0, 1.0), (2.0, 2.0), (0.0, 2.0), (1.0, 2.0)]
        .into_iter()
        .map(|(x, y)| b.world.spawn("rock", Vec2::new(x, y), None).unwrap())
        .collect();
    b.world.train(barracks, "footman").unwrap();

    for _ in 0..8 {
        b.world.update(&step());
    }
    let events = b.world.drain_events();
    assert_eq!(
        count(&events, |e| matches!(
            e,
            SimEvent::Warning {
                warning: Warning::NoDisembarkTile,
                ..
            }
        )),
        1
    );
    assert_eq!(count(&events, |e| matches!(e, SimEvent::TrainingCompleted { .. })), 0);
    assert_eq!(b.food.get(), 1);

    b.world.remove_entity(rocks[1]);
    b.world.update(&step());
    let events = b.world.drain_events();
    let unit = events
        .iter()
        .find_map(|event| match event {
            SimEvent::TrainingCompleted { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("footman should leave through the freed tile");
    assert_eq!(
        b.world.component::<Spatial>(unit).unwrap().position(),
        Vec2::new(2.0, 1.0)
    );
}

#[test]
fn cancelling_training_releases_the_trainee() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::new(10.0, 10.0), Some(b.red)).unwrap();
    let handle = b.world.train(barracks, "footman").unwrap();
    b.world.update(&step());
    assert_eq!(b.food.get(), 1);
    let before = b.world.entity_count();

    b.world.cancel_task(barracks, handle).unwrap();

    assert_eq!(b.food.get(), 0);
    assert_eq!(b.world.entity_count(), before - 1);
    assert!(b.world.is_consistent());
}

#[test]
fn trainer_death_discards_the_trainee() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::new(10.0, 10.0), Some(b.red)).unwrap();
    b.world.train(barracks, "footman").unwrap();
    b.world.train(barracks, "footman").unwrap();
    b.world.update(&step());
    assert_eq!(b.food.get(), 1);

    b.world.kill(barracks);

    assert_eq!(b.food.get(), 0);
    assert_eq!(b.world.entity_count(), 0);
}

#[test]
fn unknown_training_requests_are_rejected() {
    let mut b = base();
    let barracks = b.world.spawn("barracks", Vec2::new(10.0, 10.0), Some(b.red)).unwrap();
    assert!(matches!(
        b.world.train(barracks, "dragon"),
        Err(SimError::NotTrainable { .. })
    ));
    assert!(matches!(
        b.world.train(barracks, "worker"),
        Err(SimError::NotTrainable { .. })
    ));
    assert!(b.world.component::<TaskQueue>(barracks).unwrap().is_empty());
}
