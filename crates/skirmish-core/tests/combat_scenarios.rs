//! End-to-end combat scenarios driven through `World::update`.

use glam::{IVec2, Vec2};
use skirmish_core::combat::{attacker, explosion_falloff, kamikaze};
use skirmish_core::prelude::*;

const STEP: f32 = 0.5;

fn step(number: u64) -> SimulationStep {
    SimulationStep::new(number, number as f64 * STEP as f64, STEP)
}

struct Match {
    world: World,
    red: FactionId,
    blue: FactionId,
}

impl Match {
    fn new() -> Self {
        let mut world = World::new(WorldConfig::default());
        let red = world.factions_mut().register(Box::new(BasicFaction::new("red")));
        let blue = world.factions_mut().register(Box::new(BasicFaction::new("blue")));
        Self { world, red, blue }
    }

    fn place(&mut self, x: f32, faction: FactionId, mut extra: Vec<Component>) -> EntityId {
        let mut components: Vec<Component> = vec![
            Spatial::new(Vec2::new(x, 0.0), IVec2::ONE, CollisionLayer::Ground).into(),
            FactionMembership::new(faction).into(),
        ];
        components.append(&mut extra);
        let id = self.world.create_entity(components);
        self.world.activate(id);
        id
    }

    fn run(&mut self, ticks: u64) {
        for n in 0..ticks {
            self.world.update(&step(n));
        }
    }
}

fn soldier(power: i32, range: f32) -> Vec<Component> {
    vec![
        Health::new(50, Constitution::Biological).into(),
        Attacker::new(power, range, 1.0).into(),
        Vision::new(6.0).into(),
        TaskQueue::new().into(),
    ]
}

fn dummy(max_health: i32) -> Vec<Component> {
    vec![Health::new(max_health, Constitution::Biological).into()]
}

#[test]
fn health_runs_out_and_entity_leaves_the_world() {
    let mut m = Match::new();
    let target = m.place(3.0, m.blue, dummy(50));
    m.world.drain_events();

    assert!(!m.world.apply_damage(target, 20.0));
    assert!(!m.world.apply_damage(target, 20.0));
    assert_eq!(m.world.current_health(target), Some(10.0));
    assert!(m.world.apply_damage(target, 15.0));

    assert!(!m.world.is_alive(target));
    assert!(!m.world.spatial().contains(target));
    assert_eq!(
        m.world.drain_events(),
        vec![
            SimEvent::Died { entity: target },
            SimEvent::EntityRemoved { entity: target },
        ]
    );
}

#[test]
fn melee_attacker_respects_cooldown() {
    let mut m = Match::new();
    let fighter = m.place(0.0, m.red, soldier(10, 0.0));
    let target = m.place(1.0, m.blue, dummy(25));

    m.run(1);
    assert_eq!(m.world.current_health(target), Some(15.0));

    // Delay is 1s, so the next hit lands two half-second ticks later.
    m.world.update(&step(1));
    assert_eq!(m.world.current_health(target), Some(15.0));
    m.world.update(&step(2));
    assert_eq!(m.world.current_health(target), Some(5.0));

    m.world.update(&step(3));
    m.world.update(&step(4));
    assert!(!m.world.is_alive(target));

    m.world.update(&step(5));
    assert!(m.world.component::<TaskQueue>(fighter).unwrap().is_empty());
}

#[test]
fn attacker_walks_into_range() {
    let mut m = Match::new();
    let mut components = soldier(10, 0.0);
    components.push(Mobile::new(2.0).into());
    let fighter = m.place(0.0, m.red, components);
    let target = m.place(5.0, m.blue, dummy(100));

    m.run(1);
    assert_eq!(m.world.current_health(target), Some(100.0));
    assert_eq!(
        m.world.component::<Spatial>(fighter).unwrap().position(),
        Vec2::new(1.0, 0.0)
    );

    m.run(4);
    assert!(m.world.current_health(target).unwrap() < 100.0);
}

#[test]
fn splash_spares_allies() {
    let mut m = Match::new();
    let mut components = soldier(10, 6.0);
    components[1] = Attacker::new(10, 6.0, 1.0).with_splash(3.0).into();
    let gunner = m.place(0.0, m.red, components);
    let target = m.place(4.0, m.blue, dummy(50));
    let beside = m.place(4.0, m.blue, dummy(50));
    let friend = m.place(5.0, m.red, dummy(50));
    let distant = m.place(9.0, m.blue, dummy(50));

    m.world.update(&step(0));

    assert_eq!(m.world.current_health(target), Some(40.0));
    assert_eq!(m.world.current_health(beside), Some(40.0));
    assert_eq!(m.world.current_health(friend), Some(50.0));
    assert_eq!(m.world.current_health(distant), Some(50.0));

    let hits: Vec<_> = m
        .world
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SimEvent::Hit { attacker, target, .. } if attacker == gunner => Some(target),
            _ => None,
        })
        .collect();
    assert_eq!(hits, vec![target, beside]);
}

#[test]
fn armor_and_modifiers_shape_damage() {
    let mut m = Match::new();
    let lancer = m.place(
        0.0,
        m.red,
        vec![Attacker::new(10, 0.0, 1.0)
            .super_effective_against(ArmorType::Heavy)
            .into()],
    );
    let tank = m.place(
        1.0,
        m.blue,
        vec![Health::new(100, Constitution::Mechanical)
            .with_armor(3, ArmorType::Heavy)
            .into()],
    );
    let crowd = m.place(
        1.0,
        m.blue,
        vec![Health::new(100, Constitution::Biological)
            .with_armor(3, ArmorType::Unarmored)
            .into()],
    );

    assert_eq!(attacker::damage_against(&m.world, lancer, tank), Some(17));
    assert_eq!(attacker::damage_against(&m.world, lancer, crowd), Some(7));
}

#[test]
fn melee_cannot_reach_air() {
    let mut m = Match::new();
    let fighter = m.place(0.0, m.red, soldier(10, 0.0));
    let flyer = m.world.create_entity(vec![
        Spatial::new(Vec2::new(1.0, 0.0), IVec2::ONE, CollisionLayer::Air).into(),
        FactionMembership::new(m.blue).into(),
        Health::new(30, Constitution::Mechanical).into(),
    ]);
    m.world.activate(flyer);

    assert!(!attacker::is_valid_target(&m.world, fighter, flyer));
    m.run(3);
    assert_eq!(m.world.current_health(flyer), Some(30.0));
}

#[test]
fn neutral_entities_are_never_auto_targeted() {
    let mut m = Match::new();
    let fighter = m.place(0.0, m.red, soldier(10, 0.0));
    let rock = m.world.create_entity(vec![
        Spatial::new(Vec2::new(1.0, 0.0), IVec2::ONE, CollisionLayer::Ground).into(),
        Health::new(30, Constitution::Mechanical).into(),
    ]);
    m.world.activate(rock);

    assert!(!m.world.is_enemy(fighter, rock));
    assert!(!m.world.is_allied(fighter, rock));
    m.run(2);
    assert_eq!(m.world.current_health(rock), Some(30.0));
}

#[test]
fn technology_bonus_adds_to_base_stat() {
    let mut world = World::new(WorldConfig::default());
    let mut faction = BasicFaction::new("smiths");
    faction.set_technology_bonus(Attacker::POWER, StatValue::Integer(3));
    faction.set_technology_bonus(Mobile::SPEED, StatValue::Real(0.5));
    let smiths = world.factions_mut().register(Box::new(faction));

    let id = world.create_entity(vec![
        Attacker::new(10, 0.0, 1.0).into(),
        Mobile::new(2.0).into(),
        FactionMembership::new(smiths).into(),
    ]);
    assert_eq!(world.get_stat_value(id, Attacker::POWER).unwrap(), StatValue::Integer(13));
    assert_eq!(world.get_stat_value(id, Mobile::SPEED).unwrap(), StatValue::Real(2.5));
    assert!(matches!(
        world.get_stat_value(id, Health::MAX_HEALTH),
        Err(SimError::MissingComponent {
            kind: ComponentKind::Health,
            ..
        })
    ));

    world.remove_entity(id);
    assert!(matches!(
        world.get_stat_value(id, Attacker::POWER),
        Err(SimError::StaleEntity { .. })
    ));
}

#[test]
fn kamikaze_chain_explodes_each_bomber_once() {
    let mut m = Match::new();
    let spatial: Component =
        Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into();
    let prototypes = m.world.prototypes_mut();
    prototypes
        .register(
            "wall",
            &[
                Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
                Health::new(500, Constitution::Mechanical).into(),
            ],
        )
        .unwrap();
    prototypes
        .register(
            "bomber",
            &[spatial, Kamikaze::new(100.0, 3.0, ["wall"]).into()],
        )
        .unwrap();
    prototypes
        .register(
            "bystander",
            &[
                Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
                Health::new(1000, Constitution::Biological).into(),
            ],
        )
        .unwrap();

    let (red, blue) = (Some(m.red), Some(m.blue));
    let wall = m.world.spawn("wall", Vec2::new(-1.0, 0.0), blue).unwrap();
    let bombers: Vec<EntityId> = [0.0, 2.0, 4.0, 6.0]
        .into_iter()
        .map(|x| m.world.spawn("bomber", Vec2::new(x, 0.0), red).unwrap())
        .collect();
    let bystander = m.world.spawn("bystander", Vec2::new(3.0, 0.0), blue).unwrap();
    m.world.drain_events();

    m.world.update(&step(0));

    assert!(!m.world.is_alive(wall));
    assert!(bombers.iter().all(|&b| !m.world.is_alive(b)));
    let explosions = m
        .world
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, SimEvent::ExplosionOccurred { .. }))
        .count();
    assert_eq!(explosions, bombers.len());

    // Caught by three blasts, damaged only by the first one (2.5 tiles away).
    let expected = 1000.0 - explosion_falloff(2.5, 3.0) * 100.0;
    assert_eq!(m.world.current_health(bystander), Some(expected));
    assert!(m.world.is_consistent());
}

#[test]
fn mutually_overlapping_bombers_each_explode_once() {
    let mut m = Match::new();
    m.world
        .prototypes_mut()
        .register(
            "bomber",
            &[
                Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
                Kamikaze::new(40.0, 3.0, ["wall"]).into(),
            ],
        )
        .unwrap();

    // A 2x2 block: every bomber sits inside every other bomber's blast.
    let red = Some(m.red);
    let bombers: Vec<EntityId> = [(10.0, 10.0), (11.0, 10.0), (10.0, 11.0), (11.0, 11.0)]
        .into_iter()
        .map(|(x, y)| m.world.spawn("bomber", Vec2::new(x, y), red).unwrap())
        .collect();
    m.world.drain_events();

    assert_eq!(kamikaze::explode(&mut m.world, bombers[0]), bombers.len());
    assert!(bombers.iter().all(|&b| !m.world.is_alive(b)));

    let sources: Vec<EntityId> = m
        .world
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SimEvent::ExplosionOccurred { source, .. } => Some(source),
            _ => None,
        })
        .collect();
    assert_eq!(sources.len(), bombers.len());
    for bomber in &bombers {
        assert_eq!(sources.iter().filter(|&s| s == bomber).count(), 1);
    }

    assert_eq!(kamikaze::explode(&mut m.world, bombers[1]), 0);
    m.world.update(&step(0));
    assert!(m.world.drain_events().is_empty());
    assert_eq!(m.world.entity_count(), 0);
    assert!(m.world.is_consistent());
}

#[test]
fn explode_ignores_non_kamikaze() {
    let mut m = Match::new();
    let target = m.place(0.0, m.blue, dummy(10));
    assert_eq!(kamikaze::explode(&mut m.world, target), 0);
    assert!(m.world.is_alive(target));
}
