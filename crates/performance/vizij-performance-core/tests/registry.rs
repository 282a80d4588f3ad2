use std::sync::Arc;

use vizij_performance_core::{
    Act, ActError, Config, EventKind, MoveContext, MoveRegistry, Performance, PerformanceEvent,
    PerformanceMove, PerformanceState, Performer, StateMask, World,
};

fn strike(name: &str) -> Arc<PerformanceMove> {
    Arc::new(PerformanceMove::strike(name, 0.4, 0.5, 0.25))
}

fn resolved_name(reg: &MoveRegistry, act: &str) -> Option<String> {
    reg.resolved(act).map(|m| m.name.clone())
}

/// Drive a performance to completion, feeding its events back to the registry.
fn run_to_completion(reg: &mut MoveRegistry, p: &mut dyn Performance, world: &mut World) {
    let mut events: Vec<PerformanceEvent> = Vec::new();
    for _ in 0..100 {
        events.clear();
        p.update(0.1, world, &mut events);
        for e in &events {
            reg.on_event(e);
        }
        if p.state() == PerformanceState::Completed {
            return;
        }
    }
    panic!("performance did not complete");
}

#[test]
fn highest_priority_wins() {
    let mut reg = MoveRegistry::new("Sword", 0, Config::default());
    reg.add_move("Light", "base".into(), StateMask::IDLE, strike("Slash"), 0);
    reg.add_move("Light", "buff".into(), StateMask::IDLE, strike("Flame Slash"), 10);
    reg.add_move("Light", "debuff".into(), StateMask::IDLE, strike("Weak Slash"), -5);
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Flame Slash"));
}

#[test]
fn priority_ties_go_to_most_recently_added() {
    let mut reg = MoveRegistry::new("Sword", 0, Config::default());
    reg.add_move("Light", "a".into(), StateMask::IDLE, strike("First"), 3);
    reg.add_move("Light", "b".into(), StateMask::IDLE, strike("Second"), 3);
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Second"));

    // Upserting an older context makes it the newest entry.
    reg.add_move("Light", "a".into(), StateMask::IDLE, strike("First v2"), 3);
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("First v2"));
    assert_eq!(reg.entry_count(), 2);
}

#[test]
fn entries_outside_the_current_state_are_ignored() {
    let mut reg = MoveRegistry::new("Sword", 0, Config::default());
    reg.add_move(
        "Light",
        "combo".into(),
        StateMask::of(PerformanceState::Finishing),
        strike("Combo"),
        50,
    );
    assert_eq!(reg.current_state(), PerformanceState::Inactive);
    assert!(!reg.supports_act("Light"));
    reg.add("Light", PerformanceMove::strike("Slash", 0.4, 0.5, 0.25));
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Slash"));
}

#[test]
fn remove_move_drops_empty_acts() {
    let mut reg = MoveRegistry::new("Sword", 0, Config::default());
    reg.add_move("Light", "a".into(), StateMask::IDLE, strike("A"), 0);
    reg.add_move("Light", "b".into(), StateMask::IDLE, strike("B"), 1);
    assert!(reg.remove_move("Light", &"b".into()));
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("A"));
    assert!(!reg.remove_move("Light", &"b".into()));
    assert!(reg.remove_move("Light", &"a".into()));
    assert!(reg.moveset().is_empty());
    assert_eq!(reg.entry_count(), 0);
    assert!(!reg.remove_move("Heavy", &"a".into()));
}

#[test]
fn batch_defers_resolve_until_the_end() {
    let mut reg = MoveRegistry::new("Sword", 0, Config::default());
    let seen = reg.batch(|r| {
        r.add_move("Light", "a".into(), StateMask::IDLE, strike("A"), 0);
        r.add_move("Heavy", "a".into(), StateMask::IDLE, strike("H"), 0);
        r.moveset().len()
    });
    assert_eq!(seen, 0);
    assert_eq!(reg.moveset().len(), 2);
}

#[test]
fn follow_ups_live_exactly_as_long_as_their_performance() {
    let cross = strike("Cross");
    let jab = PerformanceMove::strike("Jab", 0.4, 0.5, 0.25).with_follow_up(
        "Combo",
        PerformanceState::Finishing,
        cross,
        5,
    );
    let mut reg = MoveRegistry::new("Fists", 0, Config::default());
    reg.add("Light", jab);
    let mut world = World::new();

    let mut p = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    let ctx = MoveContext::Performance(p.id());
    assert!(reg.has_context(&ctx));
    assert_eq!(reg.current_state(), PerformanceState::Performing);
    // Registered, but masked until the jab is finishing.
    assert!(!reg.supports_act("Combo"));

    let mut events = Vec::new();
    for _ in 0..4 {
        events.clear();
        p.update(0.1, &mut world, &mut events);
        for e in &events {
            reg.on_event(e);
        }
    }
    assert_eq!(p.state(), PerformanceState::Finishing);
    assert_eq!(resolved_name(&reg, "Combo").as_deref(), Some("Cross"));

    run_to_completion(&mut reg, p.as_mut(), &mut world);
    assert!(!reg.has_context(&ctx));
    assert!(!reg.supports_act("Combo"));
    assert_eq!(reg.current_state(), PerformanceState::Inactive);
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Jab"));
}

#[test]
fn completion_of_an_unrelated_performance_is_ignored() {
    let mut reg = MoveRegistry::new("Fists", 0, Config::default());
    reg.add("Light", PerformanceMove::strike("Jab", 0.4, 0.5, 0.25));
    reg.on_event(&PerformanceEvent {
        kind: EventKind::Completed,
        performance: vizij_performance_core::PerformanceId(99),
        act: "Light".into(),
        name: "Other".into(),
        state: PerformanceState::Completed,
        run_time: 1.0,
    });
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Jab"));
}

#[test]
fn prepare_is_gated_on_resources_not_on_cost_size() {
    let mut reg = MoveRegistry::new("Legs", 0, Config::default());
    reg.add(
        "Dash",
        PerformanceMove::strike("Dash", 0.2, 0.2, 0.0).with_cost("Stamina", 5.0),
    );

    let mut world = World::new().with_stat("Stamina", 0.0);
    let err = reg
        .try_prepare(&Act::press("Dash"), &mut world)
        .err()
        .unwrap();
    assert_eq!(
        err,
        ActError::ResourceInsufficient {
            stat: "Stamina".into()
        }
    );

    // Any positive value passes the gate even when the cost exceeds it.
    let mut world = World::new().with_stat("Stamina", 1.0);
    assert!(reg.try_prepare(&Act::press("Dash"), &mut world).is_ok());
}

#[test]
fn prepare_requires_world_conditions() {
    let mut reg = MoveRegistry::new("Legs", 0, Config::default());
    reg.add(
        "Jump",
        PerformanceMove::strike("Jump", 0.2, 0.2, 0.0).requiring("grounded"),
    );
    let mut world = World::new();
    assert!(matches!(
        reg.try_prepare(&Act::press("Jump"), &mut world),
        Err(ActError::StateConflict { .. })
    ));
    world.set_condition("grounded", true);
    assert!(reg.try_prepare(&Act::press("Jump"), &mut world).is_ok());
}

#[test]
fn unknown_acts_are_unsupported() {
    let mut reg = MoveRegistry::new("Legs", 0, Config::default());
    let mut world = World::new();
    assert!(matches!(
        reg.try_prepare(&Act::press("Fly"), &mut world),
        Err(ActError::UnsupportedAct { .. })
    ));
}

#[test]
fn prepared_performances_get_unique_ids() {
    let mut reg = MoveRegistry::new("Fists", 0, Config::default());
    // Available in every state so a second jab can start while the first runs.
    reg.add_move("Light", "Fists".into(), StateMask::ALL, strike("Jab"), 0);
    let mut world = World::new();
    let a = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    assert_eq!(reg.current_state(), PerformanceState::Performing);
    assert_eq!(reg.supported_acts(), vec!["Light".to_string()]);
    let b = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    assert_ne!(a.id(), b.id());
}

#[test]
fn idle_moves_are_withdrawn_while_their_performance_runs() {
    let mut reg = MoveRegistry::new("Fists", 0, Config::default());
    reg.add("Light", PerformanceMove::strike("Jab", 0.4, 0.5, 0.25));
    let mut world = World::new();
    let mut p = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    assert!(reg.supported_acts().is_empty());
    assert!(matches!(
        reg.try_prepare(&Act::press("Light"), &mut world),
        Err(ActError::UnsupportedAct { .. })
    ));

    run_to_completion(&mut reg, p.as_mut(), &mut world);
    let q = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    assert_ne!(p.id(), q.id());
}

#[test]
fn detached_registry_forgets_running_performances() {
    let cross = strike("Cross");
    let jab = PerformanceMove::strike("Jab", 0.4, 0.5, 0.25).with_follow_up(
        "Combo",
        PerformanceState::Finishing,
        cross,
        5,
    );
    let mut reg = MoveRegistry::new("Fists", 0, Config::default());
    reg.add("Light", jab);
    let mut world = World::new();
    let p = reg.try_prepare(&Act::press("Light"), &mut world).unwrap();
    assert_eq!(reg.current_state(), PerformanceState::Performing);

    reg.detach();
    assert_eq!(reg.current_state(), PerformanceState::Inactive);
    assert!(!reg.has_context(&MoveContext::Performance(p.id())));
    assert_eq!(resolved_name(&reg, "Light").as_deref(), Some("Jab"));
}
