//! Integration tests for the reconciliation engine.

use loadout_sync::{
    CategoryId, ChannelId, ChoiceId, ClientEvent, Engine, Gateway, GatewayConfig, MemoryRoster,
    RawMember, RosterConfig, Ruleset, Service, Trigger, UpdateKind, UserId,
};
use std::sync::Arc;
use std::time::Duration;

const RULES: &str = r#"{
    "categories": [
        {
            "id": "ordnance",
            "name": "Ordnance",
            "choices": [
                {"id": "mortar", "name": "Mortar", "max_per_team": 1},
                {"id": "archer", "name": "Archer", "max_per_team": null}
            ]
        },
        {
            "id": "titan",
            "name": "Titan",
            "choices": [
                {"id": "scorch", "name": "Scorch", "max_per_team": 2}
            ]
        }
    ]
}"#;

fn test_roster() -> Arc<MemoryRoster> {
    let roster = Arc::new(MemoryRoster::new());
    roster.add_channel(ChannelId::from("waiting"), "Waiting");
    roster.add_channel(ChannelId::from("alpha"), "Alpha");
    roster.add_channel(ChannelId::from("bravo"), "Bravo");
    roster
}

fn test_engine(roster: &Arc<MemoryRoster>) -> Engine {
    let config = RosterConfig {
        lobby: ChannelId::from("waiting"),
        teams: vec![ChannelId::from("alpha"), ChannelId::from("bravo")],
    };
    Engine::new(Ruleset::from_str(RULES).unwrap(), config, Box::new(roster.clone()))
}

fn select(engine: &mut Engine, category: &str, user: &str, choice: &str) {
    engine
        .apply_selection(
            &CategoryId::from(category),
            UserId::from(user),
            Some(ChoiceId::from(choice)),
        )
        .unwrap();
}

fn mortar_remaining(engine: &mut Engine) -> Option<i64> {
    let output = engine.run_cycle(UpdateKind::FullUpdate).unwrap();
    output
        .availability
        .channel(&ChannelId::from("alpha"))
        .unwrap()
        .category(&CategoryId::from("ordnance"))
        .unwrap()
        .choice(&ChoiceId::from("mortar"))
        .unwrap()
        .remaining
}

// --- Realistic Workflow Tests ---

#[test]
fn test_cap_lifecycle_end_to_end() {
    // Lobby empty; Alpha has U1 and U2.
    let roster = test_roster();
    roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));
    roster.join(&ChannelId::from("alpha"), RawMember::new("u2", "two"));
    let mut engine = test_engine(&roster);

    // U1 takes the single mortar.
    select(&mut engine, "ordnance", "u1", "mortar");
    assert_eq!(mortar_remaining(&mut engine), Some(0));

    // U2 takes it too: surfaced as -1, flagged, never clamped.
    select(&mut engine, "ordnance", "u2", "mortar");
    assert_eq!(mortar_remaining(&mut engine), Some(-1));
    let output = engine.run_cycle(UpdateKind::FullUpdate).unwrap();
    assert_eq!(output.availability.over_allocations().len(), 1);

    // U1 leaves voice entirely: pruned, count recovers.
    roster.disconnect(&UserId::from("u1"));
    assert_eq!(mortar_remaining(&mut engine), Some(0));
    let output = engine.run_cycle(UpdateKind::FullUpdate).unwrap();
    assert!(output.availability.over_allocations().is_empty());
}

#[test]
fn test_match_setup_workflow() {
    // Players trickle in from the lobby, pick loadouts, one goes back.
    let roster = test_roster();
    roster.join(&ChannelId::from("waiting"), RawMember::new("u1", "one"));
    roster.join(&ChannelId::from("waiting"), RawMember::new("u2", "two"));
    let mut engine = test_engine(&roster);

    roster.move_user(
        &ChannelId::from("waiting"),
        &ChannelId::from("alpha"),
        &UserId::from("u1"),
    );
    roster.move_user(
        &ChannelId::from("waiting"),
        &ChannelId::from("bravo"),
        &UserId::from("u2"),
    );
    select(&mut engine, "ordnance", "u1", "mortar");
    select(&mut engine, "titan", "u1", "scorch");
    select(&mut engine, "ordnance", "u2", "mortar");

    // Caps evaluated per team: both mortars fit, one per channel.
    let output = engine.run_cycle(UpdateKind::FullUpdate).unwrap();
    assert!(output.availability.over_allocations().is_empty());
    assert_eq!(engine.selections().len(), 3);

    // U1 returns to the lobby and forfeits both selections.
    roster.move_user(
        &ChannelId::from("alpha"),
        &ChannelId::from("waiting"),
        &UserId::from("u1"),
    );
    engine.run_cycle(UpdateKind::FullUpdate).unwrap();
    assert_eq!(engine.selections().len(), 1);
    assert!(engine
        .selections()
        .get(&CategoryId::from("ordnance"), &UserId::from("u2"))
        .is_some());
}

#[test]
fn test_unselect_always_permitted_past_cap() {
    let roster = test_roster();
    roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));
    roster.join(&ChannelId::from("alpha"), RawMember::new("u2", "two"));
    let mut engine = test_engine(&roster);

    select(&mut engine, "ordnance", "u1", "mortar");
    select(&mut engine, "ordnance", "u2", "mortar");
    assert_eq!(mortar_remaining(&mut engine), Some(-1));

    // Clearing while over-allocated works; absence is the representation.
    engine
        .apply_selection(&CategoryId::from("ordnance"), UserId::from("u2"), None)
        .unwrap();
    assert_eq!(mortar_remaining(&mut engine), Some(0));
}

// --- Service + Gateway ---

#[test]
fn test_full_pipeline_through_service() {
    let roster = test_roster();
    roster.join(
        &ChannelId::from("alpha"),
        RawMember::new("u1", "one").with_nickname("Ace <pilot>"),
    );
    let gateway = Arc::new(Gateway::new());
    let service = Service::new(test_engine(&roster), gateway.clone());
    let handle = service.handle();
    let worker = std::thread::spawn(move || service.run());

    let client = gateway.subscribe(GatewayConfig::default());
    handle.client_ready().unwrap();
    handle
        .selection_changed(
            CategoryId::from("titan"),
            UserId::from("u1"),
            Some(ChoiceId::from("scorch")),
        )
        .unwrap();
    handle.voice_state_changed().unwrap();
    handle.shutdown().unwrap();
    worker.join().unwrap();

    let mut kinds = Vec::new();
    while let Ok(ClientEvent::Update(payload)) = client.try_recv() {
        kinds.push(payload.kind);

        // Escaped display name everywhere, never raw.
        assert_eq!(payload.team_channels[0].users[0].display_name, "Ace &lt;pilot&gt;");
        // Empty Bravo never rendered.
        assert_eq!(payload.team_channels.len(), 1);
    }
    assert_eq!(
        kinds,
        vec![
            UpdateKind::FullUpdate,
            UpdateKind::SelectionUpdate,
            UpdateKind::FullUpdate
        ]
    );
}

#[test]
fn test_burst_of_triggers_produces_one_cycle_each() {
    let roster = test_roster();
    roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));
    let gateway = Arc::new(Gateway::new());
    let service = Service::new(test_engine(&roster), gateway.clone());
    let handle = service.handle();
    let client = gateway.subscribe(GatewayConfig { buffer_size: 64 });

    let worker = std::thread::spawn(move || service.run());

    // No coalescing: N redundant triggers, N broadcasts.
    for _ in 0..5 {
        handle.voice_state_changed().unwrap();
    }
    handle.shutdown().unwrap();
    worker.join().unwrap();

    let mut count = 0;
    while client.recv_timeout(Duration::from_millis(50)).is_ok() {
        count += 1;
    }
    assert_eq!(count, 5);
}

#[test]
fn test_selection_update_resends_whole_tree() {
    // Selection updates intentionally carry the full channel tree; clients
    // converge on the same end state as after a full update.
    let roster = test_roster();
    roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));
    let mut engine = test_engine(&roster);
    select(&mut engine, "ordnance", "u1", "mortar");

    let full = engine.run_cycle(UpdateKind::FullUpdate).unwrap().payload;
    let selection = engine.run_cycle(UpdateKind::SelectionUpdate).unwrap().payload;

    assert_eq!(full.lobby, selection.lobby);
    assert_eq!(full.team_channels, selection.team_channels);
    assert_eq!(full.selections, selection.selections);
}

#[test]
fn test_duplicate_trigger_dispatch_is_stable() {
    // A duplicated roster notification (bursty source) changes nothing.
    let roster = test_roster();
    roster.join(&ChannelId::from("alpha"), RawMember::new("u1", "one"));
    let mut engine = test_engine(&roster);
    select(&mut engine, "ordnance", "u1", "mortar");

    let gateway = Arc::new(Gateway::new());
    let mut service = Service::new(engine, gateway.clone());
    let client = gateway.subscribe(GatewayConfig::default());

    service.dispatch(Trigger::VoiceStateChanged);
    service.dispatch(Trigger::VoiceStateChanged);

    let first = client.recv_timeout(Duration::from_millis(100)).unwrap();
    let second = client.recv_timeout(Duration::from_millis(100)).unwrap();
    match (first, second) {
        (ClientEvent::Update(a), ClientEvent::Update(b)) => {
            assert_eq!(
                serde_json::to_vec(&a).unwrap(),
                serde_json::to_vec(&b).unwrap()
            );
        }
        other => panic!("Expected two updates, got {:?}", other),
    }
}
