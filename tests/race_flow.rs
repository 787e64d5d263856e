use typing_racer_lib::game_server::typing::TypingConfig;
use typing_racer_lib::{GameConfig, GameServer, GameState, KeyOutcome, RaceStatus};

const FRAME: f32 = 1.0 / 60.0;

fn server(prompt: &str, seed: u64) -> GameServer {
    let config = GameConfig {
        typing: TypingConfig {
            prompts: vec![prompt.to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let mut server = GameServer::new();
    server.init_race_seeded(config, seed).unwrap();
    server.start_race();
    server
}

/// One correct key per frame until the race ends or `max_frames` pass
fn type_and_drive(server: &mut GameServer, max_frames: usize) -> usize {
    for frame in 0..max_frames {
        let Some(snapshot) = server.get_snapshot() else {
            return frame;
        };
        if snapshot.race.status == RaceStatus::Finished {
            return frame;
        }
        server.submit_key(snapshot.typing.window.current);
        server.step(FRAME);
    }
    max_frames
}

#[test]
fn steady_typist_wins_the_race() {
    let mut server = server("¿Qué tal? Bien.", 17);

    let frames = type_and_drive(&mut server, 60 * 60);
    assert!(frames < 60 * 60, "race never finished");

    assert_eq!(server.get_state(), GameState::Results);
    let snapshot = server.get_snapshot().unwrap();
    assert_eq!(snapshot.race.player_rank, 1);
    assert!(snapshot.race.competitors[0].distance >= 1000.0);
    assert!(snapshot.typing.prompts_completed > 0);

    let results = server.get_results().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].competitor_id, 0);
    assert!(results
        .windows(2)
        .all(|pair| pair[0].distance >= pair[1].distance));
}

#[test]
fn idle_player_finishes_last() {
    let mut server = server("hola", 23);

    for _ in 0..60 * 180 {
        server.step(FRAME);
        if server.get_state() == GameState::Results {
            break;
        }
    }

    assert_eq!(server.get_state(), GameState::Results);
    let snapshot = server.get_snapshot().unwrap();
    assert_eq!(snapshot.race.player_rank, 4);
    assert!(snapshot.race.competitors[1..]
        .iter()
        .all(|c| c.distance >= 1000.0));
    assert_eq!(server.submit_key('h'), None);
}

#[test]
fn restart_after_results_starts_a_fresh_race() {
    let mut server = server("hola", 31);
    type_and_drive(&mut server, 60 * 60);
    assert_eq!(server.get_state(), GameState::Results);

    server.restart();

    assert_eq!(server.get_state(), GameState::Racing);
    let snapshot = server.get_snapshot().unwrap();
    assert_eq!(snapshot.race.status, RaceStatus::Running);
    assert!(snapshot.race.competitors.iter().all(|c| c.distance == 0.0));
    assert_eq!(snapshot.typing.prompts_completed, 0);
    assert!(server.get_results().is_none());
    assert!(matches!(
        server.submit_key('H'),
        Some(KeyOutcome::Matched { .. })
    ));
}
