//! Game score clamping under random play.

use learnie::schema::{GameScore, PlayEvent, MAX_SCORE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_event(rng: &mut StdRng) -> PlayEvent {
    match rng.gen_range(0..10) {
        0..=4 => PlayEvent::Award(rng.gen_range(-50..=200)),
        5..=7 => PlayEvent::Penalty(rng.gen_range(-50..=200)),
        8 => PlayEvent::Set(rng.gen_range(-1_000..=1_000)),
        _ => PlayEvent::Reset,
    }
}

#[test]
fn test_score_stays_in_bounds() {
    let mut rng = StdRng::seed_from_u64(0x1ea2);
    for _ in 0..200 {
        let mut score = GameScore::default();
        for _ in 0..100 {
            let event = random_event(&mut rng);
            let value = score.apply(event);
            assert!(value <= MAX_SCORE, "{:?} produced {}", event, value);
            assert_eq!(value, score.value());
        }
    }
}

#[test]
fn test_reset_and_set() {
    let mut score = GameScore::new(40);
    assert_eq!(score.apply(PlayEvent::Set(-5)), 0);
    assert_eq!(score.apply(PlayEvent::Award(150)), 100);
    assert!(score.is_won());
    assert_eq!(score.apply(PlayEvent::Reset), 0);
}

#[test]
fn test_play_events_from_page_messages() {
    let event: PlayEvent = serde_json::from_str(r#"{"event": "award", "points": 10}"#).unwrap();
    assert_eq!(event, PlayEvent::Award(10));
    let event: PlayEvent = serde_json::from_str(r#"{"event": "reset"}"#).unwrap();
    assert_eq!(event, PlayEvent::Reset);
}
