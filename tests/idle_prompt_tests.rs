mod support;

use shelfsight_assist::phrases::MOVE_PROMPT;
use shelfsight_assist::{AssistantEvent, InteractionState};
use std::sync::atomic::Ordering;
use support::{detection_at, ms, RigBuilder};

fn nudge_counts(events: &[(AssistantEvent, tokio::time::Instant)]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|(e, _)| match e {
            AssistantEvent::MovePromptShown { nudges } => Some(*nudges),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_nudge_fires_exactly_at_delay() {
    let mut rig = RigBuilder::new()
        .config(|c| c.settings.move_prompt_delay_ms = 2000)
        .spawn();
    let t0 = rig.session_started().await;

    let before = rig.collect_until(t0 + ms(1999)).await;
    assert!(nudge_counts(&before).is_empty());
    assert!(!rig.handle.status().move_prompt_visible);

    let (event, at) = rig
        .wait_for(ms(1000), |e| matches!(e, AssistantEvent::MovePromptShown { .. }))
        .await
        .expect("nudge");
    assert_eq!(event, AssistantEvent::MovePromptShown { nudges: 1 });
    assert_eq!(at.duration_since(t0), ms(2000));
    assert_eq!(rig.speech.times_of(MOVE_PROMPT), vec![t0 + ms(2000)]);
    assert!(rig.handle.status().move_prompt_visible);

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_three_unanswered_nudges_pause_the_session() {
    let mut rig = RigBuilder::new()
        .config(|c| c.settings.move_prompt_delay_ms = 2000)
        .spawn();
    let t0 = rig.session_started().await;

    let (_, paused_at) = rig
        .wait_for(ms(20_000), |e| matches!(e, AssistantEvent::Paused))
        .await
        .expect("paused");
    assert_eq!(paused_at.duration_since(t0), ms(12_000));

    let nudges = rig.speech.times_of(MOVE_PROMPT);
    assert_eq!(
        nudges,
        vec![t0 + ms(2000), t0 + ms(7000), t0 + ms(12_000)]
    );

    let status = rig.handle.status();
    assert_eq!(status.state, InteractionState::Paused);
    assert!(!status.session_active);
    assert!(!status.move_prompt_visible);
    assert_eq!(rig.camera.stops.load(Ordering::SeqCst), 1);

    // no tick runs while paused
    rig.collect_until(t0 + ms(30_000)).await;
    assert_eq!(rig.detector.calls_between(paused_at, t0 + ms(30_000)), 0);
    assert_eq!(rig.speech.times_of(MOVE_PROMPT).len(), 3);

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_detection_after_first_nudge_cancels_escalation() {
    let mut rig = RigBuilder::new()
        .config(|c| c.settings.move_prompt_delay_ms = 2000)
        .spawn();
    let t0 = rig.session_started().await;

    rig.collect_until(t0 + ms(3000)).await;
    // off-center, so no capture is triggered
    rig.detector.show(vec![detection_at("box", 0.3)]);

    let (_, hidden_at) = rig
        .wait_for(ms(500), |e| matches!(e, AssistantEvent::MovePromptHidden))
        .await
        .expect("prompt hidden");
    assert!(hidden_at.duration_since(t0) < ms(3100));
    assert_eq!(rig.handle.state(), InteractionState::Tracking);
    assert_eq!(rig.handle.status().nudges, 0);

    rig.collect_until(t0 + ms(4000)).await;
    rig.detector.clear();

    let events = rig.collect_until(t0 + ms(14_000)).await;
    assert!(!events.iter().any(|(e, _)| matches!(e, AssistantEvent::Paused)));
    // count restarted: first nudge of the new stretch is number 1
    assert_eq!(nudge_counts(&events), vec![1, 2]);
    assert_eq!(rig.handle.state(), InteractionState::Idle);
    assert!(rig.handle.status().session_active);

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_resume_leaves_paused_state() {
    let mut rig = RigBuilder::new()
        .config(|c| {
            c.settings.move_prompt_delay_ms = 1000;
            c.timing.nudge_interval_ms = 1000;
        })
        .spawn();
    rig.session_started().await;
    rig.wait_for(ms(10_000), |e| matches!(e, AssistantEvent::Paused))
        .await
        .expect("paused");

    rig.handle.resume().await.unwrap();
    rig.session_started().await;
    assert_eq!(rig.handle.state(), InteractionState::Idle);
    assert_eq!(rig.camera.opens.lock().len(), 2);

    rig.detector.show(vec![detection_at("cup", 0.4)]);
    rig.wait_for(ms(500), |e| {
        matches!(
            e,
            AssistantEvent::StateChanged {
                to: InteractionState::Tracking,
                ..
            }
        )
    })
    .await
    .expect("tracking again");

    rig.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_disabled_move_prompt_stays_quiet() {
    let mut rig = RigBuilder::new()
        .config(|c| c.settings.move_prompt_enabled = false)
        .spawn();
    let t0 = rig.session_started().await;

    let events = rig.collect_until(t0 + ms(30_000)).await;
    assert!(nudge_counts(&events).is_empty());
    assert!(!events.iter().any(|(e, _)| matches!(e, AssistantEvent::Paused)));
    assert!(rig.speech.times_of(MOVE_PROMPT).is_empty());
    assert!(rig.handle.status().session_active);

    rig.shutdown().await;
}
