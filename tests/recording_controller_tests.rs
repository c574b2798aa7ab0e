// Integration tests for the recording controller
//
// The controller is driven without a screen: events posted to the main loop are
// routed back into it by hand, the way the screen does.

mod common;

use anyhow::Result;
use clipcam::recording::RecordingDiagnostics;
use clipcam::{
    MainLoop, RecordEvent, RecordingController, RecordingSettings, RecordingState, ScreenEvent,
    VideoCapture,
};
use common::{gate, stats, FakeRecorder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Route main-loop events into the controller until a `Finalize` is handled
async fn run_until_finalized(
    main_loop: &mut MainLoop<ScreenEvent>,
    controller: &mut RecordingController,
) -> Result<()> {
    loop {
        match main_loop.next().await.expect("main loop closed") {
            ScreenEvent::Recording(event) => {
                let finalized = matches!(event, RecordEvent::Finalize { .. });
                controller.dispatch(event);
                if finalized {
                    return Ok(());
                }
            }
            ScreenEvent::StopTimerElapsed { recording_id } => {
                controller.on_stop_timer(recording_id)?;
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_status_events_do_not_move_the_stop() -> Result<()> {
    let mut main_loop = MainLoop::new();
    let recorder = FakeRecorder::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        gate(true, true),
        RecordingSettings::default(),
    );
    let capture = VideoCapture::with_output(recorder.clone());

    let started = Instant::now();
    let recording_id = controller.record(&capture)?;

    // Chatty recorder: a status report every 250ms for 15 seconds
    let handle = main_loop.handle();
    let chatter = tokio::spawn(async move {
        for i in 1..=60u64 {
            tokio::time::sleep(Duration::from_millis(250)).await;
            handle.post(ScreenEvent::Recording(RecordEvent::Status {
                recording_id,
                stats: stats(Duration::from_millis(250 * i), true),
            }));
        }
    });

    run_until_finalized(&mut main_loop, &mut controller).await?;
    chatter.abort();

    let stops = recorder.stops();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].1.duration_since(started), Duration::from_secs(10));

    let diagnostics: &RecordingDiagnostics = controller.diagnostics();
    assert!(diagnostics.status_events >= 39, "saw {}", diagnostics.status_events);
    assert_eq!(diagnostics.finalized, 1);
    assert_eq!(controller.state(), RecordingState::Idle);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_custom_duration_is_honoured() -> Result<()> {
    let mut main_loop = MainLoop::new();
    let recorder = FakeRecorder::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        gate(true, false),
        RecordingSettings {
            duration: Duration::from_millis(1500),
        },
    );
    let capture = VideoCapture::with_output(recorder.clone());

    let started = Instant::now();
    controller.record(&capture)?;
    run_until_finalized(&mut main_loop, &mut controller).await?;

    assert_eq!(recorder.stops()[0].1.duration_since(started), Duration::from_millis(1500));
    assert!(!recorder.starts()[0].audio_enabled);

    Ok(())
}

#[tokio::test]
async fn test_state_follows_recorder_events() -> Result<()> {
    let main_loop = MainLoop::new();
    let recorder = FakeRecorder::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        gate(true, true),
        RecordingSettings::default(),
    );
    let capture = VideoCapture::with_output(recorder.clone());

    assert_eq!(controller.state(), RecordingState::Idle);

    let id = controller.record(&capture)?;
    assert_eq!(controller.state(), RecordingState::Starting);

    controller.dispatch(RecordEvent::Start { recording_id: id });
    assert_eq!(controller.state(), RecordingState::Recording);

    // Pause/Resume are notifications only
    controller.dispatch(RecordEvent::Pause {
        recording_id: id,
        stats: stats(Duration::from_secs(1), true),
    });
    controller.dispatch(RecordEvent::Resume {
        recording_id: id,
        stats: stats(Duration::from_secs(1), true),
    });
    assert_eq!(controller.state(), RecordingState::Recording);

    controller.on_stop_timer(id)?;
    assert_eq!(controller.state(), RecordingState::Stopping);

    // A second timer for the same recording does not stop it twice
    controller.on_stop_timer(id)?;
    assert_eq!(recorder.stops().len(), 1);

    controller.dispatch(RecordEvent::Finalize {
        recording_id: id,
        stats: stats(Duration::from_secs(10), true),
        output_location: PathBuf::from("clip.mp4"),
        error: None,
    });
    assert_eq!(controller.state(), RecordingState::Idle);
    assert_eq!(controller.active_count(), 0);
    assert_eq!(
        controller.diagnostics().last_output,
        Some(PathBuf::from("clip.mp4"))
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_early_finalize_cancels_stop_timer() -> Result<()> {
    let mut main_loop = MainLoop::new();
    let recorder = FakeRecorder::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        gate(true, true),
        RecordingSettings::default(),
    );
    let capture = VideoCapture::with_output(recorder.clone());

    let id = controller.record(&capture)?;
    controller.dispatch(RecordEvent::Finalize {
        recording_id: id,
        stats: stats(Duration::ZERO, true),
        output_location: PathBuf::from("clip.mp4"),
        error: Some("storage full".to_string()),
    });
    assert_eq!(controller.diagnostics().failed, 1);

    tokio::time::sleep(Duration::from_secs(20)).await;

    while let Some(event) = main_loop.try_next() {
        assert!(!matches!(event, ScreenEvent::StopTimerElapsed { .. }));
    }
    assert!(recorder.stops().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unknown_recording_events_are_ignored() -> Result<()> {
    let main_loop = MainLoop::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        gate(true, true),
        RecordingSettings::default(),
    );

    let stranger = Uuid::new_v4();
    controller.dispatch(RecordEvent::Start {
        recording_id: stranger,
    });
    controller.on_stop_timer(stranger)?;

    assert_eq!(controller.state(), RecordingState::Idle);
    assert_eq!(controller.active_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_output_names_are_timestamped_mp4() -> Result<()> {
    let main_loop = MainLoop::new();
    let recorder = FakeRecorder::new();
    let mut controller = RecordingController::new(
        main_loop.handle(),
        Arc::new(clipcam::StaticPermissionGate::all_granted_gate()),
        RecordingSettings::default(),
    );
    let capture = VideoCapture::with_output(recorder.clone());

    controller.record(&capture)?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    controller.record(&capture)?;

    let starts = recorder.starts();
    assert!(common::is_clip_name(&starts[0].display_name), "{}", starts[0].display_name);
    assert!(common::is_clip_name(&starts[1].display_name), "{}", starts[1].display_name);
    assert_ne!(starts[0].display_name, starts[1].display_name);

    Ok(())
}
