//! Integration tests for the async tick driver.
//!
//! Uses tokio's paused clock so seconds pass instantly but deterministically.

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;
use zenith_core::timer::{Update, DEFAULT_TICK_INTERVAL};
use zenith_core::{Event, Phase, Sequencer, TickDriver, TimerConfiguration, TimerSegment};

fn configuration(work: &[&str], time: u32, rest: u32) -> TimerConfiguration {
    TimerConfiguration {
        id: "driver".into(),
        name: "Driver".into(),
        description: String::new(),
        segments: vec![TimerSegment {
            name: "S".into(),
            work: work.iter().map(|w| w.to_string()).collect(),
            time,
            rest,
            rest_string: "Rest".into(),
        }],
        rest_between_sections: 0,
        repeat: false,
        is_custom: None,
    }
}

async fn next(updates: &mut tokio::sync::mpsc::UnboundedReceiver<Update>) -> Update {
    updates.recv().await.expect("driver stopped")
}

#[tokio::test(start_paused = true)]
async fn pause_stops_ticks_and_resume_does_not_drift() {
    let (driver, mut updates) = TickDriver::spawn(Sequencer::new(), DEFAULT_TICK_INTERVAL);
    driver.bind(configuration(&["a"], 10, 0)).await.unwrap();
    driver.start().unwrap();
    next(&mut updates).await; // bind
    next(&mut updates).await; // start

    assert_eq!(next(&mut updates).await.state.time_left, 9);
    assert_eq!(next(&mut updates).await.state.time_left, 8);

    driver.pause().unwrap();
    let paused = next(&mut updates).await;
    assert!(matches!(paused.event, Some(Event::TimerPaused { time_left: 8, .. })));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));

    let resumed_at = Instant::now();
    driver.resume().unwrap();
    let resumed = next(&mut updates).await;
    assert_eq!(resumed.state.time_left, 8);

    let tick = next(&mut updates).await;
    assert_eq!(tick.state.time_left, 7);
    assert_eq!(resumed_at.elapsed(), Duration::from_secs(1));

    driver.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rapid_commands_leave_a_single_pending_tick() {
    let (driver, mut updates) = TickDriver::spawn(Sequencer::new(), DEFAULT_TICK_INTERVAL);
    driver.bind(configuration(&["a"], 10, 0)).await.unwrap();
    next(&mut updates).await;

    driver.start().unwrap();
    for _ in 0..5 {
        driver.pause().unwrap();
        driver.resume().unwrap();
    }
    let last_command_at = Instant::now();
    for _ in 0..11 {
        let update = next(&mut updates).await;
        assert_eq!(update.state.time_left, 10);
    }

    let tick = next(&mut updates).await;
    assert_eq!(tick.state.time_left, 9);
    assert_eq!(last_command_at.elapsed(), Duration::from_secs(1));

    let tick = next(&mut updates).await;
    assert_eq!(tick.state.time_left, 8);
    assert_eq!(last_command_at.elapsed(), Duration::from_secs(2));

    driver.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn skip_restarts_the_second_for_the_new_phase() {
    let (driver, mut updates) = TickDriver::spawn(Sequencer::new(), DEFAULT_TICK_INTERVAL);
    driver.bind(configuration(&["a", "b"], 10, 0)).await.unwrap();
    driver.start().unwrap();
    next(&mut updates).await;
    next(&mut updates).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    let skipped_at = Instant::now();
    driver.skip().unwrap();
    let skipped = next(&mut updates).await;
    assert_eq!(skipped.state.description, "b");
    assert_eq!(skipped.state.time_left, 10);

    let tick = next(&mut updates).await;
    assert_eq!(tick.state.time_left, 9);
    assert_eq!(skipped_at.elapsed(), Duration::from_secs(1));

    driver.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_stops_the_countdown() {
    let (driver, mut updates) = TickDriver::spawn(Sequencer::new(), DEFAULT_TICK_INTERVAL);
    driver.bind(configuration(&["a"], 10, 0)).await.unwrap();
    driver.start().unwrap();
    next(&mut updates).await;
    next(&mut updates).await;
    next(&mut updates).await;

    driver.reset().unwrap();
    let reset = next(&mut updates).await;
    assert_eq!(reset.state.phase, Phase::Idle);
    assert_eq!(reset.state.time_left, 10);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));

    let sequencer = driver.shutdown().await.unwrap();
    assert_eq!(sequencer.state().time_left, 10);
    assert!(sequencer.pending_tick().is_none());
}

#[tokio::test(start_paused = true)]
async fn missed_ticks_are_caught_up_back_to_back() {
    let (driver, mut updates) = TickDriver::spawn(Sequencer::new(), DEFAULT_TICK_INTERVAL);
    driver.bind(configuration(&["a"], 10, 0)).await.unwrap();
    next(&mut updates).await; // bind
    let begin = Instant::now();
    driver.start().unwrap();
    next(&mut updates).await; // start

    // A stalled process: three intervals pass before the driver runs again.
    tokio::time::advance(Duration::from_secs(3)).await;
    for expected in [9, 8, 7] {
        assert_eq!(next(&mut updates).await.state.time_left, expected);
    }
    assert_eq!(begin.elapsed(), Duration::from_secs(3));

    let tick = next(&mut updates).await;
    assert_eq!(tick.state.time_left, 6);
    assert_eq!(begin.elapsed(), Duration::from_secs(4));

    driver.shutdown().await.unwrap();
}
