//! Simulation clock tests.
//!
//! Time is synthetic: every timestamp is a Duration from an arbitrary
//! epoch, so admission can be checked without sleeping.

use skirmish_core::clock::{Admission, SimClock, DEFAULT_MAX_FPS};
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Poll every `step` from 0 to `total`, completing each admitted frame.
/// Returns the number of admitted frames.
fn drive(clock: &mut SimClock, total: Duration, step: Duration) -> u64 {
    let mut admitted = 0;
    let mut now = Duration::ZERO;
    while now <= total {
        if clock.poll(now) == Admission::Due {
            clock.complete_frame(now);
            admitted += 1;
        }
        now += step;
    }
    admitted
}

#[test]
fn halted_until_started() {
    let mut clock = SimClock::new(30);
    assert_eq!(clock.poll(ms(1_000)), Admission::Halted);
    assert!(clock.start(ms(0)));
    assert!(clock.is_running());
}

#[test]
fn frame_is_not_due_before_the_interval() {
    let mut clock = SimClock::new(30);
    clock.start(ms(0));

    assert_eq!(clock.poll(ms(10)), Admission::NotDue);
    assert_eq!(clock.poll(ms(33)), Admission::NotDue);
    assert_eq!(clock.poll(ms(34)), Admission::Due);
    assert_eq!(clock.current_frame(), 0, "polling alone never advances");
}

#[test]
fn admission_rebases_both_timestamps() {
    let mut clock = SimClock::new(10);
    clock.start(ms(0));

    assert_eq!(clock.poll(ms(150)), Admission::Due);
    assert_eq!(clock.complete_frame(ms(150)), 1);

    assert_eq!(clock.last_frame_timestamp(), ms(150));
    assert_eq!(clock.next_due_timestamp(), ms(250));
    assert_eq!(clock.time_until_due(ms(200)), ms(50));
}

#[test]
fn admitted_frames_track_rate_times_elapsed() {
    let total = Duration::from_secs(2);
    for fps in [10u32, 24, 30, 60, 144] {
        let mut clock = SimClock::new(fps);
        clock.start(Duration::ZERO);

        let admitted = drive(&mut clock, total, Duration::from_micros(10));

        let expected = (total.as_secs_f64() * fps as f64).round() as i64;
        assert!(
            (admitted as i64 - expected).abs() <= 1,
            "fps={fps}: admitted {admitted}, expected about {expected}"
        );
        assert_eq!(clock.current_frame(), admitted, "fps={fps}: counter must match admissions");
    }
}

#[test]
fn pause_freezes_the_counter_but_not_admission() {
    let mut clock = SimClock::new(30);
    clock.start(Duration::ZERO);
    drive(&mut clock, ms(200), ms(1));
    let before = clock.current_frame();

    clock.pause();
    let mut admitted_while_paused = 0;
    let mut now = ms(201);
    while now <= ms(600) {
        if clock.poll(now) == Admission::Due {
            assert_eq!(clock.complete_frame(now), before);
            admitted_while_paused += 1;
        }
        now += ms(1);
    }

    assert!(admitted_while_paused >= 10);
    assert_eq!(clock.current_frame(), before);

    clock.resume();
    while clock.poll(now) != Admission::Due {
        now += ms(1);
    }
    assert_eq!(clock.complete_frame(now), before + 1);
}

#[test]
fn changing_the_rate_restarts_the_schedule() {
    let mut clock = SimClock::new(30);
    clock.start(Duration::ZERO);

    assert!(clock.set_frame_rate_limit(10, ms(500)));
    assert_eq!(clock.frame_rate_limit(), 10);
    assert_eq!(clock.target_frame_interval(), ms(100));
    assert_eq!(clock.last_frame_timestamp(), ms(500));
    assert_eq!(clock.next_due_timestamp(), ms(600));

    // No runway: time already elapsed does not count toward the new rate.
    assert_eq!(clock.poll(ms(550)), Admission::NotDue);
}

#[test]
fn zero_rate_is_rejected() {
    let mut clock = SimClock::new(60);
    clock.start(Duration::ZERO);

    assert!(!clock.set_frame_rate_limit(0, ms(5)));
    assert_eq!(clock.frame_rate_limit(), 60);

    let fallback = SimClock::new(0);
    assert_eq!(fallback.frame_rate_limit(), DEFAULT_MAX_FPS);
}

#[test]
fn quit_is_reported_once_and_is_terminal() {
    let mut clock = SimClock::new(30);
    clock.start(Duration::ZERO);
    clock.request_quit();

    assert_eq!(clock.poll(ms(100)), Admission::Quit);
    assert_eq!(clock.poll(ms(200)), Admission::Halted);
    assert!(!clock.start(ms(300)), "a quit clock never resumes");
    assert_eq!(clock.poll(ms(400)), Admission::Halted);
    assert!(clock.is_quitting());
}

#[test]
fn focus_does_not_block_admission() {
    let mut clock = SimClock::new(30);
    clock.start(Duration::ZERO);
    clock.set_active(false);

    assert_eq!(clock.poll(ms(40)), Admission::Due);
    assert!(!clock.is_active());
}

#[test]
fn reset_rewinds_only_the_counter() {
    let mut clock = SimClock::new(30);
    clock.start(Duration::ZERO);
    drive(&mut clock, ms(500), ms(1));
    assert!(clock.current_frame() > 0);

    clock.reset();

    assert_eq!(clock.current_frame(), 0);
    assert_eq!(clock.frame_rate_limit(), 30);
    assert!(clock.is_running());
}
