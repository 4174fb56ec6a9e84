//! # Playback Loop
//!
//! Simulated continuous play: ask the selector for the next song, announce the
//! transition, "play" it, repeat until nothing qualifies.
//!
//! ## States
//!
//! ```text
//! Running ──step──> Running                  (a next song was found)
//!    │
//!    └────step──> Stopped(reason)            (terminal)
//! ```
//!
//! Before every step the played-set is compared with the catalog size; once it
//! covers every song it is cleared and a new cycle begins.
//!
//! Playback is not real: after each transition the loop pauses for
//! `next_duration_ms / playback_scale` seconds through a [`Clock`]. Use
//! [`NoDelay`] to skip the pauses entirely.

use crate::index::NeighborSearch;
use crate::recommend::{Recommender, Selection, DEFAULT_DURATION_TOLERANCE_MS};
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Default divisor turning a song's milliseconds into seconds of pause.
pub const DEFAULT_PLAYBACK_SCALE: f64 = 20_000.0;

/// Source of the pause between songs.
pub trait Clock {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the thread for the requested time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Clock for NoDelay {
    fn pause(&mut self, _duration: Duration) {}
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    SongNotFound(String),
    NoSuitableCandidate(String),
    LimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped(StopReason),
}

/// One announced transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub pause: Duration,
}

/// What happened over a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub transitions: Vec<Transition>,
    pub resets: usize,
    pub stop: StopReason,
}

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    pub tolerance_ms: u64,
    pub playback_scale: f64,
    /// Stop after this many transitions.
    pub limit: Option<usize>,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
            playback_scale: DEFAULT_PLAYBACK_SCALE,
            limit: None,
        }
    }
}

/// Simulated pause for a song of `duration_ms`.
#[must_use]
pub fn pause_for(duration_ms: i64, playback_scale: f64) -> Duration {
    #[allow(clippy::cast_precision_loss)]
    let seconds = duration_ms.max(0) as f64 / playback_scale;
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

/// The continuous-play state machine.
///
/// Owns the played-set and the current song; borrows the recommender.
pub struct PlaybackLoop<'a, I, C, W> {
    recommender: &'a Recommender<I>,
    clock: C,
    out: W,
    options: PlaybackOptions,
    current: Option<String>,
    played: HashSet<String>,
    state: State,
    transitions: Vec<Transition>,
    resets: usize,
}

impl<'a, I, C, W> PlaybackLoop<'a, I, C, W>
where
    I: NeighborSearch,
    C: Clock,
    W: Write,
{
    pub fn new(
        recommender: &'a Recommender<I>,
        start: impl Into<String>,
        options: PlaybackOptions,
        clock: C,
        out: W,
    ) -> Self {
        Self {
            recommender,
            clock,
            out,
            options,
            current: Some(start.into()),
            played: HashSet::new(),
            state: State::Running,
            transitions: Vec::new(),
            resets: 0,
        }
    }

    /// Start with songs already marked as heard. Names outside the catalog
    /// are ignored so they cannot hold off the playlist reset.
    #[must_use]
    pub fn with_played(mut self, played: impl IntoIterator<Item = String>) -> Self {
        for name in played {
            if self.recommender.catalog().find(&name).is_some() {
                self.played.insert(name);
            } else {
                warn!("Ignoring unknown played song '{name}'");
            }
        }
        self
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn played(&self) -> &HashSet<String> {
        &self.played
    }

    fn stop(&mut self, reason: StopReason) -> Result<State> {
        if !matches!(reason, StopReason::LimitReached) {
            writeln!(
                self.out,
                "Ending recommendation loop - no more songs within the specified duration tolerance."
            )?;
        }
        info!("Playback stopped: {reason:?}");
        self.current = None;
        self.state = State::Stopped(reason);
        Ok(self.state.clone())
    }

    /// Advance by one song. A stopped loop stays stopped.
    ///
    /// # Errors
    ///
    /// Only when writing to the output fails.
    pub fn step(&mut self) -> Result<State> {
        if self.state != State::Running {
            return Ok(self.state.clone());
        }
        let Some(current) = self.current.clone() else {
            return self.stop(StopReason::SongNotFound(String::new()));
        };
        if self
            .options
            .limit
            .is_some_and(|limit| self.transitions.len() >= limit)
        {
            return self.stop(StopReason::LimitReached);
        }

        if self.played.len() == self.recommender.catalog().len() {
            writeln!(self.out, "All songs have been played. Resetting playlist.")?;
            self.played.clear();
            self.resets += 1;
        }

        let selection = self
            .recommender
            .recommend_next(&current, &self.played, self.options.tolerance_ms);

        let next = match selection {
            Selection::Next(next) => next,
            miss @ Selection::SongNotFound => {
                writeln!(self.out, "{miss}")?;
                return self.stop(StopReason::SongNotFound(current));
            }
            miss @ Selection::NoSuitableCandidate => {
                writeln!(self.out, "{miss}")?;
                return self.stop(StopReason::NoSuitableCandidate(current));
            }
        };

        writeln!(self.out, "Now playing: '{current}', Next song: '{}'", next.name)?;
        self.out.flush()?;

        let pause = pause_for(next.duration_ms, self.options.playback_scale);
        debug!("Simulating playback for {pause:?}");
        self.clock.pause(pause);

        self.played.insert(current.clone());
        self.transitions.push(Transition {
            from: current,
            to: next.name.clone(),
            pause,
        });
        self.current = Some(next.name);
        Ok(State::Running)
    }

    /// Step until the loop stops.
    ///
    /// # Errors
    ///
    /// Only when writing to the output fails.
    pub fn run(mut self) -> Result<PlaybackReport> {
        let stop = loop {
            if let State::Stopped(reason) = self.step()? {
                break reason;
            }
        };
        Ok(PlaybackReport {
            transitions: self.transitions,
            resets: self.resets,
            stop,
        })
    }
}
