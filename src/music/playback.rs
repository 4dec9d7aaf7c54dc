//! Loop mode and recently played tracks of a player.

use std::collections::VecDeque;

use lavalink_rs::model::events::TrackEndReason;
use lavalink_rs::model::track::TrackData;

/// Tracks remembered for the previous-track control.
const HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Off,
    Track,
    Queue,
}

impl LoopMode {
    pub const ALL: [LoopMode; 3] = [LoopMode::Off, LoopMode::Track, LoopMode::Queue];

    pub fn key(self) -> &'static str {
        match self {
            LoopMode::Off => "off",
            LoopMode::Track => "track",
            LoopMode::Queue => "queue",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.key().eq_ignore_ascii_case(input))
    }

    /// Off, then track, then queue, then off again.
    pub fn next(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::Track,
            LoopMode::Track => LoopMode::Queue,
            LoopMode::Queue => LoopMode::Off,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            LoopMode::Off => "Looping is now **off**.",
            LoopMode::Track => "Now looping the **current track**.",
            LoopMode::Queue => "Now looping the **queue**.",
        }
    }
}

/// Where a finished track goes back into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    Front,
    Back,
}

#[derive(Debug, Default)]
pub struct Playback {
    pub loop_mode: LoopMode,
    /// Most recent first.
    history: VecDeque<TrackData>,
    /// The next replacement comes from [`Playback::rewind`].
    rewinding: bool,
}

impl Playback {
    /// Record a track that stopped playing and say where it goes back in the queue, if anywhere.
    pub fn ended(&mut self, track: &TrackData, reason: &TrackEndReason) -> Option<Requeue> {
        // Replaced by a rewind: the track was already put back in front of the queue.
        if std::mem::take(&mut self.rewinding) {
            return None;
        }

        if matches!(
            reason,
            TrackEndReason::Finished | TrackEndReason::Stopped | TrackEndReason::Replaced
        ) {
            self.remember(track);
        }

        match (reason, self.loop_mode) {
            (TrackEndReason::Finished, LoopMode::Track) => Some(Requeue::Front),
            (TrackEndReason::Finished, LoopMode::Queue) => Some(Requeue::Back),
            _ => None,
        }
    }

    /// The track to go back to. The replacement it causes is not recorded.
    pub fn rewind(&mut self) -> Option<TrackData> {
        let previous = self.history.pop_front()?;
        self.rewinding = true;
        Some(previous)
    }

    /// Undo a [`Playback::rewind`] whose track could not be started.
    pub fn rewind_failed(&mut self, track: TrackData) {
        self.rewinding = false;
        self.history.push_front(track);
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    fn remember(&mut self, track: &TrackData) {
        // A looping track is only remembered once.
        if self.history.front().map(|last| &last.encoded) == Some(&track.encoded) {
            return;
        }
        self.history.push_front(track.clone());
        self.history.truncate(HISTORY);
    }
}
