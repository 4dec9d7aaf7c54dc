//! Player control buttons attached to "now playing" messages.

use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

use crate::resources::emojis;

const PREFIX: &str = "player:";

/// Volume change per button press.
pub const VOLUME_STEP: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Previous,
    Pause,
    Skip,
    Stop,
    VolumeUp,
    VolumeDown,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Previous,
        Control::Pause,
        Control::Skip,
        Control::Stop,
        Control::VolumeDown,
        Control::VolumeUp,
    ];

    /// Button layout: playback first, volume below.
    const ROWS: [&'static [Control]; 2] = [
        &[Control::Previous, Control::Pause, Control::Skip, Control::Stop],
        &[Control::VolumeDown, Control::VolumeUp],
    ];

    fn key(self) -> &'static str {
        match self {
            Control::Previous => "previous",
            Control::Pause => "pause",
            Control::Skip => "skip",
            Control::Stop => "stop",
            Control::VolumeUp => "volume_up",
            Control::VolumeDown => "volume_down",
        }
    }

    pub fn custom_id(self) -> String {
        format!("{}{}", PREFIX, self.key())
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        let key = custom_id.strip_prefix(PREFIX)?;
        Self::ALL.into_iter().find(|control| control.key() == key)
    }

    fn emoji(self, paused: bool) -> &'static str {
        match self {
            Control::Pause if paused => emojis::PLAY,
            Control::Pause => emojis::PAUSE,
            Control::Skip => emojis::SKIP,
            Control::Previous => emojis::PREVIOUS,
            Control::Stop => emojis::STOP,
            Control::VolumeUp => emojis::VOLUME_UP,
            Control::VolumeDown => emojis::VOLUME_DOWN,
        }
    }
}

/// Every control, laid out in rows. The pause button shows "play" while paused.
pub fn control_rows(paused: bool) -> Vec<CreateActionRow> {
    Control::ROWS
        .iter()
        .map(|row| CreateActionRow::Buttons(row.iter().map(|control| button(*control, paused)).collect()))
        .collect()
}

fn button(control: Control, paused: bool) -> CreateButton {
    let style = if control == Control::Stop {
        ButtonStyle::Danger
    } else {
        ButtonStyle::Secondary
    };
    CreateButton::new(control.custom_id())
        .style(style)
        .emoji(ReactionType::Unicode(control.emoji(paused).to_string()))
}

/// Volume after pressing a volume button, clamped to `0..=max`.
pub fn step_volume(current: u16, control: Control, max: u16) -> u16 {
    match control {
        Control::VolumeUp => current.saturating_add(VOLUME_STEP).min(max),
        Control::VolumeDown => current.saturating_sub(VOLUME_STEP),
        _ => current,
    }
}
