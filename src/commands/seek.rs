//! /seek command - jump to a position in the current track.

use std::time::Duration;

use anyhow::{Context as _, Result};
use lavalink_rs::model::track::TrackInfo;
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};
use crate::utils::{format_clock, parse_time};

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("seek", "Jump to a position in the current track").add_option(
            OptionNode::new(OptionKind::String, "position", "Where to jump, like 1:30 or 2m 10s")
                .required(true)
                .max_length(20),
        ),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                playing: true,
            },
            aliases: &["seekto", "jump"],
            min_args: 1,
            usage: "seek <position>",
            examples: &["{prefix}seek 1:30", "{prefix}seek 1h 30m", "/seek position:90"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("seek used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to seek on")?;
    let input = inv.args.string("position").unwrap_or_default();

    let Some(track) = player.get_player().await?.track else {
        return inv.reply(&ctx.http, CommandReply::error("Nothing is playing right now.")).await;
    };

    let position = match seek_target(input, &track.info) {
        Ok(position) => position,
        Err(refusal) => return inv.reply(&ctx.http, CommandReply::error(refusal.message())).await,
    };

    player.set_position(Duration::from_millis(position)).await?;
    let reply = CommandReply::success(format!("Jumped to `{}`.", format_clock(position)));
    inv.reply(&ctx.http, reply).await
}

#[derive(Debug, PartialEq)]
enum SeekRefusal {
    Format,
    Unseekable,
    Beyond { length: u64 },
}

impl SeekRefusal {
    fn message(&self) -> String {
        match self {
            SeekRefusal::Format => "Use a position like `1:30`, `90` or `2m 10s`.".to_string(),
            SeekRefusal::Unseekable => "This track cannot be seeked.".to_string(),
            SeekRefusal::Beyond { length } => {
                format!("The track is only `{}` long.", format_clock(*length))
            }
        }
    }
}

/// Millisecond position to jump to within `track`.
fn seek_target(input: &str, track: &TrackInfo) -> Result<u64, SeekRefusal> {
    let position = parse_time(input).ok_or(SeekRefusal::Format)?;
    if !track.is_seekable || track.is_stream {
        return Err(SeekRefusal::Unseekable);
    }
    if position > track.length {
        return Err(SeekRefusal::Beyond { length: track.length });
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(length: u64, seekable: bool, stream: bool) -> TrackInfo {
        serde_json::from_value(serde_json::json!({
            "identifier": "dQw4w9WgXcQ",
            "isSeekable": seekable,
            "author": "Rick Astley",
            "length": length,
            "isStream": stream,
            "position": 0,
            "title": "Never Gonna Give You Up",
            "uri": null,
            "artworkUrl": null,
            "isrc": null,
            "sourceName": "youtube"
        }))
        .unwrap()
    }

    #[test]
    fn seek_stays_within_the_track() {
        let song = info(212_000, true, false);
        assert_eq!(seek_target("1:30", &song), Ok(90_000));
        assert_eq!(seek_target("3:32", &song), Ok(212_000));
        assert_eq!(
            seek_target("3:33", &song),
            Err(SeekRefusal::Beyond { length: 212_000 })
        );
        assert_eq!(seek_target("later", &song), Err(SeekRefusal::Format));
    }

    #[test]
    fn streams_cannot_be_seeked() {
        assert_eq!(
            seek_target("10", &info(0, false, true)),
            Err(SeekRefusal::Unseekable)
        );
        assert_eq!(
            seek_target("10", &info(60_000, false, false)),
            Err(SeekRefusal::Unseekable)
        );
        assert!(SeekRefusal::Beyond { length: 212_000 }.message().contains("3:32"));
    }
}
