//! /play command - search or load tracks and queue them.

use std::time::Duration;

use anyhow::{Context as _, Result};
use lavalink_rs::model::track::TrackData;
use lavalink_rs::prelude::{TrackInQueue, TrackLoadData};
use serenity::all::{Context, Permissions};
use tracing::info;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::state::Data;
use crate::sync::{Choice, OptionKind, OptionNode};

const SOURCES: [(&str, &str); 6] = [
    ("YouTube", "ytsearch"),
    ("YouTube Music", "ytmsearch"),
    ("SoundCloud", "scsearch"),
    ("Spotify", "spsearch"),
    ("Apple Music", "amsearch"),
    ("Deezer", "dzsearch"),
];

pub fn declare() -> CommandDecl {
    let source = SOURCES.iter().fold(
        OptionNode::new(OptionKind::String, "source", "Where to search"),
        |option, (name, value)| option.add_choice(Choice::string(*name, *value)),
    );

    CommandDecl {
        definition: guild_command("play", "Play a song or playlist")
            .add_option(
                OptionNode::new(OptionKind::String, "query", "Song name or URL")
                    .required(true)
                    .max_length(200),
            )
            .add_option(source)
            .add_option(OptionNode::new(
                OptionKind::Boolean,
                "play_next",
                "Queue ahead of everything else",
            )),
        meta: CommandMeta {
            cooldown: Some(Duration::from_secs(10)),
            guild_only: true,
            bot_permissions: Permissions::CONNECT | Permissions::SPEAK,
            player: PlayerRequirements {
                voice: true,
                ..PlayerRequirements::default()
            },
            aliases: &["p", "pl"],
            min_args: 1,
            usage: "play <song|url>",
            examples: &[
                "{prefix}play never gonna give you up",
                "{prefix}play https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "/play query:lofi source:SoundCloud",
            ],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("play used outside a guild")?;
    let user = inv.user().id;
    let input = inv.args.string("query").unwrap_or_default();
    let play_next = inv.args.boolean("play_next").unwrap_or(false);
    let search_prefix = inv
        .args
        .string("source")
        .unwrap_or(data.config.lavalink.search_prefix.as_str());

    inv.defer(&ctx.http).await?;

    let player = match data.lavalink.get_player_context(guild_id) {
        Some(player) => player,
        None => {
            let channel = music::voice_channel(&ctx.cache, guild_id, user)
                .context("invoker left voice before the player was created")?;
            music::join(
                ctx,
                &data.lavalink,
                guild_id,
                channel,
                inv.channel_id(),
                data.config.lavalink.default_volume,
            )
            .await?
        }
    };

    let query = music::search_query(input, search_prefix);
    let loaded = data.lavalink.load_tracks(guild_id, &query).await?;

    let (tracks, summary) = match loaded.data {
        Some(TrackLoadData::Track(track)) => {
            let summary = format!("Queued {}", music::track_title(&track));
            (vec![track], summary)
        }
        Some(TrackLoadData::Search(mut results)) if !results.is_empty() => {
            let track = results.swap_remove(0);
            let summary = format!("Queued {}", music::track_title(&track));
            (vec![track], summary)
        }
        Some(TrackLoadData::Playlist(playlist)) => {
            let summary = format!(
                "Queued **{}** tracks from **{}**",
                playlist.tracks.len(),
                playlist.info.name
            );
            (playlist.tracks, summary)
        }
        Some(TrackLoadData::Error(error)) => {
            info!("Lavalink could not load `{}`: {:?}", query, error);
            let reply = CommandReply::error("That track could not be loaded.");
            return inv.reply(&ctx.http, reply).await;
        }
        _ => {
            let reply = CommandReply::error(format!("No results for `{}`.", input));
            return inv.reply(&ctx.http, reply).await;
        }
    };

    let queue = player.get_queue();
    let tracks: Vec<TrackInQueue> = tracks
        .into_iter()
        .map(|track: TrackData| music::with_requester(track, user).into())
        .collect();
    if play_next {
        for track in tracks.into_iter().rev() {
            queue.push_to_front(track)?;
        }
    } else {
        for track in tracks {
            queue.push_to_back(track)?;
        }
    }

    // Idle players don't pull from the queue on their own.
    let current = player.get_player().await?;
    if current.track.is_none() {
        player.skip()?;
    }

    inv.reply(&ctx.http, CommandReply::success(summary)).await
}
