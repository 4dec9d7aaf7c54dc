use serenity::all::{CommandInteraction, Context, CreateAutocompleteResponse, CreateInteractionResponse};
use tracing::debug;

use crate::commands;
use crate::state::Data;

/// Discord shows at most this many suggestions.
const MAX_CHOICES: usize = 25;

pub async fn handle(ctx: &Context, data: &Data, interaction: &CommandInteraction) {
    let Some(focused) = interaction.data.autocomplete() else {
        return;
    };

    let response = commands::autocomplete(data, &interaction.data.name, focused.name, focused.value)
        .into_iter()
        .take(MAX_CHOICES)
        .fold(CreateAutocompleteResponse::new(), |response, (name, value)| {
            response.add_string_choice(name, value)
        });

    if let Err(e) = interaction
        .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
        .await
    {
        // Expires quickly when the user keeps typing.
        debug!("Autocomplete for /{} not delivered: {}", interaction.data.name, e);
    }
}
