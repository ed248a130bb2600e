//! Line protocol for driving a [`Game`] from stdin.
//!
//! Each line is `<chat_id> <command> [args…]`. The console stands in for a
//! chat transport: commands map one-to-one onto handler calls, and anything
//! that is not a command is delivered as free text.

use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};

use matti_game::{Game, Outcome};
use matti_state::ReviewDecision;
use matti_types::{CategoryId, ChatId, Media, SightingId, SuggestionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { handle: Option<String>, first_name: Option<String> },
    Text(String),
    Media(Media),
    /// Text document read from disk and handed to whichever upload is pending.
    Document(PathBuf),
    Me,
    Leaderboard(Option<u32>),
    Unregister,
    Report,
    Category(CategoryId),
    Target(ChatId),
    GalleryUser(ChatId),
    GalleryCategory(CategoryId),
    ShowUser,
    ShowCategory,
    Suggest,
    SuggestFile,
    MySuggestions,
    Review,
    BeginReview(SuggestionId, ReviewDecision),
    ApproveNow(SuggestionId),
    RejectNow(SuggestionId),
    SetPoints(ChatId),
    Manage(ChatId),
    Delete(SightingId),
    AddCategory { name: String, points: i64 },
    RemoveCategory(CategoryId),
    Upload,
}

fn arg<T: std::str::FromStr>(args: &[&str], idx: usize, what: &str) -> anyhow::Result<T> {
    let raw = args.get(idx).ok_or_else(|| anyhow!("missing {what}"))?;
    raw.parse().map_err(|_| anyhow!("invalid {what}: {raw}"))
}

/// Split a console line into the calling chat and its command.
pub fn parse_line(line: &str) -> anyhow::Result<(ChatId, Command)> {
    let line = line.trim();
    let (chat, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let chat: ChatId = chat.parse().with_context(|| format!("invalid chat id: {chat}"))?;
    let rest = rest.trim();

    let Some(body) = rest.strip_prefix('/') else {
        if rest.is_empty() {
            bail!("empty message");
        }
        return Ok((chat, Command::Text(rest.to_string())));
    };
    let args: Vec<&str> = body.split_whitespace().collect();
    let Some((&name, args)) = args.split_first() else {
        bail!("empty command");
    };

    let command = match name {
        "start" => Command::Start {
            handle: args.first().map(|h| h.trim_start_matches('@').to_string()),
            first_name: (args.len() > 1).then(|| args[1..].join(" ")),
        },
        "photo" => Command::Media(Media::photo(arg::<String>(args, 0, "file reference")?)),
        "video" => Command::Media(Media::video(arg::<String>(args, 0, "file reference")?)),
        "doc" => Command::Document(arg::<PathBuf>(args, 0, "document path")?),
        "me" => Command::Me,
        "leaderboard" => Command::Leaderboard(Some(10)),
        "fullleaderboard" => Command::Leaderboard(None),
        "unregister" => Command::Unregister,
        "report" => Command::Report,
        "category" => Command::Category(arg(args, 0, "category id")?),
        "target" => Command::Target(arg(args, 0, "target chat id")?),
        "gallery_user" => Command::GalleryUser(arg(args, 0, "chat id")?),
        "gallery_category" => Command::GalleryCategory(arg(args, 0, "category id")?),
        "show_user" => Command::ShowUser,
        "show_category" => Command::ShowCategory,
        "suggest" => Command::Suggest,
        "suggest_file" => Command::SuggestFile,
        "my_suggestions" => Command::MySuggestions,
        "review" => Command::Review,
        "approve" => Command::BeginReview(arg(args, 0, "suggestion id")?, ReviewDecision::Approve),
        "reject" => Command::BeginReview(arg(args, 0, "suggestion id")?, ReviewDecision::Reject),
        "approve_now" => Command::ApproveNow(arg(args, 0, "suggestion id")?),
        "reject_now" => Command::RejectNow(arg(args, 0, "suggestion id")?),
        "setpoints" => Command::SetPoints(arg(args, 0, "chat id")?),
        "manage" => Command::Manage(arg(args, 0, "chat id")?),
        "delete" => Command::Delete(arg(args, 0, "sighting id")?),
        "add_category" => {
            // `/add_category <points> <name with spaces>`
            let points = arg(args, 0, "points")?;
            if args.len() < 2 {
                bail!("missing category name");
            }
            Command::AddCategory { name: args[1..].join(" "), points }
        }
        "remove_category" => Command::RemoveCategory(arg(args, 0, "category id")?),
        "upload" => Command::Upload,
        other => bail!("unknown command: /{other}"),
    };
    Ok((chat, command))
}

impl Command {
    /// Run against the game. Blocking: call from a blocking-capable thread.
    pub fn run(self, game: &Game, chat: ChatId) -> anyhow::Result<Outcome> {
        let outcome = match self {
            Command::Start { handle, first_name } => {
                game.start(chat, handle.as_deref(), first_name.as_deref())?
            }
            Command::Text(text) => game.handle_text(chat, &text)?,
            Command::Media(media) => game.submit_media(chat, media)?,
            Command::Document(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                game.submit_document(chat, &content)?
            }
            Command::Me => game.standing(chat)?,
            Command::Leaderboard(limit) => game.leaderboard(limit)?,
            Command::Unregister => game.unregister(chat)?,
            Command::Report => game.begin_report(chat)?,
            Command::Category(id) => game.choose_category(chat, id)?,
            Command::Target(target) => game.choose_weapon_target(chat, target)?,
            Command::GalleryUser(participant) => game.select_gallery_participant(chat, participant)?,
            Command::GalleryCategory(id) => game.select_gallery_category(chat, id)?,
            Command::ShowUser => game.show_participant_gallery(chat)?,
            Command::ShowCategory => game.show_category_gallery(chat)?,
            Command::Suggest => game.begin_suggestion(chat)?,
            Command::SuggestFile => game.begin_suggestion_upload(chat)?,
            Command::MySuggestions => game.my_suggestions(chat)?,
            Command::Review => game.pending_suggestions(chat)?,
            Command::BeginReview(id, decision) => game.begin_review(chat, id, decision)?,
            Command::ApproveNow(id) => game.approve_now(chat, id)?,
            Command::RejectNow(id) => game.reject_now(chat, id)?,
            Command::SetPoints(participant) => game.begin_point_edit(chat, participant)?,
            Command::Manage(participant) => game.manage_participant(chat, participant)?,
            Command::Delete(id) => game.delete_sighting(chat, id)?,
            Command::AddCategory { name, points } => game.add_category(chat, &name, points)?,
            Command::RemoveCategory(id) => game.remove_category(chat, id)?,
            Command::Upload => game.begin_bulk_upload(chat)?,
        };
        Ok(outcome)
    }
}
