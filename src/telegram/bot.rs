//! Bot initialization utilities
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command menu registration

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "show usage")]
    Start,
    #[command(description = "search a song and send it as MP3")]
    Song(String),
    #[command(description = "reset a user's rate limit (owner only)")]
    Reset(String),
}

/// Creates a Bot instance from `BOT_TOKEN` with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError)` - Missing token, invalid `BOT_API_URL` or HTTP client failure
pub fn create_bot() -> AppResult<Bot> {
    build_bot(config::BOT_TOKEN.as_str(), config::bot_api::get_url().as_deref())
}

/// Builds a bot for `token`, talking to `api_url` when a local Bot API server is used.
pub fn build_bot(token: &str, api_url: Option<&str>) -> AppResult<Bot> {
    if token.trim().is_empty() {
        return Err(AppError::Validation("BOT_TOKEN environment variable not set".to_string()));
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    let bot = match api_url {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            bot.set_api_url(url::Url::parse(bot_api_url)?)
        }
        None => bot,
    };

    Ok(bot)
}

/// Commands shown in the Telegram command menu. `/reset` stays hidden.
pub fn menu_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "show usage"),
        BotCommand::new("song", "search a song and send it as MP3"),
    ]
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(menu_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        let command_list = format!("{}", Command::descriptions());

        assert!(command_list.contains("I can"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("song"));
    }

    #[test]
    fn test_parse_song_with_query() {
        let cmd = Command::parse("/song Shape of You - Ed Sheeran", "dorasong_bot").unwrap();
        assert_eq!(cmd, Command::Song("Shape of You - Ed Sheeran".to_string()));
    }

    #[test]
    fn test_parse_song_without_query() {
        let cmd = Command::parse("/song", "dorasong_bot").unwrap();
        assert_eq!(cmd, Command::Song(String::new()));
    }

    #[test]
    fn test_parse_addressed_command() {
        let cmd = Command::parse("/start@dorasong_bot", "dorasong_bot").unwrap();
        assert_eq!(cmd, Command::Start);
    }

    #[test]
    fn test_build_bot_requires_token() {
        let err = build_bot("  ", None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_build_bot_rejects_invalid_api_url() {
        let err = build_bot("123456:TEST", Some("not a url")).unwrap_err();
        assert!(matches!(err, AppError::Url(_)));
    }

    #[test]
    fn test_build_bot_uses_local_api_url() {
        let bot = build_bot("123456:TEST", Some("http://localhost:8081")).unwrap();
        assert_eq!(bot.api_url().as_str(), "http://localhost:8081/");
    }

    #[test]
    fn test_reset_hidden_from_menu() {
        let names: Vec<String> = menu_commands().into_iter().map(|c| c.command).collect();
        assert_eq!(names, vec!["start".to_string(), "song".to_string()]);
    }
}
