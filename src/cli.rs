use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dorasong")]
#[command(author, version, about = "Telegram bot that finds a song and sends it back as a tagged MP3", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling
    Run,

    /// Fetch one song into the download folder and print the result
    Fetch {
        /// Free-text query, e.g. "Shape of You - Ed Sheeran"
        query: String,

        /// Size limit in MiB (defaults to MAX_FILE_SIZE_MB)
        #[arg(long)]
        max_size_mb: Option<u64>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["dorasong"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_fetch_args() {
        let cli = Cli::try_parse_from(["dorasong", "fetch", "Shape of You", "--max-size-mb", "20"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Fetch {
                query: "Shape of You".to_string(),
                max_size_mb: Some(20),
            })
        );
    }

    #[test]
    fn test_fetch_requires_query() {
        assert!(Cli::try_parse_from(["dorasong", "fetch"]).is_err());
    }
}
