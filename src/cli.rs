use clap::{Parser, Subcommand};

use crate::models::{Language, Theme};

#[derive(Parser, Debug)]
#[command(name = "param_cleaner")]
#[command(about = "Inspect, edit and strip tracking parameters from URLs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the settings service used by the popup and options page
    Serve,

    /// Print the query parameters of a URL as JSON
    Params { url: String },

    /// Strip tracking parameters from a URL
    Clean {
        url: String,

        /// Parameter to strip; overrides the saved list (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Also strip the common utm_* parameters
        #[arg(long)]
        utm: bool,
    },

    /// Replace the query string of a URL
    Rebuild {
        url: String,

        /// key=value pair to put in the query (repeatable)
        #[arg(short, long = "set", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },

    /// View or change the saved settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    /// Add a tracking parameter to the saved list
    Add { name: String },
    /// Print the tracking list JSON view
    Json,
    /// Replace the tracking list with an edited JSON view
    EditJson { json: String },
    Language { language: Language },
    Theme { theme: Theme },
    /// Forget saved settings
    Reset,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from(["param_cleaner", "clean", "https://e.com/?a=1", "-p", "a", "--utm"]).unwrap();
        match cli.command {
            Some(Commands::Clean { url, params, utm }) => {
                assert_eq!(url, "https://e.com/?a=1");
                assert_eq!(params, vec!["a".to_string()]);
                assert!(utm);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rebuild_pairs() {
        let cli = Cli::try_parse_from(["param_cleaner", "rebuild", "https://e.com", "--set", "q=a=b"]).unwrap();
        match cli.command {
            Some(Commands::Rebuild { set, .. }) => {
                assert_eq!(set, vec![("q".to_string(), "a=b".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["param_cleaner", "rebuild", "https://e.com", "--set", "novalue"]).is_err());
    }

    #[test]
    fn test_parse_settings_language() {
        let cli = Cli::try_parse_from(["param_cleaner", "settings", "language", "zh-CN"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Settings(SettingsCommand::Language { language: Language::ZhCn }))
        ));
        assert!(Cli::try_parse_from(["param_cleaner", "settings", "theme", "blue"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["param_cleaner"]).unwrap();
        assert!(cli.command.is_none());
    }
}
