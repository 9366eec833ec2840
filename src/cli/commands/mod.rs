use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("promptdeck")
        .about("Promptdeck authentication client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the Promptdeck API, example: https://api.promptdeck.dev")
                .env("PROMPTDECK_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("identifier")
                .short('i')
                .long("identifier")
                .help("Email address or username to sign in with")
                .env("PROMPTDECK_IDENTIFIER")
                .required(true),
        )
        .arg(
            Arg::new("remember")
                .short('r')
                .long("remember")
                .help("Remember the identifier for future sign-ins")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PROMPTDECK_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "promptdeck");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Promptdeck authentication client"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "promptdeck",
            "--api-url",
            "https://api.promptdeck.dev",
            "--identifier",
            "alice@example.com",
            "--remember",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(|s| s.to_string()),
            Some("https://api.promptdeck.dev".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("identifier")
                .map(|s| s.to_string()),
            Some("alice@example.com".to_string())
        );
        assert_eq!(matches.get_flag("remember"), true);
    }

    #[test]
    fn test_password_rejected_on_command_line() {
        // The password only ever travels through PROMPTDECK_PASSWORD.
        let result = new().try_get_matches_from(vec![
            "promptdeck",
            "--api-url",
            "https://api.promptdeck.dev",
            "--identifier",
            "alice@example.com",
            "--password",
            "longenough1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PROMPTDECK_API_URL", Some("https://api.promptdeck.dev")),
                ("PROMPTDECK_IDENTIFIER", Some("alice@example.com")),
                ("PROMPTDECK_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["promptdeck"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(|s| s.to_string()),
                    Some("https://api.promptdeck.dev".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("identifier")
                        .map(|s| s.to_string()),
                    Some("alice@example.com".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("PROMPTDECK_LOG_LEVEL", Some(level)),
                    ("PROMPTDECK_API_URL", Some("https://api.promptdeck.dev")),
                    ("PROMPTDECK_IDENTIFIER", Some("alice@example.com")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["promptdeck"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(u8::try_from(index).unwrap())
                    );
                },
            );
        }
    }
}
