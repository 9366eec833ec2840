use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

/// Environment variable carrying the account password. Deliberately not a
/// clap arg: a password on the command line would land in shell history and
/// the process table.
pub const PASSWORD_ENV: &str = "PROMPTDECK_PASSWORD";

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let api_url = matches
        .get_one("api-url")
        .map(|s: &String| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --api-url"))?;

    let mut globals = GlobalArgs::new(api_url);

    let password = std::env::var(PASSWORD_ENV)
        .map_err(|_| anyhow::anyhow!("missing required environment variable: {PASSWORD_ENV}"))?;
    globals.set_password(SecretString::from(password));

    let action = Action::Login {
        identifier: matches
            .get_one("identifier")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --identifier"))?,
        remember: matches.get_flag("remember"),
    };

    Ok((action, globals))
}
