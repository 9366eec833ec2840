use crate::auth::{
    Credentials, FeedbackTone, HttpAuthApi, LogNotifier, LoginController, SubmitOutcome,
    VerificationHandshake,
};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::{MemorySessionStore, SessionStore};
use crate::signal::MemoryChannel;
use crate::store::MemoryIdentifierStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Handle the login action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Login {
        identifier,
        remember,
    } = action;

    let api = Arc::new(HttpAuthApi::new(globals.api_url.clone())?);
    let session = Arc::new(MemorySessionStore::new());
    session.initialize();
    let handshake = Arc::new(VerificationHandshake::new(api.clone()));
    let controller = LoginController::new(
        api,
        session.clone(),
        Arc::new(MemoryChannel::new()),
        Arc::new(LogNotifier),
        Arc::new(MemoryIdentifierStore::new()),
        handshake.clone(),
    );
    controller.start().await;

    let credentials = Credentials {
        identifier,
        password: globals.password.clone(),
    };

    match controller.submit(&credentials, remember).await {
        SubmitOutcome::LoggedIn => {
            let profile = session.current_profile();
            info!(?profile, "authenticated");
            println!("Signed in");
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
        }
        SubmitOutcome::VerificationRequired => {
            println!("Email not verified; requesting a verification email");
            let feedback = handshake.request(&credentials.identifier).await;
            let prefix = match feedback.tone {
                FeedbackTone::Success => "ok",
                FeedbackTone::Info => "info",
                FeedbackTone::Error => "error",
            };
            println!("{prefix}: {}", feedback.message);
        }
        SubmitOutcome::Failed(message) => {
            eprintln!("{message}");
        }
        SubmitOutcome::AlreadyPending => {}
    }

    controller.shutdown();

    Ok(())
}
