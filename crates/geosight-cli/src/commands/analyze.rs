//! Analyze command implementation

use anyhow::Result;
use geosight_core::config::LayeredConfig;
use geosight_core::models::{GeocodeKey, Identity};
use geosight_core::GeosightError;
use geosight_session::{AnalyzeOutcome, ChatState, ChatUpdate, Workbench};

use super::{overlay, Services};
use crate::cli::AnalyzeArgs;
use crate::interactive::{prompt_follow_up, prompt_identity};
use crate::output::OutputWriter;
use crate::output_types::AnalyzeOutput;
use crate::progress::create_spinner;

const USER_ENV: &str = "GEOSIGHT_USER";
const TOKEN_ENV: &str = "GEOSIGHT_TOKEN";

enum Step {
    Update(Option<ChatUpdate>),
    Interrupted,
}

pub async fn execute(
    args: AnalyzeArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let mut services = Services::connect(config)?;
    overlay::load(&mut services, &args.overlay, config)?;

    match services.workbench.analyze().await? {
        AnalyzeOutcome::Started(generation) => {
            tracing::debug!(%generation, "Analysis stream opened");
            stream_reply(&mut services.workbench, output).await;
        }
        AnalyzeOutcome::Guidance => {
            if let Some(message) = services.workbench.transcript().last() {
                output.info(&message.content);
            }
        }
    }

    if args.interactive && !output.is_json() {
        converse(&mut services.workbench, output).await?;
    }

    let saved = if args.save {
        let can_prompt = args.interactive && !output.is_json();
        let identity = resolve_identity(args.user, args.token, can_prompt)?;
        Some(services.workbench.save_transcript(&services.store, identity.as_ref()).await)
    } else {
        None
    };

    let location = services
        .workbench
        .geometry()
        .bounds()
        .map(|bounds| bounds.center())
        .and_then(|center| services.geocoder.cached(&GeocodeKey::new(center.lat, center.lng)))
        .map(|entry| entry.label);

    let saved_session = match &saved {
        Some(Ok(saved)) => Some(saved.session_id.clone()),
        _ => None,
    };

    if output.is_json() {
        output.result(AnalyzeOutput {
            state: services.workbench.chat_state().to_string(),
            location,
            messages: services.workbench.transcript().messages().to_vec(),
            saved_session,
        })?;
    } else if let Some(Ok(saved)) = &saved {
        output.success(format!(
            "Saved {} messages as \"{}\" (session {})",
            saved.message_count, saved.title, saved.session_id
        ));
    }

    if let Some(Err(e)) = saved {
        return Err(e.into());
    }
    Ok(())
}

/// Follow-up loop; ends on an empty question.
///
/// A failed follow-up leaves the conversation settled, so the loop only stops
/// early when the analysis itself failed.
async fn converse(workbench: &mut Workbench, output: &OutputWriter) -> Result<()> {
    while workbench.chat_state() == ChatState::Settled {
        let Some(question) = prompt_follow_up()? else {
            break;
        };

        match workbench.follow_up(&question) {
            Ok(_) => stream_reply(workbench, output).await,
            Err(e @ GeosightError::Validation { .. }) => output.warning(e),
            Err(e) => return Err(e.into()),
        }
    }

    if workbench.chat_state() == ChatState::Failed {
        output.warning("The analysis failed; run it again to ask follow-up questions");
    }
    Ok(())
}

/// Render the current stream until it settles, fails or the user presses Ctrl-C
async fn stream_reply(workbench: &mut Workbench, output: &OutputWriter) {
    let spinner = create_spinner("Waiting for the analysis service...", output.is_json());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let step = tokio::select! {
            update = workbench.next_update() => Step::Update(update),
            _ = &mut ctrl_c => Step::Interrupted,
        };

        match step {
            Step::Update(Some(ChatUpdate::Opened)) => {
                spinner.finish_and_clear();
                output.speaker("Assistant");
            }
            Step::Update(Some(ChatUpdate::Delta(text))) => output.stream(&text),
            Step::Update(Some(ChatUpdate::Settled)) => {
                output.stream("\n");
            }
            Step::Update(Some(ChatUpdate::Failed(notice))) => {
                spinner.finish_and_clear();
                output.stream("\n");
                output.warning(notice);
            }
            Step::Update(None) => break,
            Step::Interrupted => {
                spinner.finish_and_clear();
                if workbench.cancel_stream() {
                    output.stream("\n");
                    output.warning("Response cancelled; the partial answer was kept");
                }
                break;
            }
        }
    }
    spinner.finish_and_clear();
}

/// Credentials from flags, then the environment, then a prompt when allowed
fn resolve_identity(
    user: Option<String>,
    token: Option<String>,
    can_prompt: bool,
) -> Result<Option<Identity>> {
    let user = user.or_else(|| std::env::var(USER_ENV).ok()).filter(|u| !u.trim().is_empty());
    let token = token.or_else(|| std::env::var(TOKEN_ENV).ok()).filter(|t| !t.trim().is_empty());

    match (user, token) {
        (Some(user), Some(token)) => Ok(Some(Identity { user, token })),
        (user, _) if can_prompt => Ok(Some(prompt_identity(user)?)),
        _ => Ok(None),
    }
}
