use anyhow::Result;
use dialoguer::{Input, Password};
use geosight_core::models::Identity;

/// Ask for the next follow-up question; `None` ends the conversation
pub fn prompt_follow_up() -> Result<Option<String>> {
    let question: String = Input::new()
        .with_prompt("You (empty line to finish)")
        .allow_empty(true)
        .interact_text()?;

    let question = question.trim();
    if question.is_empty() {
        Ok(None)
    } else {
        Ok(Some(question.to_string()))
    }
}

/// Ask for the credentials used to save the transcript
pub fn prompt_identity(user: Option<String>) -> Result<Identity> {
    println!("\n🔑 Save conversation\n");

    let user = match user {
        Some(user) => user,
        None => Input::new().with_prompt("User").interact_text()?,
    };
    let token = Password::new().with_prompt("Access token").interact()?;

    Ok(Identity { user, token })
}
