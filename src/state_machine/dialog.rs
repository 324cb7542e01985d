//! Inbound message routing for the bot-side dialog
//!
//! Decides what a plain (non-escalated) message means and holds the fixed
//! texts the bot answers with.

pub const RESET_PROMPT: &str = "Are you sure you want to reset the count?";
pub const RETRY_PROMPT: &str = "Didn't get that!";
pub const RESET_DONE: &str = "Reset count.";
pub const RESET_DECLINED: &str = "Did not reset count.";
pub const ESCALATING: &str = "Escalating to agent";
pub const ESCALATION_FAILED: &str =
    "Sorry, we couldn't reach a live agent right now. Please try again later.";

/// Display name for lines the live-chat system itself produces
pub const SYSTEM_SOURCE_NAME: &str = "system";

/// What an inbound message asks for when no live session is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Reset,
    Escalate,
    Echo,
}

/// Exact, case-sensitive "reset" wins over a "help" substring
pub fn route(text: &str) -> Route {
    if text == "reset" {
        Route::Reset
    } else if text.contains("help") {
        Route::Escalate
    } else {
        Route::Echo
    }
}

/// Interpret an answer to the reset prompt; `None` when it is neither
pub fn parse_confirmation(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" | "yep" | "sure" | "ok" | "true" => Some(true),
        "no" | "n" | "nope" | "false" => Some(false),
        _ => None,
    }
}

pub fn echo_reply(count: u32, text: &str) -> String {
    format!("{count}: You said {text}")
}
