use crate::config::Config;
use crate::history::{Role, Turn};

const PERSONA: &str = "You are {name}, a kind and caring trainee nurse. You listen well, \
understand how people feel, and offer encouragement. You give expert guidance on health \
and nutrition that helps ease worries.";

const INSTRUCTIONS: &[&str] = &[
    "Answer concisely and in plain language.",
    "Keep the answer to about 3-4 sentences.",
    "Use polite, encouraging language.",
    "Recommend that the user book a visit with a doctor whenever there is doubt.",
];

const CLOSING: &str = "Please answer in a gentle, polite tone.";

pub fn build_prompt(cfg: &Config, question: &str, context: &str, history: &[Turn]) -> String {
    let recent = recent_turns(history, cfg.history_window);
    let history_text = render_history(recent, &cfg.assistant_name);
    let instructions = INSTRUCTIONS
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Role: {}\n\nInstructions:\n{}\n\nContext:\n{}\n\nConversation history:\n{}\n\nNew question: {}\n\n{}",
        PERSONA.replace("{name}", &cfg.assistant_name),
        instructions,
        context,
        history_text,
        question,
        CLOSING
    )
}

/// One labelled line per turn.
pub fn render_history(turns: &[Turn], assistant_name: &str) -> String {
    turns
        .iter()
        .map(|turn| match turn.role() {
            Role::User => format!("User: {}", turn.text()),
            Role::Assistant => format!("{}: {}", assistant_name, turn.text()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn recent_turns(history: &[Turn], window: usize) -> &[Turn] {
    &history[history.len().saturating_sub(window)..]
}
