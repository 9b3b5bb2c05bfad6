//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Typed lines are text messages. A line starting with `#` presses the
//! button with that callback data, e.g. `#lang_ru` or `#form`.

use std::sync::LazyLock;

use async_trait::async_trait;
use futures::stream;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, EventStream, IncomingEvent, Messenger};
use crate::error::ChannelError;
use crate::router::{InboundEvent, Prompt};
use crate::session::UserId;

const CLI_USER: &str = "local-user";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("valid tag regex"));

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

/// Decode one input line.
fn parse_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line.strip_prefix('#') {
        Some(data) => InboundEvent::from_callback_data(data.trim()),
        None => InboundEvent::from_text(line),
    })
}

/// Prompt as terminal text: tags stripped, buttons listed below.
fn render(prompt: &Prompt) -> String {
    let mut out = HTML_TAG.replace_all(&prompt.text, "").into_owned();
    if let Some(keyboard) = &prompt.keyboard {
        out.push('\n');
        for button in keyboard.buttons() {
            out.push_str(&format!("\n  [{}]  #{}", button.label, button.callback_data));
        }
    }
    out
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprintln!("Type /start to begin. Press a button with #<data>.");
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = parse_line(&line) else {
                            eprint!("> ");
                            continue;
                        };
                        let incoming = IncomingEvent::new("cli", UserId::from(CLI_USER), event);
                        if tx.send(incoming).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[async_trait]
impl Messenger for CliChannel {
    async fn send_prompt(&self, _user_id: &UserId, prompt: &Prompt) -> Result<(), ChannelError> {
        println!("\n{}\n", render(prompt));
        eprint!("> ");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::ActionId;
    use crate::router::{Button, Keyboard};
    use crate::session::Language;

    #[test]
    fn hash_prefix_presses_a_button() {
        assert_eq!(
            parse_line("#lang_kz"),
            Some(InboundEvent::LanguageSelect(Language::Kz))
        );
        assert_eq!(
            parse_line("  # form "),
            Some(InboundEvent::MenuAction(ActionId::Form))
        );
        assert_eq!(
            parse_line("#nope"),
            Some(InboundEvent::Unrecognized("nope".into()))
        );
    }

    #[test]
    fn plain_lines_are_text() {
        assert_eq!(parse_line("/start"), Some(InboundEvent::Start));
        assert_eq!(
            parse_line("Алматы"),
            Some(InboundEvent::TextAnswer("Алматы".into()))
        );
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn render_strips_markup_and_lists_buttons() {
        let prompt = Prompt::text("<b>Hi</b> <i>there</i>", Language::Ru)
            .with_keyboard(Keyboard::column([Button::action(ActionId::Form, Language::Ru)]));
        let out = render(&prompt);
        assert!(out.starts_with("Hi there"));
        assert!(out.contains("#form"));
    }
}
