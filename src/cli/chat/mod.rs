pub mod conversation_state;
pub mod prompt;
pub mod responder;

use std::io::Write;
use std::process::ExitCode;

use color_print::cformat;
use eyre::Result;
use prompt::generate_prompt;
use responder::{ChatResponder, Reply};
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::cerebras_client::CompletionService;

pub const DEFAULT_CONTEXT_ID: &str = "default";

const WELCOME_TEXT: &str = "
Hi, I'm Cerebras Chat. Ask me anything.

Each conversation keeps its last 10 messages as context.

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Cerebras Chat CLI

/clear          Clear the current conversation
/context <id>   Switch to another conversation (created on first use)
/contexts       List conversations with history
/history        Show the current conversation
/help           Show this help dialogue
/quit           Quit the application
";

pub struct ChatContext<C> {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    context_id: String,
    responder: ChatResponder<C>,
}

impl<C: CompletionService> ChatContext<C> {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        context_id: String,
        responder: ChatResponder<C>,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            context_id,
            responder,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Single question, single answer
        if let Some(input) = self.input.take() {
            let reply = self.responder.request_reply(&input, &self.context_id).await;
            self.print_reply(&reply)?;
            return Ok(if reply.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }

        if self.interactive {
            self.print_welcome()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        writeln!(
            self.output,
            "{}",
            cformat!("Using model <bold>{}</bold>\n", self.responder.model())
        )?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(&self.context_id);
            match rl.readline(&prompt_text) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    self.handle_input(&line).await?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        info!("Leaving interactive session");
        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        let trimmed = input.trim();
        match trimmed {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.responder.clear_context(&self.context_id);
                writeln!(self.output, "Conversation cleared.")?;
            }
            "/contexts" => self.print_contexts()?,
            "/history" => self.print_history()?,
            _ if trimmed == "/context" || trimmed.starts_with("/context ") => {
                let id = trimmed["/context".len()..].trim();
                if id.is_empty() {
                    writeln!(self.output, "Usage: /context <id>")?;
                } else {
                    debug!(from = %self.context_id, to = id, "Switching conversation");
                    self.context_id = id.to_string();
                    writeln!(self.output, "Switched to conversation '{}'.", id)?;
                }
            }
            _ => {
                let reply = self.responder.request_reply(input, &self.context_id).await;
                self.print_reply(&reply)?;
            }
        }

        Ok(())
    }

    fn print_reply(&mut self, reply: &Reply) -> Result<()> {
        match reply {
            Reply::Success(text) => writeln!(self.output, "{}", text)?,
            Reply::Failure { .. } => {
                writeln!(self.output, "{}", cformat!("<red>{}</red>", reply.render()))?
            }
        }
        Ok(())
    }

    fn print_contexts(&mut self) -> Result<()> {
        let ids: Vec<String> = self
            .responder
            .context_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            writeln!(self.output, "No conversations yet.")?;
            return Ok(());
        }
        for id in ids {
            let marker = if id == self.context_id { "*" } else { " " };
            writeln!(self.output, "{} {}", marker, id)?;
        }
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        let history = match self.responder.history(&self.context_id) {
            Some(history) if !history.is_empty() => history,
            _ => {
                writeln!(self.output, "Conversation '{}' is empty.", self.context_id)?;
                return Ok(());
            }
        };
        for message in history.get_messages() {
            writeln!(self.output, "{}: {}", message.role, message.content)?;
        }
        Ok(())
    }
}
