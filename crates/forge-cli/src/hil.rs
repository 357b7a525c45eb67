//! Console review handler.
//!
//! Presents each pause point on the terminal and reads the reviewer's
//! decision with rustyline. Blocking on user input inside the async handler
//! is fine here: the pipeline is suspended waiting for the human anyway.

use crate::error::{CliError, Result};
use async_trait::async_trait;
use colored::*;
use forge_hil::{HilAction, HilContext, HilError, HilHandler, HilResponse};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Mutex;

const PROMPT_ATTEMPTS: usize = 3;

/// Interactive reviewer prompting on the terminal.
pub struct ConsoleReviewer {
    editor: Mutex<DefaultEditor>,
}

impl ConsoleReviewer {
    /// Create a reviewer, failing when no line editor can be constructed.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| CliError::Config(format!("cannot initialize line editor: {}", e)))?;
        Ok(Self {
            editor: Mutex::new(editor),
        })
    }

    fn present(context: &HilContext) {
        let stage = if context.pre_execution {
            "before execution"
        } else {
            "output review"
        };
        println!();
        println!(
            "{} {} ({}, agent {})",
            "checkpoint:".bold(),
            context.phase.bold(),
            stage,
            context.agent
        );

        for (key, value) in &context.metadata {
            println!("  {}: {}", key, value);
        }

        if !context.results.is_null() {
            match serde_json::to_string_pretty(&context.results) {
                Ok(rendered) => println!("{}", rendered),
                Err(_) => println!("{}", context.results),
            }
        }

        let actions = context
            .available_actions
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(" / ");
        println!("  actions: {}", actions);
    }

    fn read_decision(&self, context: &HilContext) -> std::result::Result<HilResponse, HilError> {
        let mut editor = self
            .editor
            .lock()
            .map_err(|e| HilError::Handler(format!("editor lock poisoned: {}", e)))?;

        for _ in 0..PROMPT_ATTEMPTS {
            let line = match editor.readline("forge> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    return Ok(HilResponse::abort("review input closed"));
                }
                Err(e) => return Err(HilError::ChannelClosed(e.to_string())),
            };
            let _ = editor.add_history_entry(line.as_str());

            let Some(action) = HilAction::parse(&line) else {
                println!("unrecognized action '{}'", line.trim());
                continue;
            };

            if !context.allows(action) {
                println!("'{}' is not available at this checkpoint", action);
                continue;
            }

            if action == HilAction::Edit {
                return self.read_edit(&mut editor);
            }
            return Ok(HilResponse::action(action));
        }

        Ok(HilResponse::abort("no usable decision after repeated prompts"))
    }

    /// EDIT flow: the reviewer supplies a file holding the replacement JSON.
    fn read_edit(
        &self,
        editor: &mut DefaultEditor,
    ) -> std::result::Result<HilResponse, HilError> {
        let path = editor
            .readline("path to edited results JSON> ")
            .map_err(|e| HilError::ChannelClosed(e.to_string()))?;

        let raw = std::fs::read_to_string(path.trim())
            .map_err(|e| HilError::Handler(format!("cannot read edited results: {}", e)))?;
        let results = serde_json::from_str(&raw)
            .map_err(|e| HilError::Handler(format!("edited results are not valid JSON: {}", e)))?;

        Ok(HilResponse::edit_results(results))
    }
}

#[async_trait]
impl HilHandler for ConsoleReviewer {
    async fn handle(&self, context: &HilContext) -> std::result::Result<HilResponse, HilError> {
        Self::present(context);
        self.read_decision(context)
    }
}
