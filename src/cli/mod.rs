//! CLI commands for agentwire using clap.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::adapters::{AnthropicXmlAdapter, ToolDefinition};
use crate::config::{load_settings_from, load_settings_or_default, Settings};
use crate::protocol::{Envelope, ProtocolModule, WireMessage, CANONICAL_PROTOCOL};

/// agentwire - translate agent messages between wire protocols.
#[derive(Parser)]
#[command(name = "agentwire")]
#[command(version = "0.1.0")]
#[command(about = "Translate agent-to-agent messages between wire protocols", long_about = None)]
pub struct Commands {
    /// Settings file (defaults to ~/.agentwire/settings.json)
    #[arg(long, global = true, env = "AGENTWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate a message from one protocol to another
    #[command(alias = "t")]
    Translate {
        /// Source protocol id, e.g. anthropic-xml-v1.0
        #[arg(long)]
        from: String,

        /// Target protocol id, e.g. a2a-v2.0
        #[arg(long)]
        to: String,

        /// Input file (reads stdin when absent)
        input: Option<PathBuf>,
    },

    /// List registered adapters and the protocols they handle
    Adapters,

    /// Render JSON tool definitions as Anthropic function XML
    Tools {
        /// JSON file holding one definition or an array (reads stdin when absent)
        input: Option<PathBuf>,
    },

    /// Render a function result as Anthropic function-results XML
    ToolResult {
        /// Function name
        name: String,

        /// Result content; JSON is embedded as JSON, anything else as text
        content: String,
    },
}

impl Commands {
    /// Load the settings this invocation should use.
    pub fn settings(&self) -> Result<Settings> {
        match &self.config {
            Some(path) => load_settings_from(path)
                .with_context(|| format!("loading settings from {}", path.display())),
            None => Ok(load_settings_or_default()),
        }
    }

    pub fn run(self, settings: &Settings) -> Result<()> {
        match self.command {
            Command::Translate { from, to, input } => {
                let module = ProtocolModule::new(settings)?;
                let text = read_input(input.as_deref())?;
                let message = parse_input(&from, &text)?;
                let translated = module.translate(message, &from, &to)?;
                println!("{}", translated.render()?);
            }
            Command::Adapters => {
                let module = ProtocolModule::new(settings)?;
                for adapter in module.registry().get_all_adapters() {
                    println!(
                        "{} v{}  [{}]",
                        adapter.name(),
                        adapter.version(),
                        adapter.supported_protocols().join(", ")
                    );
                }
            }
            Command::Tools { input } => {
                let text = read_input(input.as_deref())?;
                println!("{}", render_tools(&text)?);
            }
            Command::ToolResult { name, content } => {
                let adapter = AnthropicXmlAdapter::new();
                println!(
                    "{}",
                    adapter.create_function_call_response(&name, &parse_result_content(&content))
                );
            }
        }
        Ok(())
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Canonical input is envelope JSON; everything else is handed to the
/// source adapter as text.
fn parse_input(protocol: &str, text: &str) -> Result<WireMessage> {
    if protocol == CANONICAL_PROTOCOL {
        let envelope = Envelope::from_json(text).context("parsing canonical envelope")?;
        return Ok(WireMessage::Envelope(envelope));
    }
    Ok(WireMessage::Text(text.trim().to_string()))
}

fn render_tools(text: &str) -> Result<String> {
    let adapter = AnthropicXmlAdapter::new();
    let value: Value = serde_json::from_str(text).context("parsing tool definitions")?;

    if value.is_array() {
        let tools: Vec<ToolDefinition> = serde_json::from_value(value)?;
        Ok(adapter.tool_definitions_to_xml(&tools)?)
    } else {
        let tool: ToolDefinition = serde_json::from_value(value)?;
        Ok(adapter.tool_definition_to_xml(&tool)?)
    }
}

fn parse_result_content(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()))
}
