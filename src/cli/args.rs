//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    launcher::OutputMode,
    tools::leettools::{
        request::{DEFAULT_DAYS_LIMIT, DEFAULT_SEARCH_ITERATION, DEFAULT_SEARCH_MAX_RESULTS},
        AddLocalToKbRequest, CreateKbRequest, ExtractRequest, KbSearchRequest, OperationKind,
        ToolRequest, WebSearchRequest,
    },
};

use super::LaunchProfile;

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    RunServer(LaunchProfile),
    Launch {
        profile: LaunchProfile,
        output: Option<OutputMode>,
    },
    Call {
        profile: LaunchProfile,
        request: ToolRequest,
        pretty: bool,
    },
}

/// Top-level optional CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Provision leettools under LEET_HOME and start the MCP server through `uv`.
    Launch(LaunchArgs),
    /// Run a single LeetTools operation and print its JSON result.
    Call(CallArgs),
}

/// Arguments for `launch`.
#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    /// Inherit the server's stdio (MCP) or capture it.
    #[arg(long, value_enum)]
    pub output: Option<OutputMode>,
}

/// Operations reachable through `call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallTool {
    WebSearch,
    KbSearch,
    ListKb,
    CreateKb,
    AddLocalToKb,
    Extract,
}

impl From<CallTool> for OperationKind {
    fn from(value: CallTool) -> Self {
        match value {
            CallTool::WebSearch => OperationKind::WebSearch,
            CallTool::KbSearch => OperationKind::KbSearch,
            CallTool::ListKb => OperationKind::ListKb,
            CallTool::CreateKb => OperationKind::CreateKb,
            CallTool::AddLocalToKb => OperationKind::AddLocalToKb,
            CallTool::Extract => OperationKind::Extract,
        }
    }
}

/// Arguments for `call`.
#[derive(Debug, Clone, Args)]
#[command(
    after_help = "Example: leettools-mcp call web-search -q \"rust async runtimes\" -m 5 --pretty"
)]
pub struct CallArgs {
    /// Tool to run.
    #[arg(value_enum)]
    pub tool: CallTool,
    /// Search or extraction query.
    #[arg(short, long)]
    pub query: Option<String>,
    /// Knowledge base name.
    #[arg(short = 'k', long = "kb")]
    pub knowledge_base: Option<String>,
    /// Local file or folder for add-local-to-kb.
    #[arg(short = 'p', long)]
    pub local_path: Option<PathBuf>,
    /// Maximum search results for web-search.
    #[arg(short = 'm', long)]
    pub max_results: Option<u32>,
    /// Search iterations for web-search.
    #[arg(short = 'i', long)]
    pub iteration: Option<u32>,
    /// Pydantic model file for extract.
    #[arg(long)]
    pub extract_model: Option<PathBuf>,
    /// Day window for extract.
    #[arg(long)]
    pub days_limit: Option<u32>,
    /// Pretty-print the JSON result.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl CallArgs {
    /// Map flags onto the tool's request, applying the tool defaults.
    pub fn into_request(self) -> Result<ToolRequest> {
        let tool = self.tool;
        let missing = |flag: &str| {
            anyhow!(
                "`{}` requires {flag}",
                OperationKind::from(tool).as_str()
            )
        };
        let request = match tool {
            CallTool::WebSearch => ToolRequest::WebSearch(WebSearchRequest {
                query: self.query.ok_or_else(|| missing("--query"))?,
                search_max_results: self.max_results.unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
                search_iteration: self.iteration.unwrap_or(DEFAULT_SEARCH_ITERATION),
                knowledge_base_name: self.knowledge_base,
            }),
            CallTool::KbSearch => ToolRequest::KbSearch(KbSearchRequest {
                query: self.query.ok_or_else(|| missing("--query"))?,
                knowledge_base_name: self.knowledge_base,
            }),
            CallTool::ListKb => ToolRequest::ListKb,
            CallTool::CreateKb => ToolRequest::CreateKb(CreateKbRequest {
                knowledge_base_name: self.knowledge_base.ok_or_else(|| missing("--kb"))?,
            }),
            CallTool::AddLocalToKb => ToolRequest::AddLocalToKb(AddLocalToKbRequest {
                local_path: self.local_path.ok_or_else(|| missing("--local-path"))?,
                knowledge_base_name: self.knowledge_base,
            }),
            CallTool::Extract => ToolRequest::Extract(ExtractRequest {
                query: self.query.ok_or_else(|| missing("--query"))?,
                extract_pydantic: self.extract_model.ok_or_else(|| missing("--extract-model"))?,
                knowledge_base_name: self.knowledge_base,
                days_limit: self.days_limit.unwrap_or(DEFAULT_DAYS_LIMIT),
            }),
        };
        Ok(request)
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "leettools-mcp",
    author,
    version,
    about = "LeetTools MCP server and bootstrap launcher",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Path to config.toml (overrides MCP_CONFIG_PATH).
    #[arg(long = "config", global = true)]
    pub config_override: Option<PathBuf>,
    /// Optional CLI command mode; without one the MCP server runs on stdio.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Parse CLI args into server, launcher, or single-call mode.
    pub fn into_command(self) -> Result<ParsedCommand> {
        match self.command {
            None => Ok(ParsedCommand::RunServer(LaunchProfile::new(
                self.config_override,
                "server",
            ))),
            Some(CliCommand::Launch(args)) => Ok(ParsedCommand::Launch {
                profile: LaunchProfile::new(self.config_override, "launch"),
                output: args.output,
            }),
            Some(CliCommand::Call(args)) => {
                let pretty = args.pretty;
                let request = args.into_request()?;
                Ok(ParsedCommand::Call {
                    profile: LaunchProfile::new(self.config_override, "call"),
                    request,
                    pretty,
                })
            }
        }
    }
}
