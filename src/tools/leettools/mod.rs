//! LeetTools operations: request validation, `leet` execution, and result shaping.
pub mod errors;
pub mod executor;
pub mod options;
pub mod request;

use std::sync::Arc;

use rmcp::model::ErrorData;
use tracing::warn;

use crate::{
    lib::{
        env::{EnvSnapshot, LEET_HOME},
        leet::locate_leet,
    },
    server::config::LeetConfig,
};

pub use errors::{operation_error_to_error_data, validation_error_to_error_data};
pub use executor::{parse_kb_list, CommandResult, KnowledgeBaseEntry, LeetRunner};
pub use options::{CommandOptions, OperationKind};
pub use request::{
    AddLocalToKbRequest, CreateKbRequest, ExtractRequest, KbSearchRequest, LeetInvocation,
    RequestValidationError, ToolRequest, WebSearchRequest,
};

const TOOLS_TARGET: &str = "leettools_mcp::leet";

/// Shared entry point for the MCP tools and the `call` subcommand.
#[derive(Clone)]
pub struct LeetTools {
    runner: LeetRunner,
    default_knowledge_base: Arc<str>,
}

impl LeetTools {
    pub fn new(config: &LeetConfig, mut env: EnvSnapshot) -> Self {
        // leet reads its data root from LEET_HOME, which may come from the config file alone.
        if let Some(home) = &config.home {
            env.set_default(LEET_HOME, home.to_string_lossy());
        }
        let executable = locate_leet(config.executable.as_deref(), &env);
        let runner = LeetRunner::new(executable, config, env);
        Self::with_runner(runner, &config.default_knowledge_base)
    }

    pub fn with_runner(runner: LeetRunner, default_knowledge_base: &str) -> Self {
        Self {
            runner,
            default_knowledge_base: Arc::from(default_knowledge_base),
        }
    }

    pub fn runner(&self) -> &LeetRunner {
        &self.runner
    }

    pub fn default_knowledge_base(&self) -> &str {
        &self.default_knowledge_base
    }

    /// Validate and run one request, mapping failures to tool errors.
    pub async fn run(&self, request: ToolRequest) -> Result<CommandResult, ErrorData> {
        let kind = request.kind();
        let invocation = request
            .into_invocation(&self.default_knowledge_base)
            .map_err(|err| {
                warn!(
                    target: TOOLS_TARGET,
                    operation = %kind,
                    reason = %err,
                    "Rejected tool request"
                );
                validation_error_to_error_data(err)
            })?;
        self.runner
            .perform(&invocation)
            .await
            .map_err(|err| operation_error_to_error_data(err, kind))
    }
}
