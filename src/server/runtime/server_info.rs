use crate::{server::config::ServerConfig, tools::leettools::LeetTools};

/// Build the `ServerInfo.instructions` string shown to MCP clients.
pub fn build_instructions(config: &ServerConfig, tools: &LeetTools) -> String {
    let source = if config.file_loaded {
        format!("config {}", config.source_path.display())
    } else {
        "built-in defaults".to_string()
    };
    format!(
        "LeetTools tools backed by {executable} ({executable_source}); loaded {source}. \
Searches default to the '{kb}' knowledge base and write results under {output_dir}. \
web_search needs EDS_LLM_API_KEY in the server environment.",
        executable = tools.runner().executable(),
        executable_source = tools.runner().executable().source(),
        kb = tools.default_knowledge_base(),
        output_dir = tools.runner().output_dir().display(),
    )
}
