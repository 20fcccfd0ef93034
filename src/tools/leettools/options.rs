//! Per-operation behavior: file prefixes, error codes, and what the result carries.

use std::fmt;

use crate::lib::errors::ToolErrorDescriptor;

pub const OUTPUT_SUFFIX: &str = ".md";
pub const CSV_OUTPUT_SUFFIX: &str = ".csv";

/// Guidance attached to search results for the presenting model.
pub const SEARCH_CITATIONS: &str = "When present the results, please show the references of the articles with title and full web link. \
For references, only show relevant links for articles. Don't show links for images. \
If the full web link is not available, then don't show that reference.";

pub const EXECUTABLE_NOT_FOUND_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "EXECUTABLE_NOT_FOUND",
    "LeetTools executable not found",
    "Install LeetTools and make sure `leet` is on PATH, or set LEET_EXECUTABLE / leet.executable.",
);
pub const KB_OPERATION_FAILED_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "KB_OPERATION_FAILED",
    "Knowledge base operation failed",
    "Check the command log for the leet error and verify the knowledge base name.",
);
pub const WEB_SEARCH_FAILED_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "WEB_SEARCH_FAILED",
    "Error running web_search",
    "Check the command log; verify EDS_LLM_API_KEY and network access.",
);
pub const KB_SEARCH_FAILED_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "KB_SEARCH_FAILED",
    "Error running kb_search",
    "Check the command log and confirm the knowledge base exists (list_kb).",
);
pub const EXTRACT_FAILED_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "EXTRACT_FAILED",
    "Error running extract",
    "Check the command log and the Pydantic model file passed as extract_pydantic.",
);
pub const NO_WEB_SEARCH_RESULTS_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "NO_WEB_SEARCH_RESULTS",
    "No web search results found",
    "Rephrase the query or raise search_max_results.",
);
pub const NO_KB_RESULTS_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "NO_KB_RESULTS",
    "No knowledge base results found",
    "Add documents with add_local_to_kb or search a different knowledge base.",
);
pub const NO_EXTRACT_RESULTS_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "NO_EXTRACT_RESULTS",
    "No extraction results found",
    "Widen days_limit or check that the knowledge base holds matching documents.",
);
pub const COMMAND_EXECUTION_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "COMMAND_EXECUTION_ERROR",
    "Error running LeetTools command",
    "Inspect the server logs; the output directory may be unwritable.",
);
pub const COMMAND_TIMEOUT_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "COMMAND_TIMEOUT",
    "LeetTools command timed out",
    "Retry with a narrower request or raise leet.command_timeout_secs.",
);
pub const LOCAL_PATH_NOT_FOUND_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "LOCAL_PATH_NOT_FOUND",
    "Local path does not exist",
    "Pass an existing file or folder path as local_path.",
);
pub const INVALID_REQUEST_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "INVALID_REQUEST",
    "The tool request is invalid",
    "Fix the reported field and call the tool again.",
);

/// LeetTools operations exposed as tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    WebSearch,
    KbSearch,
    ListKb,
    CreateKb,
    AddLocalToKb,
    Extract,
}

impl OperationKind {
    /// Tool name as registered on the MCP server.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::WebSearch => "web_search",
            OperationKind::KbSearch => "kb_search",
            OperationKind::ListKb => "list_kb",
            OperationKind::CreateKb => "create_kb",
            OperationKind::AddLocalToKb => "add_local_to_kb",
            OperationKind::Extract => "extract",
        }
    }

    /// Command options for this operation against `knowledge_base`.
    pub fn options(&self, knowledge_base: Option<&str>) -> CommandOptions {
        let kb = knowledge_base.unwrap_or_default();
        match self {
            OperationKind::WebSearch => CommandOptions {
                output_prefix: format!("web_search_{kb}"),
                output_suffix: OUTPUT_SUFFIX,
                failure: &WEB_SEARCH_FAILED_ERROR,
                instructions: Some(SEARCH_CITATIONS),
                no_results: Some(&NO_WEB_SEARCH_RESULTS_ERROR),
                read_output_file: true,
                return_stdout: false,
                return_stderr: false,
                parse_knowledge_bases: false,
            },
            OperationKind::KbSearch => CommandOptions {
                output_prefix: format!("kb_search_{kb}"),
                output_suffix: OUTPUT_SUFFIX,
                failure: &KB_SEARCH_FAILED_ERROR,
                instructions: Some(SEARCH_CITATIONS),
                no_results: Some(&NO_KB_RESULTS_ERROR),
                read_output_file: true,
                return_stdout: false,
                return_stderr: false,
                parse_knowledge_bases: false,
            },
            OperationKind::Extract => CommandOptions {
                output_prefix: format!("extract_{kb}"),
                output_suffix: CSV_OUTPUT_SUFFIX,
                failure: &EXTRACT_FAILED_ERROR,
                instructions: None,
                no_results: Some(&NO_EXTRACT_RESULTS_ERROR),
                read_output_file: true,
                return_stdout: false,
                return_stderr: false,
                parse_knowledge_bases: false,
            },
            OperationKind::ListKb | OperationKind::CreateKb | OperationKind::AddLocalToKb => {
                CommandOptions {
                    output_prefix: format!("kb_ops_{}", self.as_str()),
                    output_suffix: OUTPUT_SUFFIX,
                    failure: &KB_OPERATION_FAILED_ERROR,
                    instructions: None,
                    no_results: None,
                    read_output_file: false,
                    return_stdout: *self == OperationKind::ListKb,
                    return_stderr: false,
                    parse_knowledge_bases: *self == OperationKind::ListKb,
                }
            }
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one operation is run and how its result is shaped.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub output_prefix: String,
    pub output_suffix: &'static str,
    pub failure: &'static ToolErrorDescriptor,
    pub instructions: Option<&'static str>,
    pub no_results: Option<&'static ToolErrorDescriptor>,
    pub read_output_file: bool,
    pub return_stdout: bool,
    pub return_stderr: bool,
    pub parse_knowledge_bases: bool,
}
