use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::options::OperationKind;

pub const DEFAULT_SEARCH_MAX_RESULTS: u32 = 10;
pub const DEFAULT_SEARCH_ITERATION: u32 = 1;
pub const DEFAULT_DAYS_LIMIT: u32 = 30;
pub const DEBUG_LOG_LEVEL: &str = "DEBUG";

const MAX_QUERY_LEN: usize = 4_096;

fn default_search_max_results() -> u32 {
    DEFAULT_SEARCH_MAX_RESULTS
}

fn default_search_iteration() -> u32 {
    DEFAULT_SEARCH_ITERATION
}

fn default_days_limit() -> u32 {
    DEFAULT_DAYS_LIMIT
}

/// Input for `web_search`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchRequest {
    /// The search query.
    pub query: String,
    /// Maximum search results to process.
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,
    /// Number of search iterations to perform.
    #[serde(default = "default_search_iteration")]
    pub search_iteration: u32,
    /// Knowledge base that stores the fetched pages (defaults to mcp_search).
    #[serde(default)]
    pub knowledge_base_name: Option<String>,
}

/// Input for `kb_search`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KbSearchRequest {
    /// The search query.
    pub query: String,
    /// Knowledge base to search (defaults to mcp_search).
    #[serde(default)]
    pub knowledge_base_name: Option<String>,
}

/// Input for `create_kb`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateKbRequest {
    /// Name of the knowledge base to create.
    pub knowledge_base_name: String,
}

/// Input for `add_local_to_kb`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddLocalToKbRequest {
    /// Path to the local file or folder to add.
    pub local_path: PathBuf,
    /// Target knowledge base; derived from the folder name when omitted.
    #[serde(default)]
    pub knowledge_base_name: Option<String>,
}

/// Input for `extract`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractRequest {
    /// Query selecting the data to extract.
    pub query: String,
    /// Full path of the Pydantic model python file describing the extracted rows.
    pub extract_pydantic: PathBuf,
    /// Knowledge base to extract from (defaults to mcp_search).
    #[serde(default)]
    pub knowledge_base_name: Option<String>,
    /// Only consider documents from the last N days.
    #[serde(default = "default_days_limit")]
    pub days_limit: u32,
}

/// One validated tool call.
#[derive(Debug, Clone)]
pub enum ToolRequest {
    WebSearch(WebSearchRequest),
    KbSearch(KbSearchRequest),
    ListKb,
    CreateKb(CreateKbRequest),
    AddLocalToKb(AddLocalToKbRequest),
    Extract(ExtractRequest),
}

/// A validated request rendered as `leet` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeetInvocation {
    pub kind: OperationKind,
    pub args: Vec<String>,
    pub knowledge_base: Option<String>,
}

impl ToolRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            ToolRequest::WebSearch(_) => OperationKind::WebSearch,
            ToolRequest::KbSearch(_) => OperationKind::KbSearch,
            ToolRequest::ListKb => OperationKind::ListKb,
            ToolRequest::CreateKb(_) => OperationKind::CreateKb,
            ToolRequest::AddLocalToKb(_) => OperationKind::AddLocalToKb,
            ToolRequest::Extract(_) => OperationKind::Extract,
        }
    }

    /// Validate the request and build its `leet` argument list.
    pub fn into_invocation(
        self,
        default_knowledge_base: &str,
    ) -> Result<LeetInvocation, RequestValidationError> {
        let kind = self.kind();
        let pick_kb = |name: Option<String>| -> Result<String, RequestValidationError> {
            let name = name.unwrap_or_else(|| default_knowledge_base.to_string());
            validate_knowledge_base(&name)?;
            Ok(name)
        };

        let (args, knowledge_base) = match self {
            ToolRequest::WebSearch(request) => {
                validate_query(&request.query)?;
                validate_positive("search_max_results", request.search_max_results)?;
                validate_positive("search_iteration", request.search_iteration)?;
                let kb = pick_kb(request.knowledge_base_name)?;
                let args = strings([
                    "flow",
                    "-t",
                    "search",
                    "-k",
                    kb.as_str(),
                    "-q",
                    request.query.as_str(),
                    "-p",
                    format!("search_max_results={}", request.search_max_results).as_str(),
                    "-p",
                    format!("search_iteration={}", request.search_iteration).as_str(),
                ]);
                (args, Some(kb))
            }
            ToolRequest::KbSearch(request) => {
                validate_query(&request.query)?;
                let kb = pick_kb(request.knowledge_base_name)?;
                let args = strings([
                    "flow",
                    "-t",
                    "search",
                    "-k",
                    kb.as_str(),
                    "-q",
                    request.query.as_str(),
                    "-p",
                    "retriever_type=local",
                ]);
                (args, Some(kb))
            }
            ToolRequest::ListKb => (strings(["kb", "list"]), None),
            ToolRequest::CreateKb(request) => {
                validate_knowledge_base(&request.knowledge_base_name)?;
                let args = strings(["kb", "create", "-k", request.knowledge_base_name.as_str()]);
                (args, Some(request.knowledge_base_name))
            }
            ToolRequest::AddLocalToKb(request) => {
                if request.local_path.as_os_str().is_empty() || !request.local_path.exists() {
                    return Err(RequestValidationError::LocalPathNotFound {
                        path: request.local_path,
                    });
                }
                let kb = match request.knowledge_base_name {
                    Some(name) if !name.trim().is_empty() => name,
                    _ => knowledge_base_from_path(&request.local_path).ok_or(
                        RequestValidationError::UnnamedLocalPath {
                            path: request.local_path.clone(),
                        },
                    )?,
                };
                validate_knowledge_base(&kb)?;
                let local_path = request.local_path.to_string_lossy();
                let args = strings([
                    "kb",
                    "add-local",
                    "-p",
                    &*local_path,
                    "-k",
                    kb.as_str(),
                    "-l",
                    DEBUG_LOG_LEVEL,
                ]);
                (args, Some(kb))
            }
            ToolRequest::Extract(request) => {
                validate_query(&request.query)?;
                validate_positive("days_limit", request.days_limit)?;
                if !request.extract_pydantic.is_file() {
                    return Err(RequestValidationError::ModelFileNotFound {
                        path: request.extract_pydantic,
                    });
                }
                let kb = pick_kb(request.knowledge_base_name)?;
                let args = strings([
                    "flow",
                    "-t",
                    "extract",
                    "-k",
                    kb.as_str(),
                    "-q",
                    request.query.as_str(),
                    "-p",
                    format!(
                        "extract_pydantic={}",
                        request.extract_pydantic.to_string_lossy()
                    )
                    .as_str(),
                    "-p",
                    format!("days_limit={}", request.days_limit).as_str(),
                    "-p",
                    "extract_output_format=csv",
                ]);
                (args, Some(kb))
            }
        };

        Ok(LeetInvocation {
            kind,
            args,
            knowledge_base,
        })
    }
}

/// Knowledge base name from a path's base name: spaces, `-` and `.` become `_`, lowercased.
pub fn knowledge_base_from_path(path: &Path) -> Option<String> {
    let base = path.file_name()?.to_string_lossy();
    let name: String = base
        .chars()
        .map(|ch| match ch {
            ' ' | '-' | '.' => '_',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    (!name.is_empty()).then_some(name)
}

fn strings<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn validate_query(query: &str) -> Result<(), RequestValidationError> {
    if query.trim().is_empty() {
        return Err(RequestValidationError::EmptyQuery);
    }
    let length = query.chars().count();
    if length > MAX_QUERY_LEN {
        return Err(RequestValidationError::QueryTooLong { length });
    }
    Ok(())
}

fn validate_knowledge_base(name: &str) -> Result<(), RequestValidationError> {
    if name.trim().is_empty() {
        return Err(RequestValidationError::EmptyKnowledgeBase);
    }
    // The name also becomes part of the per-call log and output file names.
    if name.starts_with('-') || name.contains(['/', '\\']) || name.contains(char::is_control) {
        return Err(RequestValidationError::InvalidKnowledgeBase { name: name.into() });
    }
    Ok(())
}

fn validate_positive(field: &'static str, value: u32) -> Result<(), RequestValidationError> {
    if value == 0 {
        return Err(RequestValidationError::NotPositive { field });
    }
    Ok(())
}

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("query is required")]
    EmptyQuery,
    #[error("query is too long ({length} characters, max {MAX_QUERY_LEN})")]
    QueryTooLong { length: usize },
    #[error("knowledge_base_name cannot be empty")]
    EmptyKnowledgeBase,
    #[error("knowledge_base_name `{name}` must not start with `-` or contain path separators")]
    InvalidKnowledgeBase { name: String },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("The specified path '{}' does not exist.", path.display())]
    LocalPathNotFound { path: PathBuf },
    #[error(
        "Cannot derive a knowledge base name from '{}'; pass knowledge_base_name",
        path.display()
    )]
    UnnamedLocalPath { path: PathBuf },
    #[error("extract_pydantic file '{}' does not exist", path.display())]
    ModelFileNotFound { path: PathBuf },
}
