//! Centralized error-to-ErrorData mapping for LeetTools tools.
use std::path::Path;

use rmcp::model::ErrorData;
use serde_json::{json, Value};

use crate::lib::errors::{OperationError, ToolErrorDescriptor};

use super::{
    options::{
        OperationKind, COMMAND_EXECUTION_ERROR, COMMAND_TIMEOUT_ERROR,
        EXECUTABLE_NOT_FOUND_ERROR, INVALID_REQUEST_ERROR, LOCAL_PATH_NOT_FOUND_ERROR,
    },
    request::RequestValidationError,
};

pub fn validation_error_to_error_data(err: RequestValidationError) -> ErrorData {
    match &err {
        RequestValidationError::LocalPathNotFound { path } => build_error_data(
            &LOCAL_PATH_NOT_FOUND_ERROR,
            json!({ "path": path.to_string_lossy(), "details": err.to_string() }),
            false,
        ),
        _ => build_error_data(
            &INVALID_REQUEST_ERROR,
            json!({ "details": err.to_string() }),
            false,
        ),
    }
}

pub fn operation_error_to_error_data(err: OperationError, kind: OperationKind) -> ErrorData {
    let options = kind.options(None);
    match err {
        OperationError::ExecutableNotFound { ref path } => build_operation_error(
            &EXECUTABLE_NOT_FOUND_ERROR,
            json!({ "path": path.to_string_lossy(), "details": err.to_string() }),
            false,
            kind,
            None,
            None,
        ),
        OperationError::CommandFailed {
            exit_code,
            ref stderr,
            ref log_path,
        } => build_operation_error(
            options.failure,
            json!({ "stderr": stderr }),
            true,
            kind,
            Some(log_path),
            Some(exit_code),
        ),
        OperationError::Timeout {
            duration_secs,
            ref log_path,
        } => build_operation_error(
            &COMMAND_TIMEOUT_ERROR,
            json!({ "duration_secs": duration_secs }),
            true,
            kind,
            Some(log_path),
            None,
        ),
        OperationError::NoResults { ref log_path, .. } => build_operation_error(
            options.no_results.unwrap_or(options.failure),
            json!({ "details": err.to_string() }),
            true,
            kind,
            Some(log_path),
            Some(Some(0)),
        ),
        OperationError::Execution { ref message } => build_operation_error(
            &COMMAND_EXECUTION_ERROR,
            json!({ "details": message }),
            true,
            kind,
            None,
            None,
        ),
    }
}

fn build_operation_error(
    desc: &'static ToolErrorDescriptor,
    details: Value,
    retryable: bool,
    kind: OperationKind,
    log_path: Option<&Path>,
    exit_code: Option<Option<i32>>,
) -> ErrorData {
    let mut builder = desc
        .builder()
        .details(details)
        .retryable(retryable)
        .internal()
        .with_context_field("operation", json!(kind.as_str()));
    if let Some(path) = log_path {
        builder = builder.with_context_field("log_path", json!(path.to_string_lossy()));
    }
    if let Some(code) = exit_code {
        builder = builder.with_exit_code_value(code);
    }
    builder
        .build()
        .unwrap_or_else(|err| ErrorData::internal_error(err.to_string(), None))
}

fn build_error_data(
    desc: &'static ToolErrorDescriptor,
    details: Value,
    retryable: bool,
) -> ErrorData {
    desc.builder()
        .details(details)
        .retryable(retryable)
        .build()
        .unwrap_or_else(|err| ErrorData::internal_error(err.to_string(), None))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rmcp::model::{ErrorCode, ErrorData};
    use serde_json::{Map, Value};

    use super::*;

    fn extract_data(error: &ErrorData) -> &Map<String, Value> {
        error
            .data
            .as_ref()
            .and_then(Value::as_object)
            .expect("error data should be an object")
    }

    #[test]
    fn command_failure_uses_operation_specific_code() {
        let err = OperationError::CommandFailed {
            exit_code: Some(2),
            stderr: "kb not found".into(),
            log_path: PathBuf::from("/tmp/kb_search_docs.log"),
        };
        let error = operation_error_to_error_data(err, OperationKind::KbSearch);
        let data = extract_data(&error);

        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(data.get("code").and_then(Value::as_str), Some("KB_SEARCH_FAILED"));
        assert_eq!(data.get("operation").and_then(Value::as_str), Some("kb_search"));
        assert_eq!(data.get("exit_code").and_then(Value::as_i64), Some(2));
        assert_eq!(
            data.get("log_path").and_then(Value::as_str),
            Some("/tmp/kb_search_docs.log")
        );
        assert_eq!(
            data.get("details")
                .and_then(|details| details.get("stderr"))
                .and_then(Value::as_str),
            Some("kb not found")
        );
    }

    #[test]
    fn kb_operations_share_one_failure_code() {
        for kind in [OperationKind::CreateKb, OperationKind::AddLocalToKb, OperationKind::ListKb] {
            let err = OperationError::CommandFailed {
                exit_code: None,
                stderr: "Unknown error".into(),
                log_path: PathBuf::from("/tmp/x.log"),
            };
            let error = operation_error_to_error_data(err, kind);
            let data = extract_data(&error);
            assert_eq!(data.get("code").and_then(Value::as_str), Some("KB_OPERATION_FAILED"));
            assert_eq!(data.get("exit_code"), Some(&Value::Null));
        }
    }

    #[test]
    fn no_results_maps_to_operation_no_results_code() {
        let err = OperationError::NoResults {
            operation: "extract",
            log_path: PathBuf::from("/tmp/extract.log"),
        };
        let error = operation_error_to_error_data(err, OperationKind::Extract);
        let data = extract_data(&error);
        assert_eq!(data.get("code").and_then(Value::as_str), Some("NO_EXTRACT_RESULTS"));
    }

    #[test]
    fn timeout_is_retryable() {
        let err = OperationError::Timeout {
            duration_secs: 30,
            log_path: PathBuf::from("/tmp/web.log"),
        };
        let error = operation_error_to_error_data(err, OperationKind::WebSearch);
        let data = extract_data(&error);
        assert_eq!(data.get("code").and_then(Value::as_str), Some("COMMAND_TIMEOUT"));
        assert_eq!(data.get("retryable").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn missing_local_path_has_its_own_code() {
        let err = RequestValidationError::LocalPathNotFound {
            path: PathBuf::from("/nope"),
        };
        let error = validation_error_to_error_data(err);
        let data = extract_data(&error);

        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(data.get("code").and_then(Value::as_str), Some("LOCAL_PATH_NOT_FOUND"));
        assert_eq!(data.get("retryable").and_then(Value::as_bool), Some(false));
    }

    #[test]
    fn other_validation_errors_are_invalid_requests() {
        let data = extract_data(&validation_error_to_error_data(RequestValidationError::EmptyQuery))
            .clone();
        assert_eq!(data.get("code").and_then(Value::as_str), Some("INVALID_REQUEST"));
    }
}
