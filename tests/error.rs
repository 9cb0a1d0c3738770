use std::path::PathBuf;

use todosync::error::{exit_codes, Error, JsonError};

#[test]
fn user_errors_exit_with_two() {
    for err in [
        Error::InvalidConfig("bad".to_string()),
        Error::InvalidArgument("bad".to_string()),
        Error::Validation("userId is required".to_string()),
    ] {
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }
}

#[test]
fn runtime_failures_exit_with_four() {
    for err in [
        Error::IdentityUnavailable,
        Error::StorageUnavailable("host_cloud".to_string()),
        Error::Transport("GET /todos returned 500".to_string()),
        Error::LockFailed(PathBuf::from("/tmp/todos.json.lock")),
        Error::OperationFailed("boom".to_string()),
    ] {
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    }
}

#[test]
fn details_carry_structured_context() {
    let err = Error::StorageUnavailable("host_cloud".to_string());
    assert_eq!(
        err.details(),
        Some(serde_json::json!({ "backend": "host_cloud" }))
    );
    assert!(Error::Transport("x".to_string()).details().is_none());
}

#[test]
fn json_error_carries_message_and_code() {
    let err = Error::Validation("todos must be an array".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("todos must be an array"));
}
