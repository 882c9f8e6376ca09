//! Test assertions for the error classes.

use crate::errors::ResponseResult;
use crate::PaymailErrorCode;

/// Assert that a call failed before any I/O: no response travels with the error.
///
/// # Panics
/// Panics if the call succeeded or carried a response.
pub fn assert_precondition<T: std::fmt::Debug>(result: &ResponseResult<T>) {
    match result {
        Ok(response) => panic!("expected a precondition error, got {:?}", response),
        Err(err) => assert!(
            err.response().is_none(),
            "precondition error should not carry a response: {}",
            err
        ),
    }
}

/// Assert that a call failed with a malformed response that is handed back.
///
/// # Panics
/// Panics if the call succeeded, failed with another class, or lost the response.
pub fn assert_malformed<T: std::fmt::Debug>(result: &ResponseResult<T>) {
    match result {
        Ok(response) => panic!("expected a malformed response error, got {:?}", response),
        Err(err) => {
            assert!(
                matches!(
                    err.error.code(),
                    PaymailErrorCode::MalformedResponse
                        | PaymailErrorCode::Serialization
                        | PaymailErrorCode::InvalidScript
                ),
                "expected a malformed response error, got {}",
                err
            );
            assert!(err.response().is_some(), "malformed error lost its response");
        }
    }
}

/// Assert the error code of a failed call.
///
/// # Panics
/// Panics if the call succeeded or failed with a different code.
pub fn assert_error_code<T: std::fmt::Debug>(result: &ResponseResult<T>, code: PaymailErrorCode) {
    match result {
        Ok(response) => panic!("expected error {:?}, got {:?}", code, response),
        Err(err) => assert_eq!(err.error.code(), code, "unexpected error: {}", err),
    }
}
