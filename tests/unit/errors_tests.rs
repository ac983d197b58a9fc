/*!
 * Tests for the error taxonomy
 */

use rowlate::errors::{AppError, ProviderError, StoreError, TranslationError};

#[test]
fn test_needsOperator_shouldOnlyHoldForApiErrors() {
    let api = ProviderError::ApiError {
        status_code: 403,
        message: "Permission denied".to_string(),
    };
    assert!(api.needs_operator());
    assert!(!ProviderError::RequestFailed("timeout".to_string()).needs_operator());
    assert!(!ProviderError::ParseError("no candidates".to_string()).needs_operator());
}

#[test]
fn test_isAbort_shouldOnlyHoldForOperatorAbort() {
    assert!(AppError::from(TranslationError::Aborted).is_abort());
    assert!(!AppError::Persistence("locked".to_string()).is_abort());
    assert!(!AppError::from(TranslationError::Prompt("stdin closed".to_string())).is_abort());
}

#[test]
fn test_from_storeError_shouldWrap() {
    let error: AppError = StoreError::InvalidIdentifier("a-b".to_string()).into();
    assert!(matches!(error, AppError::Store(StoreError::InvalidIdentifier(_))));
    assert!(error.to_string().contains("a-b"));
}
