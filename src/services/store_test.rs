use super::*;
use protocol::ErrorCode;

#[test]
fn unavailable_is_retryable() {
    let err = StoreError::Unavailable;
    assert_eq!(err.error_code(), "E_STORE_UNAVAILABLE");
    assert!(err.retryable());
}

#[test]
fn corrupt_row_is_not_retryable() {
    let err = StoreError::Corrupt("bad data".into());
    assert_eq!(err.error_code(), "E_STORE_CORRUPT");
    assert!(!err.retryable());
}

#[test]
fn conflict_names_board_and_sequence() {
    let err = StoreError::Conflict { board_id: BoardId::new("X"), sequence: 7 };
    assert_eq!(err.error_code(), "E_SEQUENCE_CONFLICT");
    assert_eq!(err.to_string(), "sequence 7 already taken on board X");
}

#[test]
fn database_errors_map_to_unavailable() {
    let err = StoreError::from(sqlx::Error::PoolTimedOut);
    assert_eq!(err.error_code(), "E_STORE_UNAVAILABLE");
}
