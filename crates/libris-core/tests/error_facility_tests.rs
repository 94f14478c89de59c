use libris_core::errors::{LbError, LbErrorKind, LibrisError};

#[test]
fn test_sort_violation_maps_to_validation() {
    let err: LbError = LibrisError::InvalidSort {
        value: "price".to_string(),
    }
    .into();

    assert_eq!(err.kind(), LbErrorKind::Validation);
    assert_eq!(err.code(), "ERR_VALIDATION");
    assert_eq!(err.field(), Some("sort"));
    assert!(err.kind().is_client_error());
}

#[test]
fn test_every_input_violation_is_a_client_error() {
    let violations = vec![
        LibrisError::InvalidDirection {
            value: "up".to_string(),
        },
        LibrisError::LimitOutOfRange {
            value: 0,
            min: 1,
            max: 100,
        },
        LibrisError::NegativeOffset { value: -1 },
        LibrisError::MissingField {
            field: "title".to_string(),
        },
        LibrisError::EmptyTitle,
        LibrisError::NegativePageCount { value: -3 },
        LibrisError::InvalidDate {
            value: "tomorrow".to_string(),
        },
        LibrisError::EmptyAuthorList,
        LibrisError::BlankAuthorName { index: 0 },
    ];

    for violation in violations {
        let field = violation.field().to_string();
        let err: LbError = violation.into();
        assert_eq!(err.kind(), LbErrorKind::Validation);
        assert_eq!(err.field(), Some(field.as_str()));
        assert!(!err.message().is_empty());
    }
}

#[test]
fn test_unknown_dialect_is_configuration_error() {
    let err: LbError = LibrisError::UnsupportedDialect {
        tag: "oracle".to_string(),
    }
    .into();

    assert_eq!(err.kind(), LbErrorKind::Configuration);
    assert!(!err.kind().is_client_error());
    assert!(err.to_string().contains("oracle"));
}

#[test]
fn test_source_chain_is_exposed_through_std_error() {
    use std::error::Error;

    let cause = LbError::new(LbErrorKind::Persistence).with_message("UNIQUE constraint failed");
    let err = LbError::new(LbErrorKind::Transaction)
        .with_op("commit")
        .with_source(cause);

    let source = err.source().expect("source should be exposed");
    assert!(source.to_string().contains("UNIQUE constraint failed"));
}

#[test]
fn test_rollback_failure_keeps_original_cause() {
    let cause = LbError::new(LbErrorKind::Timeout).with_message("statement deadline exceeded");
    let rollback = LbError::new(LbErrorKind::Persistence).with_message("disk I/O error");

    let err = LbError::rollback_failed("create_book", cause, rollback);

    assert_eq!(err.kind(), LbErrorKind::Transaction);
    assert_eq!(err.op(), Some("create_book"));
    assert_eq!(
        err.source_error().map(LbError::kind),
        Some(LbErrorKind::Timeout)
    );
    assert_eq!(
        err.rollback_error().map(LbError::kind),
        Some(LbErrorKind::Persistence)
    );
}
