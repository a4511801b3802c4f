use std::time::Duration;

use precis::{FailureClass, PrecisError};

#[test]
fn classification_table() {
    let cases = [
        (
            PrecisError::RateLimited { retry_after: None },
            Some(FailureClass::RateLimited),
        ),
        (
            PrecisError::Api {
                status: 503,
                message: "unavailable".into(),
            },
            Some(FailureClass::RemoteApi),
        ),
        (
            PrecisError::Http("connection reset".into()),
            Some(FailureClass::RemoteApi),
        ),
        (
            PrecisError::Timeout(Duration::from_secs(8)),
            Some(FailureClass::Timeout),
        ),
        (
            PrecisError::InvalidResponse("empty".into()),
            Some(FailureClass::InvalidResponse),
        ),
        (
            PrecisError::Api {
                status: 400,
                message: "bad request".into(),
            },
            Some(FailureClass::Rejected),
        ),
        (PrecisError::AuthenticationFailed, Some(FailureClass::Rejected)),
        (PrecisError::QuotaExceeded, None),
        (PrecisError::Store("down".into()), None),
        (PrecisError::InvalidInput("blank".into()), None),
        (PrecisError::Configuration("missing".into()), None),
    ];
    for (err, expected) in cases {
        assert_eq!(err.class(), expected, "{err}");
    }
}

#[test]
fn only_throttling_and_server_errors_retry() {
    assert!(PrecisError::RateLimited { retry_after: None }.is_retryable());
    assert!(
        PrecisError::Api {
            status: 500,
            message: String::new()
        }
        .is_retryable()
    );
    assert!(PrecisError::Http("reset".into()).is_retryable());

    assert!(!PrecisError::Timeout(Duration::from_secs(1)).is_retryable());
    assert!(!PrecisError::InvalidResponse("short".into()).is_retryable());
    assert!(!PrecisError::AuthenticationFailed.is_retryable());
    assert!(!PrecisError::QuotaExceeded.is_retryable());
    assert!(!PrecisError::Store("down".into()).is_retryable());
}

#[test]
fn retry_after_only_on_rate_limit() {
    let hint = Duration::from_secs(7);
    assert_eq!(
        PrecisError::RateLimited {
            retry_after: Some(hint)
        }
        .retry_after(),
        Some(hint)
    );
    assert_eq!(PrecisError::Http("x".into()).retry_after(), None);
}

#[test]
fn display_messages() {
    assert_eq!(PrecisError::QuotaExceeded.to_string(), "quota exceeded");
    assert_eq!(
        PrecisError::Api {
            status: 502,
            message: "bad gateway".into()
        }
        .to_string(),
        "API error (502): bad gateway"
    );
    assert_eq!(FailureClass::RemoteApi.to_string(), "remote_api");
}

#[test]
fn json_errors_convert() {
    let err: PrecisError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert_eq!(err.class(), Some(FailureClass::InvalidResponse));
}
