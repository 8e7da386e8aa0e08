// Exit codes and JSON envelopes seen by scripts driving the CLI

use caucus::io::{ExitCode, JsonResponse};
use caucus::{AnalysisError, CaucusError, SourceError, StorageError};

#[test]
fn verify_exit_codes_are_unix_compliant() {
    // 126-255 are reserved by shells for special meanings
    let codes = [
        (ExitCode::Success, 0),
        (ExitCode::GeneralError, 1),
        (ExitCode::NotFound, 3),
        (ExitCode::AnalysisRejected, 4),
        (ExitCode::IoError, 5),
        (ExitCode::ConfigError, 6),
        (ExitCode::StoreCorrupted, 7),
        (ExitCode::Busy, 9),
    ];

    for (code, expected) in codes {
        let value: i32 = code.into();
        assert_eq!(value, expected, "{}", code.description());
        assert!(value < 126);
    }
}

#[test]
fn verify_every_error_maps_to_a_distinct_failure() {
    let cases = [
        (
            CaucusError::InputUnavailable(SourceError::Read {
                path: "votes.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            }),
            ExitCode::IoError,
        ),
        (
            CaucusError::Analysis(AnalysisError::InvalidClusterCount(0)),
            ExitCode::AnalysisRejected,
        ),
        (
            CaucusError::PersistenceFailure(StorageError::Serialization("disk".to_string())),
            ExitCode::IoError,
        ),
        (CaucusError::RefreshInProgress, ExitCode::Busy),
        (
            CaucusError::Config {
                reason: "clustering.k must be at least 1".to_string(),
            },
            ExitCode::ConfigError,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(ExitCode::from_error(&error), expected, "{error}");
        assert!(!ExitCode::from_error(&error).is_success());

        let response = JsonResponse::from_error(&error);
        assert_eq!(response.status, "error");
        assert_eq!(response.code, error.status_code());
        assert_eq!(response.exit_code, expected as u8);
    }
}

#[test]
fn verify_json_envelope_shape() {
    let response = JsonResponse::from_error(&CaucusError::RefreshInProgress);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "REFRESH_IN_PROGRESS");
    assert_eq!(json["exit_code"], 9);
    assert!(json["error"]["suggestions"].is_array());
    assert!(json.get("data").is_none());
}
