//! Parsing of the remote's answer.

use crate::fs::paths::SyncPath;
use crate::protocol::change::{ChangeKind, ChangeOperation};
use crate::protocol::Direction;
use crate::utils::{ProtocolError, Result, SyncError};
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Literal body a remote sends when it failed.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Parse a response body into the ordered list of changes to apply.
///
/// A push response carries nothing to apply, so it yields an empty list once
/// it is known not to be an error.
pub fn parse_response(body: &[u8], direction: Direction) -> Result<Vec<ChangeOperation>> {
    let value: Value = serde_json::from_slice(body).map_err(ProtocolError::Unparsable)?;

    let object = match value {
        Value::String(s) if s == ERROR_SENTINEL => {
            return Err(SyncError::Remote("remote reported an error".to_string()));
        }
        Value::Object(object) => object,
        _ => return Err(ProtocolError::NotStructured.into()),
    };

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(SyncError::Remote(message));
    }

    match direction {
        Direction::Push => Ok(Vec::new()),
        Direction::Pull => match object.get("changes") {
            None | Some(Value::Null) => Err(ProtocolError::MissingChanges.into()),
            Some(changes) => Ok(decode_changes(changes)?),
        },
    }
}

/// Decode `changes`, given either as one object keyed by path or as a list of
/// such objects. Document order is application order.
fn decode_changes(changes: &Value) -> std::result::Result<Vec<ChangeOperation>, ProtocolError> {
    let mut operations = Vec::new();
    match changes {
        Value::Object(keyed) => decode_keyed(keyed, &mut operations)?,
        Value::Array(items) => {
            for item in items {
                let Value::Object(keyed) = item else {
                    return Err(invalid("each entry of 'changes' must be an object"));
                };
                decode_keyed(keyed, &mut operations)?;
            }
        }
        _ => return Err(invalid("'changes' must be an object or a list")),
    }
    Ok(operations)
}

fn decode_keyed(
    keyed: &Map<String, Value>,
    operations: &mut Vec<ChangeOperation>,
) -> std::result::Result<(), ProtocolError> {
    for (path, change) in keyed {
        let target = SyncPath::parse(path).map_err(|e| invalid(&e.to_string()))?;
        let kind =
            ChangeKind::deserialize(change).map_err(|e| invalid(&format!("{}: {}", target, e)))?;
        operations.push(ChangeOperation { target, kind });
    }
    Ok(())
}

fn invalid(message: &str) -> ProtocolError {
    ProtocolError::InvalidChange(serde_json::Error::custom(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(body: &str) -> Result<Vec<ChangeOperation>> {
        parse_response(body.as_bytes(), Direction::Pull)
    }

    #[test]
    fn test_error_sentinel_is_remote_error() {
        assert!(matches!(pull("\"ERROR\""), Err(SyncError::Remote(_))));
        assert!(matches!(
            parse_response(b"\"ERROR\"", Direction::Push),
            Err(SyncError::Remote(_))
        ));
    }

    #[test]
    fn test_error_object_is_remote_error() {
        let err = pull(r#"{"error":"base path not configured"}"#).unwrap_err();
        match err {
            SyncError::Remote(message) => assert_eq!(message, "base path not configured"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparsable_and_unstructured() {
        assert!(matches!(
            pull("<html>500</html>"),
            Err(SyncError::Protocol(ProtocolError::Unparsable(_)))
        ));
        assert!(matches!(
            pull("\"OK\""),
            Err(SyncError::Protocol(ProtocolError::NotStructured))
        ));
        assert!(matches!(
            pull("[1, 2]"),
            Err(SyncError::Protocol(ProtocolError::NotStructured))
        ));
    }

    #[test]
    fn test_missing_changes_on_pull() {
        assert!(matches!(
            pull(r#"{"status":"ok"}"#),
            Err(SyncError::Protocol(ProtocolError::MissingChanges))
        ));
        assert!(matches!(
            pull(r#"{"changes":null}"#),
            Err(SyncError::Protocol(ProtocolError::MissingChanges))
        ));
    }

    #[test]
    fn test_push_ignores_changes() {
        let ops = parse_response(br#"{"status":"ok"}"#, Direction::Push).unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_keyed_changes_keep_document_order() {
        let ops = pull(
            r#"{"changes":{
                "/z":{"changetype":"newDir","mode":493},
                "/z/b.txt":{"changetype":"newFile","content":"world","mode":420},
                "/a.txt":{"changetype":"patch","patch":"aGk=","mode":420}
            }}"#,
        )
        .unwrap();

        let targets: Vec<String> = ops.iter().map(|op| op.target.to_string()).collect();
        assert_eq!(targets, vec!["/z", "/z/b.txt", "/a.txt"]);
        assert_eq!(ops[0].kind, ChangeKind::NewDirectory { mode: 0o755 });
    }

    #[test]
    fn test_listed_changes() {
        let ops = pull(
            r#"{"changes":[{"/sub/b.txt":{"changetype":"newFile","content":"world","mode":420}}]}"#,
        )
        .unwrap();

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].target.to_string(), "/sub/b.txt");
        assert_eq!(
            ops[0].kind,
            ChangeKind::NewFile {
                mode: 0o644,
                content: b"world".to_vec()
            }
        );
    }

    #[test]
    fn test_empty_changes() {
        assert!(pull(r#"{"changes":[]}"#).unwrap().is_empty());
        assert!(pull(r#"{"changes":{}}"#).unwrap().is_empty());
    }

    #[test]
    fn test_bad_change_rejects_whole_response() {
        let err = pull(
            r#"{"changes":{
                "/ok":{"changetype":"newDir","mode":493},
                "/bad":{"changetype":"symlink","mode":420}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Protocol(ProtocolError::InvalidChange(_))
        ));
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn test_escaping_path_is_rejected() {
        let err = pull(r#"{"changes":{"/../outside":{"changetype":"newDir","mode":493}}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Protocol(ProtocolError::InvalidChange(_))
        ));
    }
}
