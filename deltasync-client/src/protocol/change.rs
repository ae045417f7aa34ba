//! Change operations sent by the remote for a pull.
//!
//! Each change arrives as `{"changetype": "newDir" | "newFile" | "patch", ...}`
//! and is decoded once, here, into [`ChangeKind`]. Unknown change types, bad
//! modes and undecodable payloads are rejected before anything is applied.

use crate::fs::paths::SyncPath;
use crate::protocol::encoding::Base64Bytes;
use base64::prelude::*;
use serde::{Deserialize, Deserializer};

/// One instruction from the remote, bound to its target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOperation {
    pub target: SyncPath,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireChange")]
pub enum ChangeKind {
    NewDirectory { mode: u32 },
    NewFile { mode: u32, content: Vec<u8> },
    Patch { mode: u32, delta: Vec<u8> },
}

impl ChangeKind {
    pub fn mode(&self) -> u32 {
        match self {
            ChangeKind::NewDirectory { mode }
            | ChangeKind::NewFile { mode, .. }
            | ChangeKind::Patch { mode, .. } => *mode,
        }
    }

    /// Wire name of the change type.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::NewDirectory { .. } => "newDir",
            ChangeKind::NewFile { .. } => "newFile",
            ChangeKind::Patch { .. } => "patch",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ContentEncoding {
    #[default]
    Text,
    Base64,
}

#[derive(Deserialize)]
#[serde(tag = "changetype")]
enum WireChange {
    #[serde(rename = "newDir")]
    NewDir {
        #[serde(deserialize_with = "deserialize_mode")]
        mode: u32,
    },

    #[serde(rename = "newFile")]
    NewFile {
        #[serde(deserialize_with = "deserialize_mode")]
        mode: u32,
        #[serde(default)]
        content: String,
        #[serde(default)]
        encoding: ContentEncoding,
    },

    #[serde(rename = "patch")]
    Patch {
        #[serde(deserialize_with = "deserialize_mode")]
        mode: u32,
        #[serde(alias = "delta")]
        patch: Base64Bytes,
    },
}

impl TryFrom<WireChange> for ChangeKind {
    type Error = String;

    fn try_from(wire: WireChange) -> Result<Self, Self::Error> {
        Ok(match wire {
            WireChange::NewDir { mode } => ChangeKind::NewDirectory { mode },
            WireChange::NewFile {
                mode,
                content,
                encoding,
            } => {
                let content = match encoding {
                    ContentEncoding::Text => content.into_bytes(),
                    ContentEncoding::Base64 => BASE64_STANDARD
                        .decode(content.trim())
                        .map_err(|e| format!("invalid base64 content: {}", e))?,
                };
                ChangeKind::NewFile { mode, content }
            }
            WireChange::Patch { mode, patch } => ChangeKind::Patch {
                mode,
                delta: patch.into_inner(),
            },
        })
    }
}

/// Accept a mode as an integer (`420`) or an octal string (`"0644"`, `"755"`).
///
/// File type bits (as sent by remotes that forward a raw `st_mode`) are dropped.
fn deserialize_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mode {
        Number(u32),
        Octal(String),
    }

    let mode = match Mode::deserialize(deserializer)? {
        Mode::Number(mode) => mode,
        Mode::Octal(text) => {
            let digits = text.trim().trim_start_matches("0o");
            u32::from_str_radix(digits, 8).map_err(|_| {
                serde::de::Error::custom(format!("invalid octal mode '{}'", text))
            })?
        }
    };

    Ok(mode & 0o7777)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<ChangeKind, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_decode_new_dir() {
        let change = decode(r#"{"changetype":"newDir","mode":493}"#).unwrap();
        assert_eq!(change, ChangeKind::NewDirectory { mode: 0o755 });
        assert_eq!(change.name(), "newDir");
    }

    #[test]
    fn test_decode_new_file_text_and_base64() {
        let text = decode(r#"{"changetype":"newFile","content":"world","mode":420}"#).unwrap();
        assert_eq!(
            text,
            ChangeKind::NewFile {
                mode: 0o644,
                content: b"world".to_vec()
            }
        );

        let binary = decode(
            r#"{"changetype":"newFile","content":"AP8=","encoding":"base64","mode":"0600"}"#,
        )
        .unwrap();
        assert_eq!(
            binary,
            ChangeKind::NewFile {
                mode: 0o600,
                content: vec![0x00, 0xff]
            }
        );
    }

    #[test]
    fn test_decode_patch_with_alias() {
        let patch = decode(r#"{"changetype":"patch","patch":"aGk=","mode":"644"}"#).unwrap();
        let delta = decode(r#"{"changetype":"patch","delta":"aGk=","mode":420}"#).unwrap();

        assert_eq!(patch, delta);
        assert_eq!(
            patch,
            ChangeKind::Patch {
                mode: 0o644,
                delta: b"hi".to_vec()
            }
        );
    }

    #[test]
    fn test_unknown_changetype_is_rejected() {
        assert!(decode(r#"{"changetype":"delete","mode":420}"#).is_err());
        assert!(decode(r#"{"mode":420}"#).is_err());
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        assert!(decode(r#"{"changetype":"newDir","mode":"rwx"}"#).is_err());
        assert!(decode(r#"{"changetype":"newDir"}"#).is_err());
    }

    #[test]
    fn test_file_type_bits_are_dropped() {
        let change = decode(r#"{"changetype":"newDir","mode":16877}"#).unwrap();
        assert_eq!(change.mode(), 0o755);
    }

    #[test]
    fn test_patch_requires_payload() {
        assert!(decode(r#"{"changetype":"patch","mode":420}"#).is_err());
        assert!(decode(r#"{"changetype":"patch","patch":"%%%","mode":420}"#).is_err());
    }
}
