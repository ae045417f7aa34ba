//! The single request a session sends to the remote service.

use crate::fs::paths::SyncPath;
use crate::manifest::Manifest;
use crate::protocol::encoding::Base64Bytes;
use crate::protocol::Direction;
use indexmap::IndexMap;

/// Protocol step of the initial manifest exchange.
pub const INITIAL_STEP: u32 = 1;

/// Ordered `path -> signature` map, serialized with base64 values.
pub type SignatureMap = IndexMap<SyncPath, Base64Bytes>;

#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub filelist: Manifest,
    pub direction: Direction,
    pub step: u32,
    pub basepath: Option<String>,
    pub signatures: Option<SignatureMap>,
}

impl SyncRequest {
    /// First-step request for a session.
    ///
    /// Signatures are only carried for a push; an empty remote base is omitted.
    pub fn initial(
        filelist: Manifest,
        direction: Direction,
        basepath: Option<String>,
        signatures: SignatureMap,
    ) -> Self {
        let signatures = match direction {
            Direction::Push => Some(signatures),
            Direction::Pull => None,
        };

        Self {
            filelist,
            direction,
            step: INITIAL_STEP,
            basepath: basepath.filter(|b| !b.is_empty()),
            signatures,
        }
    }

    /// Form fields posted to the remote, in a fixed order.
    pub fn form_fields(&self) -> serde_json::Result<Vec<(&'static str, String)>> {
        let mut fields = vec![
            ("filelist", self.filelist.to_json()?),
            ("direction", self.direction.as_wire().to_string()),
            ("step", self.step.to_string()),
        ];

        if let Some(basepath) = &self.basepath {
            fields.push(("basepath", basepath.clone()));
        }

        if let Some(signatures) = &self.signatures {
            fields.push(("signatures", serde_json::to_string(signatures)?));
        }

        Ok(fields)
    }
}
