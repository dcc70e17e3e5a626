//! Folder Policy Attribute Codec
//!
//! Translates the typed [`FolderPolicy`] to and from the generic attribute
//! list carried in [`Policy`] (the blob nested inside `FolderMeta.policy`).
//!
//! # Value Encoding
//!
//! | Attribute                | Type   | Bytes                        |
//! |--------------------------|--------|------------------------------|
//! | `max_size`               | u64    | 8, big-endian                |
//! | `max_file_size`          | u64    | 8, big-endian                |
//! | `max_file_versions`      | u64    | 8, big-endian                |
//! | `remove_older_versions`  | bool   | 1, `0x01` true / `0x00` false |
//! | `default_ttl_for_files`  | u64    | 8, big-endian (seconds)      |
//!
//! The same scheme is used in both directions. The attribute set is sparse:
//! a missing name means "unset", never zero. When a name appears more than
//! once the first occurrence wins.

use prost::Message;

use crate::error::{ClientError, Result};
use crate::protocol::{KeyValMapping, Policy};

/// One of the known policy attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    MaxSize,
    MaxFileSize,
    MaxFileVersions,
    RemoveOlderVersions,
    DefaultTtlForFiles,
}

impl PolicyField {
    /// Canonical emission order.
    pub const ALL: [PolicyField; 5] = [
        PolicyField::MaxSize,
        PolicyField::MaxFileSize,
        PolicyField::MaxFileVersions,
        PolicyField::RemoveOlderVersions,
        PolicyField::DefaultTtlForFiles,
    ];

    /// Wire name of the attribute.
    pub fn name(self) -> &'static str {
        match self {
            PolicyField::MaxSize => "max_size",
            PolicyField::MaxFileSize => "max_file_size",
            PolicyField::MaxFileVersions => "max_file_versions",
            PolicyField::RemoveOlderVersions => "remove_older_versions",
            PolicyField::DefaultTtlForFiles => "default_ttl_for_files",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Typed view of a folder's policy. `None` means the attribute is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPolicy {
    /// Maximum size of the folder including all files and their versions
    pub max_size: Option<u64>,
    /// Maximum size of a single uploaded file
    pub max_file_size: Option<u64>,
    /// Number of previous versions kept per file
    pub max_file_versions: Option<u64>,
    /// Prune older versions as new ones are uploaded
    pub remove_older_versions: Option<bool>,
    /// Seconds after the latest change before a file is deleted
    pub default_ttl_for_files: Option<u64>,
}

impl FolderPolicy {
    /// Encode the fields listed in `changed` that have a value.
    ///
    /// Unset fields are omitted entirely; there is no null marker on the wire.
    pub fn encode_changes(&self, changed: &[PolicyField]) -> Vec<KeyValMapping> {
        PolicyField::ALL
            .into_iter()
            .filter(|field| changed.contains(field))
            .filter_map(|field| {
                self.encode_field(field).map(|value| KeyValMapping {
                    attribute: field.name().to_string(),
                    value,
                })
            })
            .collect()
    }

    /// Encode every field that has a value.
    pub fn encode_all(&self) -> Vec<KeyValMapping> {
        self.encode_changes(&PolicyField::ALL)
    }

    /// Decode an attribute list. Unknown names are ignored.
    pub fn decode(attributes: &[KeyValMapping]) -> Result<Self> {
        let mut policy = FolderPolicy::default();
        let mut seen: Vec<PolicyField> = Vec::with_capacity(PolicyField::ALL.len());

        for attr in attributes {
            let Some(field) = PolicyField::from_name(&attr.attribute) else {
                continue;
            };
            if seen.contains(&field) {
                continue;
            }
            seen.push(field);

            match field {
                PolicyField::MaxSize => policy.max_size = Some(decode_u64(field, &attr.value)?),
                PolicyField::MaxFileSize => {
                    policy.max_file_size = Some(decode_u64(field, &attr.value)?)
                }
                PolicyField::MaxFileVersions => {
                    policy.max_file_versions = Some(decode_u64(field, &attr.value)?)
                }
                PolicyField::RemoveOlderVersions => {
                    policy.remove_older_versions = Some(decode_bool(field, &attr.value)?)
                }
                PolicyField::DefaultTtlForFiles => {
                    policy.default_ttl_for_files = Some(decode_u64(field, &attr.value)?)
                }
            }
        }

        Ok(policy)
    }

    /// Fields whose value differs from `previous`.
    pub fn changed_fields(&self, previous: &FolderPolicy) -> Vec<PolicyField> {
        PolicyField::ALL
            .into_iter()
            .filter(|&field| self.encode_field(field) != previous.encode_field(field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == FolderPolicy::default()
    }

    fn encode_field(&self, field: PolicyField) -> Option<Vec<u8>> {
        match field {
            PolicyField::MaxSize => self.max_size.map(encode_u64),
            PolicyField::MaxFileSize => self.max_file_size.map(encode_u64),
            PolicyField::MaxFileVersions => self.max_file_versions.map(encode_u64),
            PolicyField::RemoveOlderVersions => self.remove_older_versions.map(encode_bool),
            PolicyField::DefaultTtlForFiles => self.default_ttl_for_files.map(encode_u64),
        }
    }
}

impl Policy {
    pub fn from_attributes(attr_to_value: Vec<KeyValMapping>) -> Self {
        Self { attr_to_value }
    }

    /// Serialize for embedding in folder metadata.
    pub fn to_blob(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Parse the nested record from folder metadata.
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        Policy::decode(blob)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode policy blob: {}", e)))
    }
}

fn encode_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn encode_bool(value: bool) -> Vec<u8> {
    vec![u8::from(value)]
}

fn decode_u64(field: PolicyField, bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| ClientError::CorruptData {
        attribute: field.name().to_string(),
        reason: format!("expected 8 bytes, got {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(array))
}

fn decode_bool(field: PolicyField, bytes: &[u8]) -> Result<bool> {
    match bytes {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(ClientError::CorruptData {
            attribute: field.name().to_string(),
            reason: format!("expected a single 0x00 or 0x01 byte, got {:?}", bytes),
        }),
    }
}
