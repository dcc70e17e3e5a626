//! ysafe Wire Protocol
//!
//! Single responsibility: the protobuf records exchanged with the file service.
//!
//! # Wire Format
//!
//! Every WebSocket binary message carries exactly one record:
//!
//! ```text
//! client -> server   Request  { oneof operation { sign_in, get_meta_from_path, ... } }
//! server -> client   Response { oneof operation { sign_in, get_meta_from_path, ... } }
//! ```
//!
//! Each response payload carries a `Status` and an optional human-readable
//! `message`. Folder metadata embeds a second, nested record: the `Policy`
//! attribute blob (see [`crate::policy`]).
//!
//! The messages are declared directly with `prost` derives so no protoc step
//! is needed at build time.

use prost::Message;

use crate::error::{ClientError, Result};

/// Result status shared by every response payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    ObjectNotFound = 1,
    AlreadyExists = 2,
    Unauthorized = 3,
    InvalidRequest = 4,
    QuotaExceeded = 5,
    InternalError = 6,
}

/// How the server should interpret a path argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PathKind {
    Any = 0,
    Folder = 1,
    File = 2,
}

/// Operations a secondary pin may be granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AllowedPinOp {
    Read = 0,
    Write = 1,
    Delete = 2,
    List = 3,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(oneof = "request::Operation", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub operation: ::core::option::Option<request::Operation>,
}

pub mod request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Operation {
        #[prost(message, tag = "1")]
        SignIn(super::SignIn),
        #[prost(message, tag = "2")]
        GetMetaFromPath(super::GetMetaFromPath),
        #[prost(message, tag = "3")]
        CreateFolder(super::CreateFolder),
        #[prost(message, tag = "4")]
        RemoveFolder(super::RemoveFolder),
        #[prost(message, tag = "5")]
        AddPin(super::AddPin),
        #[prost(message, tag = "6")]
        DeletePin(super::DeletePin),
        #[prost(message, tag = "7")]
        UpdatePinOps(super::UpdatePinOps),
    }

    impl Operation {
        pub fn name(&self) -> &'static str {
            match self {
                Operation::SignIn(_) => "sign_in",
                Operation::GetMetaFromPath(_) => "get_meta_from_path",
                Operation::CreateFolder(_) => "create_folder",
                Operation::RemoveFolder(_) => "remove_folder",
                Operation::AddPin(_) => "add_pin",
                Operation::DeletePin(_) => "delete_pin",
                Operation::UpdatePinOps(_) => "update_pin_ops",
            }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignIn {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, optional, tag = "2")]
    pub pin: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetMetaFromPath {
    #[prost(string, tag = "1")]
    pub path: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub trashed: bool,
    #[prost(enumeration = "PathKind", tag = "3")]
    pub type_of_path: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateFolder {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub parent_path: ::prost::alloc::string::String,
    #[prost(enumeration = "PathKind", tag = "3")]
    pub type_of_path: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoveFolder {
    #[prost(string, tag = "1")]
    pub folder_full_path: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub is_perm: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddPin {
    #[prost(string, tag = "1")]
    pub email: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub pin: ::prost::alloc::string::String,
    #[prost(enumeration = "AllowedPinOp", repeated, tag = "3")]
    pub allowed_ops: ::prost::alloc::vec::Vec<i32>,
    #[prost(string, optional, tag = "4")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint64, tag = "5")]
    pub ttl: u64,
    #[prost(bytes = "vec", repeated, tag = "6")]
    pub allowed_objects: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeletePin {
    #[prost(string, tag = "1")]
    pub email: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub id_sent_to_client: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdatePinOps {
    #[prost(string, tag = "1")]
    pub email: ::prost::alloc::string::String,
    #[prost(enumeration = "AllowedPinOp", repeated, tag = "2")]
    pub allowed_ops: ::prost::alloc::vec::Vec<i32>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub allowed_objects: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes = "vec", tag = "4")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "5")]
    pub pin_name: ::prost::alloc::string::String,
}

/// One named attribute value inside a [`Policy`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyValMapping {
    #[prost(string, tag = "1")]
    pub attribute: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

/// The folder policy attribute blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Policy {
    #[prost(message, repeated, tag = "1")]
    pub attr_to_value: ::prost::alloc::vec::Vec<KeyValMapping>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(oneof = "response::Operation", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub operation: ::core::option::Option<response::Operation>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Operation {
        #[prost(message, tag = "1")]
        SignIn(super::SignInResult),
        #[prost(message, tag = "2")]
        GetMetaFromPath(super::GetMetaFromPathResult),
        #[prost(message, tag = "3")]
        CreateFolder(super::StatusResult),
        #[prost(message, tag = "4")]
        RemoveFolder(super::StatusResult),
        #[prost(message, tag = "5")]
        AddPin(super::AddPinResult),
        #[prost(message, tag = "6")]
        DeletePin(super::StatusResult),
        #[prost(message, tag = "7")]
        UpdatePinOps(super::StatusResult),
    }

    impl Operation {
        pub fn name(&self) -> &'static str {
            match self {
                Operation::SignIn(_) => "sign_in",
                Operation::GetMetaFromPath(_) => "get_meta_from_path",
                Operation::CreateFolder(_) => "create_folder",
                Operation::RemoveFolder(_) => "remove_folder",
                Operation::AddPin(_) => "add_pin",
                Operation::DeletePin(_) => "delete_pin",
                Operation::UpdatePinOps(_) => "update_pin_ops",
            }
        }
    }
}

/// Reply payload for operations that only report a status.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusResult {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignInResult {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, tag = "3")]
    pub email: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetMetaFromPathResult {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "3")]
    pub meta: ::core::option::Option<ObjectMeta>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddPinResult {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bytes = "vec", tag = "3")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub id_to_client: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectMeta {
    #[prost(oneof = "object_meta::Kind", tags = "1, 2")]
    pub kind: ::core::option::Option<object_meta::Kind>,
}

pub mod object_meta {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        FolderMeta(super::FolderMeta),
        #[prost(message, tag = "2")]
        FileMeta(super::FileMeta),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FolderMeta {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Serialized [`Policy`] record.
    #[prost(bytes = "vec", tag = "2")]
    pub policy: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileMeta {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub size: u64,
}

// =============================================================================
// Framing helpers
// =============================================================================

impl Request {
    pub fn new(operation: request::Operation) -> Self {
        Self {
            operation: Some(operation),
        }
    }

    /// Name of the carried operation, for logging.
    pub fn operation_name(&self) -> &'static str {
        self.operation.as_ref().map(|op| op.name()).unwrap_or("none")
    }

    /// Encode into the bytes of one binary frame.
    pub fn to_frame(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

impl Response {
    pub fn new(operation: response::Operation) -> Self {
        Self {
            operation: Some(operation),
        }
    }

    pub fn operation_name(&self) -> &'static str {
        self.operation.as_ref().map(|op| op.name()).unwrap_or("none")
    }

    /// Decode one inbound frame.
    ///
    /// A frame that decodes but carries no operation is a protocol violation
    /// and is reported as [`ClientError::EmptyResponse`].
    pub fn from_frame(frame: &[u8]) -> Result<Self> {
        let response = Response::decode(frame)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode response: {}", e)))?;
        if response.operation.is_none() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(response)
    }
}

impl StatusResult {
    /// Turn a non-success status into [`ClientError::Rejected`].
    pub fn check(&self, operation: &'static str) -> Result<()> {
        check_status(operation, self.status, self.message.as_deref())
    }
}

/// Shared success check for every result payload.
///
/// Takes the raw wire value: the generated getters fall back to the default
/// variant (`Success`) for unknown values, which must never count as success.
pub fn check_status(operation: &'static str, raw_status: i32, message: Option<&str>) -> Result<()> {
    if raw_status == Status::Success as i32 {
        Ok(())
    } else {
        Err(status_error(operation, raw_status, message))
    }
}

/// Error for a status already known not to be `Success`.
pub fn status_error(operation: &'static str, raw_status: i32, message: Option<&str>) -> ClientError {
    match Status::try_from(raw_status) {
        Ok(status) => ClientError::Rejected {
            operation,
            status,
            message: message.map(str::to_string),
        },
        Err(_) => ClientError::Protocol(format!(
            "{} returned unknown status {}",
            operation, raw_status
        )),
    }
}

/// Error for a reply whose operation does not match the request.
pub fn unexpected(expected: &'static str, got: Option<response::Operation>) -> ClientError {
    ClientError::UnexpectedOperation {
        expected,
        actual: got.as_ref().map(|op| op.name()).unwrap_or("none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_frame_decodes_back() {
        let request = Request::new(request::Operation::GetMetaFromPath(GetMetaFromPath {
            path: "/proj_abc".to_string(),
            trashed: false,
            type_of_path: PathKind::Any as i32,
        }));

        let decoded = Request::decode(request.to_frame().as_slice()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.operation_name(), "get_meta_from_path");
    }

    #[test]
    fn test_empty_frame_is_empty_response() {
        let err = Response::from_frame(&[]).unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse));
    }

    #[test]
    fn test_garbage_frame_is_protocol_error() {
        let err = Response::from_frame(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn test_unknown_status_is_not_success() {
        let result = StatusResult {
            status: 99,
            message: None,
        };
        assert!(matches!(
            result.check("remove_folder"),
            Err(ClientError::Protocol(_))
        ));
    }

    #[test]
    fn test_check_status_carries_message() {
        let result = StatusResult {
            status: Status::Unauthorized as i32,
            message: Some("bad pin".to_string()),
        };
        match result.check("delete_pin") {
            Err(ClientError::Rejected {
                operation,
                status,
                message,
            }) => {
                assert_eq!(operation, "delete_pin");
                assert_eq!(status, Status::Unauthorized);
                assert_eq!(message.as_deref(), Some("bad pin"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }
}
