//! Folder Operations
//!
//! Folder lifecycle and policy access built on a [`Session`].
//!
//! Every operation starts by looking the folder up with `GetMetaFromPath`.
//! Only `ObjectNotFound` from that lookup makes creation safe; any other
//! non-success status is a hard failure.

use tracing::{debug, info};

use crate::error::ClientError;
use crate::policy::{FolderPolicy, PolicyField};
use crate::protocol::{
    object_meta, request, response, status_error, unexpected, CreateFolder, FolderMeta,
    GetMetaFromPath, GetMetaFromPathResult, PathKind, Policy, RemoveFolder, Request, Status,
};
use crate::rpc::Session;

/// Folder operations on one session.
pub struct Folders<'a> {
    session: &'a Session,
}

impl<'a> Folders<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Look up `/name`. The returned result may carry any status.
    pub async fn stat(&self, name: &str) -> Result<GetMetaFromPathResult, ClientError> {
        let request = Request::new(request::Operation::GetMetaFromPath(GetMetaFromPath {
            path: folder_path(name),
            trashed: false,
            type_of_path: PathKind::Any as i32,
        }));

        match self.session.send(request).await?.operation {
            Some(response::Operation::GetMetaFromPath(result)) => {
                debug!(name = %name, status = result.status, "Folder lookup");
                Ok(result)
            }
            other => Err(unexpected("get_meta_from_path", other)),
        }
    }

    /// Create `/name` under the root folder.
    ///
    /// # Errors
    /// - `AlreadyExists` if the lookup succeeds
    /// - `Rejected` if the lookup fails with anything but `ObjectNotFound`,
    ///   or if the server refuses the creation
    pub async fn create(&self, name: &str) -> Result<(), ClientError> {
        let lookup = self.stat(name).await?;

        match Status::try_from(lookup.status) {
            Ok(Status::Success) => return Err(ClientError::AlreadyExists(name.to_string())),
            Ok(Status::ObjectNotFound) => {}
            _ => return Err(lookup_error(&lookup)),
        }

        let request = Request::new(request::Operation::CreateFolder(CreateFolder {
            name: name.to_string(),
            parent_path: "/".to_string(),
            type_of_path: PathKind::Folder as i32,
        }));

        match self.session.send(request).await?.operation {
            Some(response::Operation::CreateFolder(result)) => result.check("create_folder")?,
            other => return Err(unexpected("create_folder", other)),
        }

        info!(name = %name, "Folder created");
        Ok(())
    }

    /// Move `/name` to the trash.
    pub async fn remove(&self, name: &str) -> Result<(), ClientError> {
        self.require_existing(name).await?;

        let request = Request::new(request::Operation::RemoveFolder(RemoveFolder {
            folder_full_path: folder_path(name),
            is_perm: false,
        }));

        match self.session.send(request).await?.operation {
            Some(response::Operation::RemoveFolder(result)) => result.check("remove_folder")?,
            other => return Err(unexpected("remove_folder", other)),
        }

        info!(name = %name, "Folder removed");
        Ok(())
    }

    /// Read and decode the folder's policy attributes.
    pub async fn policy(&self, name: &str) -> Result<FolderPolicy, ClientError> {
        let lookup = self.require_existing(name).await?;
        let meta = folder_meta(name, &lookup)?;
        let policy = Policy::from_blob(&meta.policy)?;
        FolderPolicy::decode(&policy.attr_to_value)
    }

    /// Encode the `changed` fields of `desired` for an existing folder.
    ///
    /// No request in the protocol carries a policy update yet, so the encoded
    /// record is returned to the caller rather than sent.
    pub async fn prepare_policy_update(
        &self,
        name: &str,
        desired: &FolderPolicy,
        changed: &[PolicyField],
    ) -> Result<Policy, ClientError> {
        self.require_existing(name).await?;
        Ok(Policy::from_attributes(desired.encode_changes(changed)))
    }

    async fn require_existing(&self, name: &str) -> Result<GetMetaFromPathResult, ClientError> {
        let lookup = self.stat(name).await?;
        match Status::try_from(lookup.status) {
            Ok(Status::Success) => Ok(lookup),
            Ok(Status::ObjectNotFound) => Err(ClientError::NotFound(name.to_string())),
            _ => Err(lookup_error(&lookup)),
        }
    }
}

impl Session {
    pub fn folders(&self) -> Folders<'_> {
        Folders::new(self)
    }
}

fn folder_path(name: &str) -> String {
    format!("/{}", name)
}

/// A lookup failed with something other than `Success` or `ObjectNotFound`.
fn lookup_error(lookup: &GetMetaFromPathResult) -> ClientError {
    status_error("get_meta_from_path", lookup.status, lookup.message.as_deref())
}

fn folder_meta<'r>(name: &str, lookup: &'r GetMetaFromPathResult) -> Result<&'r FolderMeta, ClientError> {
    match lookup.meta.as_ref().and_then(|m| m.kind.as_ref()) {
        Some(object_meta::Kind::FolderMeta(meta)) => Ok(meta),
        _ => Err(ClientError::NotAFolder(name.to_string())),
    }
}
