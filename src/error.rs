//! Error types for the storage collaborator and the sample workflows.

use std::path::PathBuf;

use thiserror::Error;

/// Azure Storage error codes this sample can run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // General errors
    AuthenticationFailed,
    AuthorizationFailure,
    InternalError,
    InvalidHeaderValue,
    InvalidInput,
    InvalidRange,
    InvalidResourceName,
    OperationTimedOut,
    OutOfRangeInput,
    RequestBodyTooLarge,
    ResourceNotFound,
    ServerBusy,

    // Blob-specific errors
    BlobAlreadyExists,
    BlobNotFound,
    BlockCountExceedsLimit,
    ContainerAlreadyExists,
    ContainerBeingDeleted,
    ContainerNotFound,
    InvalidBlobOrBlock,
    InvalidBlobType,
    InvalidBlockId,
    InvalidBlockList,
    InvalidPageRange,
    MaxBlobSizeConditionNotMet,
    UnsupportedBlobType,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthenticationFailed => "AuthenticationFailed",
            ErrorCode::AuthorizationFailure => "AuthorizationFailure",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::InvalidHeaderValue => "InvalidHeaderValue",
            ErrorCode::InvalidInput => "InvalidInput",
            ErrorCode::InvalidRange => "InvalidRange",
            ErrorCode::InvalidResourceName => "InvalidResourceName",
            ErrorCode::OperationTimedOut => "OperationTimedOut",
            ErrorCode::OutOfRangeInput => "OutOfRangeInput",
            ErrorCode::RequestBodyTooLarge => "RequestBodyTooLarge",
            ErrorCode::ResourceNotFound => "ResourceNotFound",
            ErrorCode::ServerBusy => "ServerBusy",
            ErrorCode::BlobAlreadyExists => "BlobAlreadyExists",
            ErrorCode::BlobNotFound => "BlobNotFound",
            ErrorCode::BlockCountExceedsLimit => "BlockCountExceedsLimit",
            ErrorCode::ContainerAlreadyExists => "ContainerAlreadyExists",
            ErrorCode::ContainerBeingDeleted => "ContainerBeingDeleted",
            ErrorCode::ContainerNotFound => "ContainerNotFound",
            ErrorCode::InvalidBlobOrBlock => "InvalidBlobOrBlock",
            ErrorCode::InvalidBlobType => "InvalidBlobType",
            ErrorCode::InvalidBlockId => "InvalidBlockId",
            ErrorCode::InvalidBlockList => "InvalidBlockList",
            ErrorCode::InvalidPageRange => "InvalidPageRange",
            ErrorCode::MaxBlobSizeConditionNotMet => "MaxBlobSizeConditionNotMet",
            ErrorCode::UnsupportedBlobType => "UnsupportedBlobType",
        }
    }

    /// Parses the `x-ms-error-code` value returned by the service.
    pub fn from_service_code(code: &str) -> Option<Self> {
        let code = match code {
            "AuthenticationFailed" => ErrorCode::AuthenticationFailed,
            "AuthorizationFailure" => ErrorCode::AuthorizationFailure,
            "InternalError" => ErrorCode::InternalError,
            "InvalidHeaderValue" => ErrorCode::InvalidHeaderValue,
            "InvalidInput" => ErrorCode::InvalidInput,
            "InvalidRange" => ErrorCode::InvalidRange,
            "InvalidResourceName" => ErrorCode::InvalidResourceName,
            "OperationTimedOut" => ErrorCode::OperationTimedOut,
            "OutOfRangeInput" => ErrorCode::OutOfRangeInput,
            "RequestBodyTooLarge" => ErrorCode::RequestBodyTooLarge,
            "ResourceNotFound" => ErrorCode::ResourceNotFound,
            "ServerBusy" => ErrorCode::ServerBusy,
            "BlobAlreadyExists" => ErrorCode::BlobAlreadyExists,
            "BlobNotFound" => ErrorCode::BlobNotFound,
            "BlockCountExceedsLimit" => ErrorCode::BlockCountExceedsLimit,
            "ContainerAlreadyExists" => ErrorCode::ContainerAlreadyExists,
            "ContainerBeingDeleted" => ErrorCode::ContainerBeingDeleted,
            "ContainerNotFound" => ErrorCode::ContainerNotFound,
            "InvalidBlobOrBlock" => ErrorCode::InvalidBlobOrBlock,
            "InvalidBlobType" => ErrorCode::InvalidBlobType,
            "InvalidBlockId" => ErrorCode::InvalidBlockId,
            "InvalidBlockList" => ErrorCode::InvalidBlockList,
            "InvalidPageRange" => ErrorCode::InvalidPageRange,
            "MaxBlobSizeConditionNotMet" => ErrorCode::MaxBlobSizeConditionNotMet,
            "UnsupportedBlobType" => ErrorCode::UnsupportedBlobType,
            _ => return None,
        };
        Some(code)
    }

    /// Returns the default error message for this code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::AuthenticationFailed => "Server failed to authenticate the request.",
            ErrorCode::BlobNotFound => "The specified blob does not exist.",
            ErrorCode::BlockCountExceedsLimit => "The committed block count cannot exceed the maximum limit of 50,000 blocks.",
            ErrorCode::ContainerAlreadyExists => "The specified container already exists.",
            ErrorCode::ContainerNotFound => "The specified container does not exist.",
            ErrorCode::InvalidBlobType => "The blob type is invalid for this operation.",
            ErrorCode::InvalidBlockId => "The specified block ID is invalid.",
            ErrorCode::InvalidBlockList => "The specified block list is invalid.",
            ErrorCode::InvalidHeaderValue => "The value for one of the HTTP headers is not valid.",
            ErrorCode::InvalidPageRange => "The page range specified is invalid.",
            ErrorCode::InvalidRange => "The range specified is invalid for the current size of the resource.",
            ErrorCode::InvalidResourceName => "The specified resource name contains invalid characters.",
            ErrorCode::OperationTimedOut => "The operation could not be completed within the permitted time.",
            ErrorCode::RequestBodyTooLarge => "The request body is too large and exceeds the maximum permissible limit.",
            ErrorCode::ResourceNotFound => "The specified resource does not exist.",
            ErrorCode::InternalError => "The server encountered an internal error. Please retry the request.",
            _ => "An error occurred while processing the request.",
        }
    }
}

/// Error returned by a [`BlobStore`](crate::storage::BlobStore) implementation.
#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct StorageError {
    pub code: ErrorCode,
    pub message: String,
}

impl StorageError {
    /// Creates a new storage error with the given code and default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.default_message().to_string(),
            code,
        }
    }

    /// Creates a new storage error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<azure_core::Error> for StorageError {
    fn from(err: azure_core::Error) -> Self {
        let code = match err.kind() {
            azure_core::error::ErrorKind::HttpResponse { error_code, .. } => error_code
                .as_deref()
                .and_then(ErrorCode::from_service_code)
                .unwrap_or(ErrorCode::InternalError),
            _ => ErrorCode::InternalError,
        };
        StorageError::with_message(code, err.to_string())
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the sample workflows and the driver.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("create {blob} failed: {source}")]
    Create { blob: String, source: StorageError },

    #[error("append to {blob} failed: {source}")]
    Append { blob: String, source: StorageError },

    #[error("commit of {blob} failed: {source}")]
    Commit { blob: String, source: StorageError },

    #[error("page offsets {start}..={end} are not aligned to 512 bytes")]
    Alignment { start: u64, end: u64 },

    #[error("page write {start}..={end} extends past blob length {length}")]
    Range { start: u64, end: u64, length: u64 },

    #[error("page blob length {0} is not a multiple of 512")]
    InvalidSize(u64),

    #[error("file '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("verification of {blob} failed: {reason}")]
    Verification { blob: String, reason: String },

    #[error("storage error: {0}")]
    Transport(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SampleError {
    /// Maps a storage error from a create call, keeping type conflicts distinct.
    pub fn create(blob: &str, source: StorageError) -> Self {
        match source.code {
            ErrorCode::InvalidBlobType | ErrorCode::BlobAlreadyExists => SampleError::Create {
                blob: blob.to_string(),
                source,
            },
            _ => SampleError::Transport(source),
        }
    }

    /// Maps a storage error from an append call.
    pub fn append(blob: &str, source: StorageError) -> Self {
        match source.code {
            ErrorCode::BlockCountExceedsLimit
            | ErrorCode::RequestBodyTooLarge
            | ErrorCode::MaxBlobSizeConditionNotMet
            | ErrorCode::InvalidBlobType => SampleError::Append {
                blob: blob.to_string(),
                source,
            },
            _ => SampleError::Transport(source),
        }
    }

    /// Maps a storage error from a block list commit.
    pub fn commit(blob: &str, source: StorageError) -> Self {
        match source.code {
            ErrorCode::InvalidBlockList | ErrorCode::InvalidBlockId => SampleError::Commit {
                blob: blob.to_string(),
                source,
            },
            _ => SampleError::Transport(source),
        }
    }
}

/// Result type alias for sample operations.
pub type SampleResult<T> = Result<T, SampleError>;
