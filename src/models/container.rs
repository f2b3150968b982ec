//! Container data models.

use crate::error::SampleError;

/// Public access level for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerAccess {
    /// No anonymous access.
    #[default]
    Private,
    /// Anonymous read access to blobs only.
    Blob,
    /// Anonymous read and list access to the whole container.
    Container,
}

impl ContainerAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAccess::Private => "private",
            ContainerAccess::Blob => "blob",
            ContainerAccess::Container => "container",
        }
    }
}

/// Validates a container name against the service naming rules.
pub fn validate_container_name(name: &str) -> Result<(), SampleError> {
    // Container names must be 3-63 characters
    if name.len() < 3 || name.len() > 63 {
        return Err(SampleError::Config(format!(
            "container name '{}' must be between 3 and 63 characters",
            name
        )));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(SampleError::Config(format!(
            "container name '{}' must start with a letter or number",
            name
        )));
    }

    if name
        .chars()
        .any(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-')
    {
        return Err(SampleError::Config(format!(
            "container name '{}' can only contain lowercase letters, numbers, and hyphens",
            name
        )));
    }

    if name.contains("--") || name.ends_with('-') {
        return Err(SampleError::Config(format!(
            "container name '{}' cannot have consecutive or trailing hyphens",
            name
        )));
    }

    Ok(())
}
