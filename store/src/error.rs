/// Errors returned by sidecar stores.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// No sidecar with this name exists in the store.
    #[error("sidecar not found: {0}")]
    NotFound(String),
    /// The backend failed with an IO error.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    /// The name is not a single, plain file name.
    #[error("invalid sidecar name: {0}")]
    InvalidName(String),
    /// The store does not accept writes.
    #[error("store is read-only")]
    ReadOnly,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(err.to_string())
        } else {
            StoreError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;

    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = StoreError::from(io::Error::new(io::ErrorKind::NotFound, "g0.bin"));
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn io_error_keeps_its_source() {
        let err = StoreError::from(io::Error::other("disk full"));
        assert_eq!(err.to_string(), "IO error: disk full");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
    }

    #[test]
    fn messages() {
        assert_eq!(
            StoreError::InvalidName("'..' is not allowed".into()).to_string(),
            "invalid sidecar name: '..' is not allowed"
        );
        assert_eq!(StoreError::ReadOnly.to_string(), "store is read-only");
    }
}
