use crate::StoreError;

/// Check that `name` is a single, plain file name.
///
/// Rejects empty names, `.` and `..`, path separators (`/` and `\`) and NUL
/// bytes. Returns the name unchanged on success.
pub fn validate(name: &str) -> Result<&str, StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName("empty name".into()));
    }
    if name == "." || name == ".." {
        return Err(StoreError::InvalidName(format!("'{name}' is not a file name")));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(StoreError::InvalidName(format!(
            "'{name}' contains a path separator"
        )));
    }
    Ok(name)
}

/// Whether `name` ends with the given extension (without the dot).
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext == extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        assert_eq!(validate("g0.bin").unwrap(), "g0.bin");
    }

    #[test]
    fn name_with_dots_and_dashes() {
        assert!(validate("a.b-c_d.babylonbinarymeshdata").is_ok());
    }

    #[test]
    fn reject_empty() {
        assert!(validate("").is_err());
    }

    #[test]
    fn reject_dot_names() {
        assert!(validate(".").is_err());
        assert!(validate("..").is_err());
    }

    #[test]
    fn reject_separators() {
        assert!(validate("a/b.bin").is_err());
        assert!(validate("a\\b.bin").is_err());
        assert!(validate("../escape.bin").is_err());
    }

    #[test]
    fn reject_nul() {
        assert!(validate("a\0b").is_err());
    }

    #[test]
    fn extension_match() {
        assert!(has_extension("g0.babylonbinarymeshdata", "babylonbinarymeshdata"));
        assert!(!has_extension("g0.json", "babylonbinarymeshdata"));
        assert!(!has_extension("babylonbinarymeshdata", "babylonbinarymeshdata"));
        assert!(!has_extension(".babylonbinarymeshdata", "babylonbinarymeshdata"));
    }
}
