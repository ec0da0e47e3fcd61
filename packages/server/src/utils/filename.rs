/// Reasons a name is not a usable flat filename.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Invalid filename: path separators are not allowed")]
    ContainsPathSeparator,
    #[error("Invalid filename: '..' is not allowed")]
    PathTraversal,
    #[error("Invalid filename: null bytes are not allowed")]
    NullByte,
    #[error("Invalid filename: hidden files (starting with '.') are not allowed")]
    Hidden,
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
}

/// Validate a name that must refer to a file directly inside one directory
/// (the master repository, an upload, a disposition).
///
/// Returns the trimmed name.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let name = filename.trim();

    match name {
        "" => return Err(FilenameError::Empty),
        ".." => return Err(FilenameError::PathTraversal),
        _ => {}
    }

    for c in name.chars() {
        match c {
            '\0' => return Err(FilenameError::NullByte),
            // CR/LF would also allow header injection via Content-Disposition.
            c if c.is_ascii_control() => return Err(FilenameError::ControlCharacter),
            '/' | '\\' => return Err(FilenameError::ContainsPathSeparator),
            _ => {}
        }
    }

    if name.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(name)
}
