/// Result of validating a flat filename.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `.` or `..`.
    Reserved,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::Reserved => "Invalid filename: '.' and '..' are reserved",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == "." || trimmed == ".." {
        return Err(FilenameError::Reserved);
    }

    Ok(trimmed)
}

/// Checks if a path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
        || path.starts_with("..\\")
        || path.contains("\\..\\")
        || path.ends_with("\\..")
}

/// Normalizes a relative directory path to the stored form `/a/b/`.
///
/// Accepts `""`, `"/"`, `"a/b"`, `"/a/b/"`. Rejects traversal, backslashes,
/// empty or dot segments and control characters.
pub fn normalize_filepath(path: &str) -> Result<String, &'static str> {
    let trimmed = path.trim();

    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err("Path must not contain control characters");
    }

    if trimmed.contains('\\') {
        return Err("Path must not contain backslashes");
    }

    if contains_path_traversal(trimmed) {
        return Err("Path must not contain '..' traversal");
    }

    let inner = trimmed.trim_start_matches('/').trim_end_matches('/');
    if inner.is_empty() {
        return Ok("/".to_string());
    }

    let mut normalized = String::with_capacity(inner.len() + 2);
    normalized.push('/');
    for segment in inner.split('/') {
        if segment.is_empty() {
            return Err("Path must not contain empty segments");
        }
        if segment == "." || segment == ".." {
            return Err("Path must not contain '.' or '..' segments");
        }
        normalized.push_str(segment);
        normalized.push('/');
    }

    Ok(normalized)
}

/// Splits a relative file path into a normalized directory and a filename.
///
/// `"a/b/c.png"` becomes `("/a/b/", "c.png")`.
pub fn split_dir_filename(path: &str) -> Result<(String, String), &'static str> {
    let trimmed = path.trim().trim_start_matches('/');
    let (dir, filename) = match trimmed.rfind('/') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos + 1..]),
        None => ("", trimmed),
    };
    let filename = validate_flat_filename(filename).map_err(|e| e.message())?;
    Ok((normalize_filepath(dir)?, filename.to_string()))
}

/// Every directory from the root down to `filepath`, inclusive.
///
/// `"/a/b/"` yields `["/", "/a/", "/a/b/"]`.
pub fn ancestor_dirs(filepath: &str) -> Vec<String> {
    let mut dirs = vec!["/".to_string()];
    let mut current = String::from("/");
    for segment in filepath.split('/').filter(|s| !s.is_empty()) {
        current.push_str(segment);
        current.push('/');
        dirs.push(current.clone());
    }
    dirs
}

/// Re-roots `filepath` at `base`, both in normalized form.
///
/// Returns `None` when `filepath` is not inside `base`.
pub fn relative_to(filepath: &str, base: &str) -> Option<String> {
    filepath
        .strip_prefix(base)
        .map(|rest| format!("/{rest}"))
}

/// Splits a normalized directory into its parent and its own name.
///
/// `"/a/b/"` becomes `("/a/", "b")`; the root has no parent.
pub fn parent_and_name(filepath: &str) -> Option<(String, String)> {
    let inner = filepath.trim_end_matches('/');
    let pos = inner.rfind('/')?;
    let name = &inner[pos + 1..];
    if name.is_empty() {
        return None;
    }
    Some((inner[..=pos].to_string(), name.to_string()))
}

/// Archive tooling noise that never becomes an asset (`__MACOSX/`, `._x`, `.DS_Store`).
pub fn is_ignored_archive_path(path: &str) -> bool {
    path.split('/')
        .any(|segment| segment == "__MACOSX" || segment.starts_with('.'))
}
