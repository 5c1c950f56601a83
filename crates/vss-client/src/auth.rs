//! Token resolution.
//!
//! A token is given either inline or as the path of a file holding it.

use crate::domain::error::{ClientError, ClientResult};
use std::path::Path;
use tracing::debug;

/// Pick the token source and resolve it to the token text.
///
/// The configured value wins over the caller-supplied one; an empty string
/// counts as absent.
pub fn resolve_token(configured: &str, supplied: Option<&str>) -> ClientResult<String> {
    let source = Some(configured)
        .filter(|s| !s.is_empty())
        .or_else(|| supplied.filter(|s| !s.is_empty()))
        .ok_or_else(|| ClientError::Authorization("no token or token file provided".into()))?;

    read_token(source)
}

/// Read the token from `source` if it names an existing regular file,
/// otherwise return `source` itself.
pub fn read_token(source: &str) -> ClientResult<String> {
    let path = Path::new(source);
    if !path.is_file() {
        return Ok(source.to_string());
    }

    debug!(path = %path.display(), "Reading token file");
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ClientError::Authorization(format!("cannot read token file {}: {}", path.display(), e))
    })?;
    let token = contents.trim_end().to_string();
    if token.is_empty() {
        return Err(ClientError::Authorization(format!(
            "token file {} is empty",
            path.display()
        )));
    }
    Ok(token)
}
