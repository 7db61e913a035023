//! Storage locator parsing (spec §6 "Storage locator"): `scheme://path`,
//! where a recognized scheme selects a backend and an absent scheme means
//! the default local backend. Parsing is a pure pre-check done before a job
//! is ever persisted, independent of which [`mediaforge_storage::Storage`]
//! implementation ends up resolving the result.

use mediaforge_core::Error;
use mediaforge_storage::Location;

const RECOGNIZED_SCHEMES: &[&str] = &["s3", "gcs", "azure", "local"];
const ALLOWED_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-./";

/// Parses a locator string into a [`Location`], rejecting unrecognized
/// schemes and any path character outside `[a-zA-Z0-9_\-./]`.
pub fn parse_locator(raw: &str) -> Result<Location, Error> {
    if raw.is_empty() {
        return Err(Error::validation("locator must not be empty"));
    }

    let (scheme, path) = match raw.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, raw),
    };

    if let Some(scheme) = scheme {
        if !RECOGNIZED_SCHEMES.contains(&scheme) {
            return Err(Error::validation(format!("unrecognized storage scheme: {scheme}")));
        }
    }

    if path.is_empty() {
        return Err(Error::validation("locator path must not be empty"));
    }
    if path.contains("..") {
        return Err(Error::security("locator path must not contain parent-directory references"));
    }
    if path.contains('\0') {
        return Err(Error::security("locator path must not contain a null byte"));
    }
    if let Some(bad) = path.chars().find(|c| !ALLOWED_CHARS.contains(*c)) {
        return Err(Error::validation(format!("locator path contains disallowed character: {bad:?}")));
    }

    match scheme {
        None | Some("local") => Ok(Location::Local(path.into())),
        Some(_) => Ok(Location::remote(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemeless_path_resolves_local() {
        assert_eq!(parse_locator("input.mp4").unwrap(), Location::Local("input.mp4".into()));
    }

    #[test]
    fn recognized_scheme_resolves_remote() {
        let location = parse_locator("s3://bucket/key.mp4").unwrap();
        assert_eq!(location, Location::remote("s3://bucket/key.mp4"));
    }

    #[test]
    fn unrecognized_scheme_is_rejected() {
        assert!(parse_locator("ftp://host/path").is_err());
    }

    #[test]
    fn parent_directory_reference_is_rejected_as_security_violation() {
        let err = parse_locator("../etc/passwd").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn null_byte_is_rejected_as_security_violation() {
        let err = parse_locator("input\0.mp4").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn disallowed_character_is_rejected() {
        assert!(parse_locator("input;rm -rf.mp4").is_err());
    }

    #[test]
    fn empty_locator_is_rejected() {
        assert!(parse_locator("").is_err());
    }
}
