//! Socket transport URIs.
//!
//! A [`Uri`] keeps both the original text and the normalized value; sockets
//! always bind and connect with the normalized value.

use crate::error::TransportError;

/// A socket URI: scheme `tcp` (with `zmq` accepted as an alias), a non-empty
/// authority, and nothing else: no path, query, or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    original: String,
    authority: String,
    normalized: String,
}

impl Uri {
    /// Parses and normalizes `input`. All offending parts are reported in one
    /// error.
    pub fn parse(input: &str) -> Result<Self, TransportError> {
        let mut errors: Vec<String> = Vec::new();

        let (scheme, rest) = match input.split_once("://") {
            Some(split) => split,
            None => ("", input),
        };
        match scheme {
            "zmq" | "tcp" => {}
            other => errors.push(format!("protocol ({other})")),
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, fragment),
            None => (rest, ""),
        };
        if !fragment.is_empty() {
            errors.push(format!("fragment ({fragment})"));
        }

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, query),
            None => (rest, ""),
        };
        if !query.is_empty() {
            errors.push(format!("query ({query})"));
        }

        let (authority, path) = match rest.find('/') {
            Some(position) => rest.split_at(position),
            None => (rest, ""),
        };
        if authority.is_empty() {
            errors.push(format!("authority ({authority})"));
        }
        if !(path.is_empty() || path == "/") {
            errors.push(format!("path ({path})"));
        }

        if !errors.is_empty() {
            return Err(TransportError::BadUri(format!(
                "bad values for {}",
                errors.join(", ")
            )));
        }
        Ok(Self {
            original: input.to_string(),
            authority: authority.to_string(),
            normalized: format!("tcp://{authority}"),
        })
    }

    /// The URI as originally specified.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The normalized URI.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// The authority to bind or connect a socket to.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl std::str::FromStr for Uri {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}
