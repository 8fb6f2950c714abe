//! The bundled `KEY=VALUE` payload that seeds the process environment and the
//! token allowlist.

use crate::{allowlist::Allowlist, Error};

/// Keys with this prefix contribute their value to the allowlist
pub const TOKEN_PREFIX: &str = "TOKEN";

/// The env payload compiled into the binary
pub const EMBEDDED: &str = include_str!("../assets/.env");

/// A parsed env payload, in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvPayload {
    vars: Vec<(String, String)>,
}

impl EnvPayload {
    /// Parses a payload. Any line that is not blank, not a `#` comment and
    /// not a `KEY=VALUE` pair fails the whole payload.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut vars = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |reason: &str| Error::Config {
                line: i + 1,
                reason: reason.to_owned(),
            };

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| malformed("expected KEY=VALUE"))?;

            if key.is_empty() {
                return Err(malformed("empty key"));
            }

            if key.contains('\0') || value.contains('\0') {
                return Err(malformed("contains a NUL byte"));
            }

            vars.push((key.to_owned(), value.to_owned()));
        }

        Ok(Self { vars })
    }

    /// Parses the payload bundled with the binary
    pub fn embedded() -> Result<Self, Error> {
        Self::parse(EMBEDDED)
    }

    #[inline]
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets every pair in the process environment. Must run before anything
    /// else reads or writes the environment concurrently.
    pub fn apply(&self) {
        for (key, value) in self.vars() {
            std::env::set_var(key, value);
        }

        tracing::debug!(count = self.vars.len(), "applied env payload");
    }

    /// Collects the values of every `TOKEN*` key
    pub fn allowlist(&self) -> Allowlist {
        self.vars()
            .filter(|(key, _)| key.starts_with(TOKEN_PREFIX))
            .map(|(_, value)| value.to_owned())
            .collect()
    }
}
