use crate::Error;

/// The environment variable the caller's access token is read from
pub const USER_TOKEN_VAR: &str = "GCSCLI_USER_TOKEN";

/// The set of tokens allowed to use the upload path
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Allowlist {
    tokens: Vec<String>,
}

impl Allowlist {
    /// True iff `candidate` is byte-for-byte equal to one of the entries
    #[inline]
    pub fn validate(&self, candidate: &str) -> bool {
        self.tokens.iter().any(|tok| tok == candidate)
    }

    pub fn authorize(&self, candidate: &str) -> Result<(), Error> {
        if self.validate(candidate) {
            Ok(())
        } else {
            Err(Error::Auth(
                "Unauthorized user. Your token is not in the list of authorized users.".to_owned(),
            ))
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<String> for Allowlist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Reads the caller token from `var`, failing if it is unset or empty
pub fn caller_token(var: &str) -> Result<String, Error> {
    match std::env::var(var) {
        Ok(tok) if !tok.is_empty() => Ok(tok),
        _ => Err(Error::Auth(format!(
            "Missing user token. Please set the environment variable '{var}'."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist(tokens: &[&str]) -> Allowlist {
        tokens.iter().map(|t| (*t).to_owned()).collect()
    }

    #[test]
    fn exact_match_only() {
        let al = allowlist(&["abc123"]);

        assert!(al.validate("abc123"));
        assert!(!al.validate("abc124"));
        assert!(!al.validate(""));
        assert!(!al.validate("abc"));
        assert!(!al.validate("abc1234"));
        assert!(!al.validate("ABC123"));
        assert!(!al.validate(" abc123"));
    }

    #[test]
    fn empty_allowlist_rejects_everything() {
        let al = Allowlist::default();
        assert!(al.is_empty());
        assert!(!al.validate(""));
        assert!(!al.validate("abc123"));
    }

    #[test]
    fn authorize_maps_to_auth_error() {
        let al = allowlist(&["abc123", "def456"]);

        al.authorize("def456").unwrap();
        assert!(matches!(al.authorize("xyz"), Err(Error::Auth(_))));
    }

    #[test]
    fn caller_token_requires_non_empty() {
        const VAR: &str = "GCSCLI_ALLOWLIST_TEST_TOKEN";

        std::env::remove_var(VAR);
        assert!(matches!(caller_token(VAR), Err(Error::Auth(_))));

        std::env::set_var(VAR, "");
        assert!(matches!(caller_token(VAR), Err(Error::Auth(_))));

        std::env::set_var(VAR, "abc123");
        assert_eq!(caller_token(VAR).unwrap(), "abc123");

        std::env::remove_var(VAR);
    }
}
