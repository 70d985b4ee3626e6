//! API key scopes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission attached to an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "interviews:read")]
    InterviewsRead,
    #[serde(rename = "interviews:write")]
    InterviewsWrite,
    #[serde(rename = "invitations:read")]
    InvitationsRead,
    #[serde(rename = "invitations:write")]
    InvitationsWrite,
    #[serde(rename = "results:read")]
    ResultsRead,
    #[serde(rename = "evaluations:write")]
    EvaluationsWrite,
    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "keys:manage")]
    KeysManage,
    /// Wildcard, grants every scope
    #[serde(rename = "*")]
    All,
}

impl Scope {
    pub const ALL_SCOPES: [Scope; 9] = [
        Scope::InterviewsRead,
        Scope::InterviewsWrite,
        Scope::InvitationsRead,
        Scope::InvitationsWrite,
        Scope::ResultsRead,
        Scope::EvaluationsWrite,
        Scope::AuditRead,
        Scope::KeysManage,
        Scope::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::InterviewsRead => "interviews:read",
            Scope::InterviewsWrite => "interviews:write",
            Scope::InvitationsRead => "invitations:read",
            Scope::InvitationsWrite => "invitations:write",
            Scope::ResultsRead => "results:read",
            Scope::EvaluationsWrite => "evaluations:write",
            Scope::AuditRead => "audit:read",
            Scope::KeysManage => "keys:manage",
            Scope::All => "*",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL_SCOPES
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown scope '{}'", s))
    }
}

/// Set of scopes held by one key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<Scope>);

impl ScopeSet {
    pub fn new(scopes: impl IntoIterator<Item = Scope>) -> Self {
        let mut set = Vec::new();
        for scope in scopes {
            if !set.contains(&scope) {
                set.push(scope);
            }
        }
        Self(set)
    }

    /// Parse the space-separated database form (commas also accepted)
    pub fn parse(raw: &str) -> Result<Self, String> {
        let scopes = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(Scope::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(scopes))
    }

    /// Whether this set grants `required`. Only `*` implies other scopes.
    pub fn allows(&self, required: Scope) -> bool {
        self.0.iter().any(|s| *s == Scope::All || *s == required)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    /// Space-separated form stored in `api_keys.scopes`
    pub fn to_db_string(&self) -> String {
        self.0
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_round_trip_db_form() {
        let set = ScopeSet::parse("interviews:read results:read").unwrap();
        assert_eq!(set.to_db_string(), "interviews:read results:read");
    }

    #[test]
    fn test_parse_accepts_commas_and_dedups() {
        let set = ScopeSet::parse("audit:read, audit:read,keys:manage").unwrap();
        assert_eq!(set.to_db_string(), "audit:read keys:manage");
    }

    #[test]
    fn test_unknown_scope_rejected() {
        assert!(ScopeSet::parse("interviews:read admin").is_err());
    }

    #[test]
    fn test_write_does_not_imply_read() {
        let set = ScopeSet::parse("interviews:write").unwrap();
        assert!(set.allows(Scope::InterviewsWrite));
        assert!(!set.allows(Scope::InterviewsRead));
    }

    #[test]
    fn test_wildcard_implies_everything() {
        let set = ScopeSet::parse("*").unwrap();
        for scope in Scope::ALL_SCOPES {
            assert!(set.allows(scope), "wildcard should allow {}", scope);
        }
    }

    #[test]
    fn test_empty_set_allows_nothing() {
        let set = ScopeSet::parse("").unwrap();
        assert!(set.is_empty());
        assert!(!set.allows(Scope::AuditRead));
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for scope in Scope::ALL_SCOPES {
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope.as_str()));
        }
    }
}
