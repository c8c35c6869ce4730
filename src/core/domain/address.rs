//! Address probe types.

/// Where an echo query is issued from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Host,
    Container { name: String, user: Option<String> },
}

impl Origin {
    pub fn container(name: impl Into<String>) -> Self {
        Origin::Container {
            name: name.into(),
            user: None,
        }
    }

    pub fn container_as(name: impl Into<String>, user: impl Into<String>) -> Self {
        Origin::Container {
            name: name.into(),
            user: Some(user.into()),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Host => write!(f, "host"),
            Origin::Container { name, user: None } => write!(f, "{}", name),
            Origin::Container {
                name,
                user: Some(user),
            } => write!(f, "{} (as {})", name, user),
        }
    }
}

/// Result of an echo query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Resolved(String),
    Unavailable,
}

impl Address {
    /// Parse an echo response body. Blank bodies are `Unavailable`.
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            Address::Unavailable
        } else {
            Address::Resolved(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Address::Resolved(a) => Some(a),
            Address::Unavailable => None,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Resolved(a) => write!(f, "{}", a),
            Address::Unavailable => write!(f, "unavailable"),
        }
    }
}
