//! Resource handle type.
//!
//! A runtime object this run created and is responsible for removing.

/// Kind of runtime object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Container,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Pod => write!(f, "pod"),
            ResourceKind::Container => write!(f, "container"),
        }
    }
}

/// An externally existing object created by this run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    name: String,
    order: usize,
}

impl ResourceHandle {
    pub(crate) fn new(kind: ResourceKind, name: impl Into<String>, order: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            order,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in creation order, starting at 0
    pub fn order(&self) -> usize {
        self.order
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
