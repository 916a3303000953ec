use serde::{Deserialize, Serialize};

/// Codename-only reference used throughout the migration snapshot.
///
/// Snapshot values never carry server-assigned ids; every cross-entity link
/// (asset, linked item, taxonomy term, choice option, workflow step) is a
/// codename that the import side resolves against the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodenameReference {
    pub codename: String,
}

impl CodenameReference {
    pub fn new(codename: impl Into<String>) -> Self {
        Self {
            codename: codename.into(),
        }
    }
}

impl From<&str> for CodenameReference {
    fn from(codename: &str) -> Self {
        Self::new(codename)
    }
}

impl std::fmt::Display for CodenameReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codename)
    }
}
