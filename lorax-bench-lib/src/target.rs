use std::{convert::Infallible, fmt, str::FromStr};

use rama::utils::str::arcstr::ArcStr;

/// Name of a unit of work the benchmarked service is asked to apply,
/// e.g. the id of a LoRA adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(ArcStr);

impl TargetId {
    pub fn new(id: impl Into<ArcStr>) -> Self {
        Self(id.into())
    }

    /// Generate `count` targets named `{prefix}{index}`, index starting at 0.
    pub fn numbered(prefix: &str, count: usize) -> Vec<Self> {
        (0..count)
            .map(|index| Self::new(format!("{prefix}{index}")))
            .collect()
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl FromStr for TargetId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
