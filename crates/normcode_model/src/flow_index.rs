//! Dotted-integer flow indices (§3: "`1.1.3.2` assigned by indentation
//! depth"), the sort key for Waitlist order.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowIndex(Vec<u32>);

impl FlowIndex {
    pub fn new(segments: Vec<u32>) -> Self {
        FlowIndex(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// True if `self` is `other` or nested under it (e.g. `1.2.1` under
    /// `1.2`), the relation `supporting_children` and loop subtree resets
    /// walk.
    pub fn is_descendant_of(&self, other: &FlowIndex) -> bool {
        self.0.len() > other.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

impl fmt::Display for FlowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowIndexParseError(pub String);

impl fmt::Display for FlowIndexParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid flow_index '{}'", self.0)
    }
}

impl std::error::Error for FlowIndexParseError {}

impl FromStr for FlowIndex {
    type Err = FlowIndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FlowIndexParseError(s.to_string()));
        }
        let mut segments = Vec::new();
        for part in s.split('.') {
            match part.parse::<u32>() {
                Ok(n) => segments.push(n),
                Err(_) => return Err(FlowIndexParseError(s.to_string())),
            }
        }
        Ok(FlowIndex(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        let fi: FlowIndex = "1.1.3.2".parse().unwrap();
        assert_eq!(fi.to_string(), "1.1.3.2");
    }

    #[test]
    fn orders_lexicographically_by_segment() {
        let a: FlowIndex = "1.2".parse().unwrap();
        let b: FlowIndex = "1.10".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn descendant_check() {
        let parent: FlowIndex = "1.2".parse().unwrap();
        let child: FlowIndex = "1.2.1".parse().unwrap();
        let sibling: FlowIndex = "1.3".parse().unwrap();
        assert!(child.is_descendant_of(&parent));
        assert!(!sibling.is_descendant_of(&parent));
        assert!(!parent.is_descendant_of(&parent));
    }
}
