use serde::{Deserialize, Serialize};

/// Resource bounds applied to every BER decode.
///
/// Input is untrusted: without a depth bound, nested indefinite-length
/// encodings exhaust the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum nesting of constructed encodings.
    pub max_depth: usize,
    /// Maximum size in bytes of one top-level encoding.
    pub max_size: usize,
}

impl Limits {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Limits;

    #[test]
    fn test_partial_config_uses_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(8, limits.max_depth);
        assert_eq!(Limits::DEFAULT_MAX_SIZE, limits.max_size);
    }
}
