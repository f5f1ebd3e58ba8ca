use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Abort the run on the first document that fails to build or render.
    pub fail_fast: bool,
    pub max_log_builds: usize,
    /// Prefix written documents with `<!DOCTYPE html>`.
    pub doctype: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            fail_fast: false,
            max_log_builds: 10,
            doctype: false,
        }
    }
}

impl RenderConfig {
    pub fn new(fail_fast: bool, max_log_builds: usize, doctype: bool) -> Self {
        RenderConfig {
            fail_fast,
            max_log_builds: max_log_builds.max(1),
            doctype,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(!config.fail_fast);
        assert_eq!(config.max_log_builds, 10);
        assert!(!config.doctype);
    }

    #[test]
    fn test_keeps_at_least_one_log() {
        assert_eq!(RenderConfig::new(true, 0, false).max_log_builds, 1);
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let json = serde_json::to_value(RenderConfig::new(true, 3, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"fail_fast": true, "max_log_builds": 3, "doctype": true})
        );
    }
}
