// tests/property/request_path_test.rs

//! Property-based tests for request path normalization

use proptest::prelude::*;
use reginabox::core::request_path::RequestPath;

proptest! {
    #[test]
    fn test_normalization_is_idempotent(raw in "[a-z0-9@/._-]{0,40}") {
        if let Ok(path) = RequestPath::parse(&raw) {
            let again = RequestPath::parse(path.as_str()).unwrap();
            prop_assert_eq!(again, path);
        }
    }

    #[test]
    fn test_normalized_paths_stay_inside_the_root(raw in "[a-z./%2eEfF]{0,40}") {
        if let Ok(path) = RequestPath::parse(&raw) {
            prop_assert!(path.as_str().starts_with('/'));
            prop_assert!(!path.as_str().contains("//"));
            prop_assert!(path.as_str().split('/').all(|s| s != ".." && s != "."));
        }
    }
}
