//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a package name as written in the package table (PascalCase)
    pub fn package_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,8}([A-Z][a-z]{1,8}){0,2}"
    }

    /// Generate a proto file stem (lowercase with hyphens or underscores)
    pub fn proto_stem() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,10}([-_][a-z0-9]{1,8}){0,2}"
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..100, 0u32..100, 0u32..100)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate Python-ish source text with no generated-module imports
    pub fn python_body() -> impl Strategy<Value = String> {
        "[a-z =#():\n]{0,80}"
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_name_generator(name in package_name()) {
            prop_assert!(name.chars().next().is_some_and(|c| c.is_ascii_uppercase()));
            prop_assert!(name.chars().all(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn test_proto_stem_generator(stem in proto_stem()) {
            prop_assert!(!stem.is_empty());
            prop_assert!(!stem.ends_with('-'));
        }

        #[test]
        fn test_semver_version_generator(version in semver_version()) {
            prop_assert!(semver::Version::parse(&version).is_ok());
        }

        #[test]
        fn test_python_body_generator(body in python_body()) {
            prop_assert!(!body.contains("_pb2"));
        }
    }
}
