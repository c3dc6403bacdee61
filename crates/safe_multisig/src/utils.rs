use semver::{Version, VersionReq};

use crate::error::{Error, Result};

/// Parses a safe contract version such as `1.3.0` or `1.3.0+L2`.
pub fn parse_safe_version(version: &str) -> Result<Version> {
    Version::parse(version.trim()).map_err(|_| Error::InvalidVersion(version.to_string()))
}

/// Returns true if `version` parses and matches `requirement`.
///
/// Build metadata (the `+L2` suffix) does not take part in the comparison.
pub fn version_satisfies(version: &str, requirement: &VersionReq) -> bool {
    parse_safe_version(version).is_ok_and(|v| requirement.matches(&v))
}

/// Two versions are the same release when they only differ in build metadata.
pub fn same_release(a: &Version, b: &Version) -> bool {
    a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_l2_suffix() {
        let version = parse_safe_version("1.3.0+L2").unwrap();
        assert_eq!((version.major, version.minor, version.patch), (1, 3, 0));
        assert!(same_release(&version, &Version::new(1, 3, 0)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_safe_version("latest"), Err(Error::InvalidVersion(_))));
        assert!(!version_satisfies("latest", &VersionReq::STAR));
    }

    #[test]
    fn satisfies_ranges() {
        let req = VersionReq::parse("<1.0.0").unwrap();
        assert!(version_satisfies("0.1.0", &req));
        assert!(!version_satisfies("1.0.0", &req));
    }
}
