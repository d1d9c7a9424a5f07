use semver::Version;

/// Strip a leading `v`/`V` from a version tag.
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v')
        .or_else(|| tag.strip_prefix('V'))
        .unwrap_or(tag)
}

/// Pad a partial version core with zeros, keeping any prerelease/build suffix.
///
/// Examples:
/// - "1" -> "1.0.0"
/// - "1.2" -> "1.2.0"
/// - "1.2-beta" -> "1.2.0-beta"
fn pad_version(version: &str) -> String {
    let split_at = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(split_at);
    match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => version.to_string(),
    }
}

/// Parse a release tag into a semantic version.
///
/// Accepts an optional `v` prefix and partial versions ("v1", "v1.2").
pub fn parse_tag(tag: &str) -> Result<Version, semver::Error> {
    Version::parse(&pad_version(normalize_tag(tag)))
}

/// True when the version carries a prerelease label such as `-beta`.
pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v1.2.3", "1.2.3")]
    #[case("V1.2.3", "1.2.3")]
    #[case("1.2.3", "1.2.3")]
    #[case("v1", "1.0.0")]
    #[case("v1.2", "1.2.0")]
    #[case("v1.2-beta.1", "1.2.0-beta.1")]
    #[case("v1.2.3+build.5", "1.2.3+build.5")]
    #[case(" v0.1.1 ", "0.1.1")]
    fn parse_tag_accepts_common_tag_forms(#[case] tag: &str, #[case] expected: &str) {
        assert_eq!(parse_tag(tag).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("v")]
    #[case("invalid-tag-on-release")]
    #[case("release-2024")]
    #[case("1.2.3.4")]
    #[case("v1.x")]
    fn parse_tag_rejects_non_versions(#[case] tag: &str) {
        assert!(parse_tag(tag).is_err());
    }

    #[rstest]
    #[case("v1.2.0-beta", true)]
    #[case("v1.2.0-rc.1", true)]
    #[case("v1.2.0", false)]
    #[case("v1.2.0+build", false)]
    fn is_prerelease_checks_label(#[case] tag: &str, #[case] expected: bool) {
        assert_eq!(is_prerelease(&parse_tag(tag).unwrap()), expected);
    }
}
