//! Latest qualifying release selection

use semver::Version;
use tracing::warn;

use crate::version::release::Release;
use crate::version::semver::{is_prerelease, parse_tag};

/// Select the latest qualifying version from a release list.
///
/// Releases are expected newest first, as the GitHub API returns them; the list
/// is scanned in the given order and never re-sorted. A release qualifies when it
/// is neither a draft nor flagged as prerelease, its tag parses as a semantic
/// version, and that version has no prerelease label. Unparseable tags are
/// skipped so that malformed historical tags do not hide a valid one.
pub fn resolve_latest(releases: &[Release]) -> Option<Version> {
    for release in releases {
        if release.is_draft || release.is_prerelease {
            continue;
        }

        let version = match parse_tag(&release.tag) {
            Ok(version) => version,
            Err(e) => {
                warn!(tag = %release.tag, error = %e, "failed to parse release tag");
                continue;
            }
        };

        if is_prerelease(&version) {
            continue;
        }

        return Some(version);
    }

    None
}
