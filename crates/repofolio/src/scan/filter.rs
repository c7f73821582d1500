use std::collections::HashSet;

use crate::forge::RepoSummary;

/// Why a listed repository was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Name is on the exclusion list.
    Excluded,
    /// Name starts with a dot.
    DotPrefix,
    /// Repository is a fork.
    Fork,
}

/// Listing filters, applied in a fixed order: name exclusion, dot prefix, fork.
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    /// Lowercased names to drop.
    excluded: HashSet<String>,
    /// Drop repositories whose name starts with `.`.
    pub skip_dot_prefix: bool,
    /// Drop forks.
    pub hide_forks: bool,
}

impl RepoFilter {
    #[must_use]
    pub fn new<I, S>(excluded: I, skip_dot_prefix: bool, hide_forks: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: excluded
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
            skip_dot_prefix,
            hide_forks,
        }
    }

    /// True if `name` is on the exclusion list (case-insensitive).
    #[must_use]
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.excluded.contains(&name.to_lowercase())
    }

    /// First rule that drops `repo`, if any.
    #[must_use]
    pub fn exclusion_reason(&self, repo: &RepoSummary) -> Option<ExclusionReason> {
        if self.is_excluded_name(&repo.name) {
            return Some(ExclusionReason::Excluded);
        }
        if self.skip_dot_prefix && repo.name.starts_with('.') {
            return Some(ExclusionReason::DotPrefix);
        }
        if self.hide_forks && repo.fork {
            return Some(ExclusionReason::Fork);
        }
        None
    }
}

/// Split a comma- or whitespace-separated list into its non-empty entries.
///
/// Order and duplicates are preserved.
#[must_use]
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
