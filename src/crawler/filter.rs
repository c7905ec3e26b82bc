//! Reject/exclude filtering of discovered resources
//!
//! A resource is dropped when its URL contains any reject substring, checked
//! first, or else any exclude substring. Under the default
//! [`CasePolicy::Legacy`] reject matching ignores case while exclude matching
//! is case-sensitive; [`CasePolicy::Insensitive`] ignores case for both lists.

use crate::crawler::parser::Resource;
use serde::Deserialize;

/// Case handling for reject/exclude matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CasePolicy {
    /// Reject ignores case, exclude matches the raw URL
    #[default]
    Legacy,
    /// Both lists ignore case
    Insensitive,
}

/// Why a URL was filtered out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Keep,
    Rejected(String),
    Excluded(String),
}

/// Compiled reject/exclude policy
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// Reject substrings, lowercased
    reject: Vec<String>,

    /// Exclude substrings, lowercased only under `CasePolicy::Insensitive`
    exclude: Vec<String>,

    policy: CasePolicy,
}

impl ResourceFilter {
    /// Builds a filter; empty patterns are ignored since they would match every URL
    pub fn new(reject: &[String], exclude: &[String], policy: CasePolicy) -> Self {
        let reject = reject
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| pattern.to_lowercase())
            .collect();

        let exclude = exclude
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| match policy {
                CasePolicy::Legacy => pattern.clone(),
                CasePolicy::Insensitive => pattern.to_lowercase(),
            })
            .collect();

        Self {
            reject,
            exclude,
            policy,
        }
    }

    /// Decides whether a single URL survives the filter
    pub fn verdict(&self, url: &str) -> FilterVerdict {
        let lowered = url.to_lowercase();

        if let Some(pattern) = self.reject.iter().find(|p| lowered.contains(p.as_str())) {
            return FilterVerdict::Rejected(pattern.clone());
        }

        let haystack = match self.policy {
            CasePolicy::Legacy => url,
            CasePolicy::Insensitive => lowered.as_str(),
        };
        if let Some(pattern) = self.exclude.iter().find(|p| haystack.contains(p.as_str())) {
            return FilterVerdict::Excluded(pattern.clone());
        }

        FilterVerdict::Keep
    }

    /// Returns true if the URL is neither rejected nor excluded
    pub fn allows(&self, url: &str) -> bool {
        self.verdict(url) == FilterVerdict::Keep
    }

    /// Keeps the resources that pass, preserving order
    pub fn apply(&self, resources: Vec<Resource>) -> Vec<Resource> {
        resources
            .into_iter()
            .filter(|resource| match self.verdict(resource.url.as_str()) {
                FilterVerdict::Keep => true,
                FilterVerdict::Rejected(pattern) => {
                    tracing::trace!("Rejected {} (matches '{}')", resource.url, pattern);
                    false
                }
                FilterVerdict::Excluded(pattern) => {
                    tracing::trace!("Excluded {} (matches '{}')", resource.url, pattern);
                    false
                }
            })
            .collect()
    }
}

/// Filters resources with the legacy case policy
///
/// Convenience wrapper over [`ResourceFilter`] for one-off calls.
pub fn filter_resources(
    resources: Vec<Resource>,
    reject: &[String],
    exclude: &[String],
) -> Vec<Resource> {
    ResourceFilter::new(reject, exclude, CasePolicy::Legacy).apply(resources)
}
