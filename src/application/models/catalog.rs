use crate::application::models::artifact::Artifact;
use crate::constants::{PAGE_SIZES, PAGE_WINDOW};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Type filter value that disables type filtering.
pub const ALL_TYPES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    MostLiked,
    LeastLiked,
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::MostLiked => "most-liked",
            SortOrder::LeastLiked => "least-liked",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::NameAsc => "name-asc",
            SortOrder::NameDesc => "name-desc",
        }
    }

    fn compare(&self, a: &Artifact, b: &Artifact) -> Ordering {
        match self {
            SortOrder::MostLiked => b.likes.cmp(&a.likes),
            SortOrder::LeastLiked => a.likes.cmp(&b.likes),
            SortOrder::Newest => created(b).cmp(&created(a)),
            SortOrder::Oldest => created(a).cmp(&created(b)),
            SortOrder::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortOrder::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
        }
    }
}

fn created(artifact: &Artifact) -> DateTime<Utc> {
    artifact.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most-liked" => Ok(SortOrder::MostLiked),
            "least-liked" => Ok(SortOrder::LeastLiked),
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "name-asc" => Ok(SortOrder::NameAsc),
            "name-desc" => Ok(SortOrder::NameDesc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Search, filter, sort and paging options for the "all artifacts" view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub artifact_type: String,
    pub sort: SortOrder,
    pub page_size: usize,
    /// 1-based.
    pub page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            artifact_type: ALL_TYPES.to_string(),
            sort: SortOrder::default(),
            page_size: PAGE_SIZES[0],
            page: 1,
        }
    }
}

/// One page of a filtered and sorted catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<Artifact>,
    /// Page actually served, after clamping.
    pub page: usize,
    pub total_pages: usize,
    /// Matches across all pages.
    pub total_items: usize,
}

impl CatalogQuery {
    fn matches(&self, artifact: &Artifact) -> bool {
        let search = self.search.trim().to_lowercase();
        let matches_search = search.is_empty()
            || artifact.name.to_lowercase().contains(&search)
            || artifact
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&search));

        let wanted = self.artifact_type.trim();
        let matches_type = wanted.is_empty()
            || wanted.eq_ignore_ascii_case(ALL_TYPES)
            || artifact
                .artifact_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(wanted));

        matches_search && matches_type
    }

    /// Filtered and sorted matches, without paging.
    pub fn filter(&self, artifacts: &[Artifact]) -> Vec<Artifact> {
        let mut matches: Vec<Artifact> = artifacts
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect();
        matches.sort_by(|a, b| self.sort.compare(a, b));
        matches
    }

    pub fn paginate(&self, artifacts: &[Artifact]) -> CatalogPage {
        let matches = self.filter(artifacts);
        let page_size = self.page_size.max(1);
        let total_items = matches.len();
        let total_pages = total_pages(total_items, page_size);
        let page = self.page.clamp(1, total_pages);

        let items = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        CatalogPage {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}

/// Never less than one, so an empty catalog still renders page 1.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

/// Up to [`PAGE_WINDOW`] page numbers centred on `current`.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let half = PAGE_WINDOW / 2;

    let mut start = current.saturating_sub(half).max(1);
    let end = (start + PAGE_WINDOW - 1).min(total);
    if end + 1 - start < PAGE_WINDOW {
        start = (end + 1).saturating_sub(PAGE_WINDOW).max(1);
    }
    (start..=end).collect()
}

/// `"all"` followed by each distinct type in the order first seen.
pub fn artifact_types(artifacts: &[Artifact]) -> Vec<String> {
    let mut types = vec![ALL_TYPES.to_string()];
    for artifact_type in artifacts.iter().filter_map(|a| a.artifact_type.as_deref()) {
        if !types.iter().any(|t| t == artifact_type) {
            types.push(artifact_type.to_string());
        }
    }
    types
}
