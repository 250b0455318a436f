//! Mirror command: walk an HTML directory listing and download every file.
//!
//! Uses an explicit FIFO work queue with a depth limit and a visited set, so
//! link cycles and deep trees terminate predictably. Only relative links that
//! stay below the starting URL are followed.

use anyhow::{Context, Result};
use fasthttp_core::config::FetchConfig;
use fasthttp_core::planner::worker_count;
use fasthttp_core::Downloader;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use url::Url;

/// Counts reported when a mirror run finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorSummary {
    pub listings: usize,
    pub files: usize,
    pub skipped_depth: usize,
}

struct WorkItem {
    url: Url,
    dir: PathBuf,
    depth: usize,
}

pub async fn run_mirror(
    cfg: FetchConfig,
    url: String,
    dest: PathBuf,
    workers: u8,
    max_depth: usize,
) -> Result<()> {
    let root = Url::parse(&url).with_context(|| format!("\"{}\" is not a valid URL", url))?;
    let downloader = Downloader::new(cfg);
    let summary = tokio::task::spawn_blocking(move || {
        mirror(&downloader, root, &dest, workers, max_depth)
    })
    .await??;
    tracing::info!(
        listings = summary.listings,
        files = summary.files,
        skipped_depth = summary.skipped_depth,
        "mirror complete"
    );
    println!(
        "mirrored {} files from {} listings",
        summary.files, summary.listings
    );
    Ok(())
}

/// Mirror `root` into `dest`. The first failing download aborts the run.
pub fn mirror(
    downloader: &Downloader,
    mut root: Url,
    dest: &Path,
    workers: u8,
    max_depth: usize,
) -> Result<MirrorSummary> {
    let workers = match root.fragment() {
        Some(fragment) => workers_from_fragment(fragment),
        None => workers,
    };
    root.set_fragment(None);

    let href = Regex::new(r#"\shref="([^"]+)""#)?;
    let mut summary = MirrorSummary::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue = VecDeque::from([WorkItem {
        url: root.clone(),
        dir: dest.to_path_buf(),
        depth: 0,
    }]);

    while let Some(item) = queue.pop_front() {
        if !visited.insert(item.url.as_str().to_string()) {
            continue;
        }

        if !item.url.path().ends_with('/') {
            let target = item.dir.join(file_name(&item.url));
            tracing::debug!(url = %item.url, path = %target.display(), "mirroring file");
            downloader
                .fetch_to_file(item.url.as_str(), &target, workers)
                .with_context(|| format!("downloading {}", item.url))?;
            summary.files += 1;
            continue;
        }

        let listing = downloader
            .fetch_to_memory(item.url.as_str(), workers)
            .with_context(|| format!("reading listing {}", item.url))?;
        summary.listings += 1;
        let text = String::from_utf8_lossy(&listing);

        for link in extract_links(&href, &text) {
            // Files of a listing are always taken; only deeper listings count against the limit.
            if link.ends_with('/') && item.depth + 1 > max_depth {
                summary.skipped_depth += 1;
                tracing::warn!(url = %item.url, link, "max depth reached, skipping");
                continue;
            }
            let child = item
                .url
                .join(link)
                .with_context(|| format!("joining {} onto {}", link, item.url))?;
            if !child.as_str().starts_with(root.as_str()) {
                continue;
            }
            let dir = match link.strip_suffix('/') {
                Some(sub) => item.dir.join(sub),
                None => item.dir.clone(),
            };
            queue.push_back(WorkItem {
                url: child,
                dir,
                depth: item.depth + 1,
            });
        }
    }

    Ok(summary)
}

/// Relative links from a listing page, in document order.
///
/// Skips absolute paths, links with a scheme, parent links, and links carrying
/// a query or fragment (sort links on generated index pages).
pub(crate) fn extract_links<'a>(href: &Regex, html: &'a str) -> Vec<&'a str> {
    href.captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .filter(|link| {
            !link.is_empty()
                && !link.contains(':')
                && !link.starts_with('/')
                && !link.contains(['?', '#'])
                && !link.split('/').any(|seg| seg == ".." || seg == ".")
        })
        .collect()
}

/// Thread count from a URL fragment such as `#8`; anything else means 1.
pub(crate) fn workers_from_fragment(fragment: &str) -> u8 {
    fragment
        .parse::<u64>()
        .ok()
        .and_then(|n| worker_count(n).ok())
        .unwrap_or(1)
}

/// Last path segment, used as the local file name.
fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segs| segs.next_back().map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "index.html".to_string())
}
