//! Scope-tree builder and renderer

use mos_model::{Clip, Fork, Placement, PlacementId, Time};
use mos_session::{PlacementIndex, SessionError};
use std::fmt::Write as _;

/// Largest tree [`build_tree`] agrees to build
pub const MAX_TREE_SIZE: usize = 1_000_000;

/// Tree building errors
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("tree of depth {depth} and width {width} exceeds {limit} placements")]
    TooLarge {
        depth: usize,
        width: usize,
        limit: usize,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Placements in a regular tree below the root; `None` on overflow
#[must_use]
pub fn tree_size(depth: usize, width: usize) -> Option<usize> {
    match width {
        0 => return Some(0),
        1 => return Some(depth),
        _ => {}
    }
    let mut total = 0usize;
    let mut level = 1usize;
    for _ in 0..depth {
        level = level.checked_mul(width)?;
        total = total.checked_add(level)?;
    }
    Some(total)
}

/// Populate `index` with a regular tree of forks, clips at the leaves
///
/// Returns the ids of all inserted placements, parents before children.
///
/// # Errors
/// - `TooLarge` beyond [`MAX_TREE_SIZE`] placements; nothing is inserted
/// - insertion failures
pub fn build_tree(
    index: &mut PlacementIndex,
    depth: usize,
    width: usize,
) -> Result<Vec<PlacementId>, TreeError> {
    let size = tree_size(depth, width)
        .filter(|&size| size <= MAX_TREE_SIZE)
        .ok_or(TreeError::TooLarge {
            depth,
            width,
            limit: MAX_TREE_SIZE,
        })?;

    let mut inserted = Vec::with_capacity(size);
    let mut level = vec![index.root_id()];
    for d in 1..=depth {
        if level.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(level.len().saturating_mul(width));
        for parent in level {
            for w in 0..width {
                let placement = if d == depth {
                    Placement::new(Clip::new(format!("clip-{d}-{w}.mov"), Time::from_secs(5)))
                } else {
                    Placement::new(Fork::new(format!("fork-{d}-{w}")))
                };
                let id = index.insert(placement, parent)?;
                inserted.push(id);
                next.push(id);
            }
        }
        level = next;
    }
    tracing::debug!("Built scope tree: {} placements", inserted.len());
    Ok(inserted)
}

/// ASCII rendering of the scope tree below the root
///
/// Siblings are ordered by their display text, so equal trees render
/// equally.
#[must_use]
pub fn render_tree(index: &PlacementIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", index.root().subject().short_id());
    render_members(index, index.root_id(), "", &mut out);
    out
}

fn render_members(index: &PlacementIndex, scope: PlacementId, prefix: &str, out: &mut String) {
    let Ok(members) = index.get_referrers(scope) else {
        return;
    };
    let mut members: Vec<_> = members.map(|p| (p.subject().short_id(), p.id())).collect();
    members.sort();

    let last = members.len().saturating_sub(1);
    for (i, (label, id)) in members.into_iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{label}");
        render_members(index, id, &format!("{prefix}{indent}"), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mos_model::ModelRoot;

    #[test]
    fn builds_full_tree() {
        let mut index = PlacementIndex::new(Placement::new(ModelRoot::new("t")));
        let ids = build_tree(&mut index, 3, 2).unwrap();
        assert_eq!(ids.len(), 2 + 4 + 8);
        assert_eq!(index.len(), 14);
        assert!(index.is_valid());
    }

    #[test]
    fn oversized_tree_is_refused() {
        let mut index = PlacementIndex::new(Placement::new(ModelRoot::new("t")));
        assert_eq!(tree_size(3, 10), Some(1110));
        assert_eq!(tree_size(64, usize::MAX), None);
        assert_eq!(tree_size(usize::MAX, 1), Some(usize::MAX));
        assert_eq!(tree_size(usize::MAX, 0), Some(0));
        assert!(matches!(
            build_tree(&mut index, 64, usize::MAX),
            Err(TreeError::TooLarge { .. })
        ));
        assert!(matches!(
            build_tree(&mut index, 2, 2000),
            Err(TreeError::TooLarge { limit: MAX_TREE_SIZE, .. })
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn zero_depth_is_empty() {
        let mut index = PlacementIndex::new(Placement::new(ModelRoot::new("t")));
        assert!(build_tree(&mut index, 0, 5).unwrap().is_empty());
        assert_eq!(render_tree(&index).lines().count(), 1);
    }

    #[test]
    fn renders_one_line_per_placement() {
        let mut index = PlacementIndex::new(Placement::new(ModelRoot::new("t")));
        build_tree(&mut index, 2, 2).unwrap();
        let text = render_tree(&index);
        assert_eq!(text.lines().count(), 1 + 2 + 4);
        assert!(text.contains("├── "));
        assert!(text.contains("    └── "));
    }
}
