use crate::DisjointSubsets;
use std::cmp::max;
use std::mem;

/// Partitions the given index subsets into colors, each color a set of pairwise disjoint
/// subsets.
///
/// Subsets are labeled by their position in `subsets`. Every subset ends up in exactly one
/// color. Colors are filled greedily in order: a subset is placed in the first color in
/// which none of its indices has been claimed yet, so the first colors tend to be the
/// largest.
pub fn sequential_greedy_coloring<S>(subsets: &[S]) -> Vec<DisjointSubsets>
where
    S: AsRef<[usize]>,
{
    let mut colors = Vec::new();
    let mut postponed_subset_indices = Vec::new();
    let mut current_subset_indices: Vec<_> = (0..subsets.len()).collect();

    // For every index, the color that most recently claimed it. The table grows lazily
    // since the number of distinct indices is not known up front.
    let mut last_visited_color: Vec<Option<usize>> = Vec::new();

    let mut color_idx = 0;
    while !current_subset_indices.is_empty() {
        let mut offsets = vec![0];
        let mut indices = Vec::new();
        let mut labels = Vec::new();
        let mut max_index = None;

        for &subset_idx in &current_subset_indices {
            let subset = subsets[subset_idx].as_ref();
            let is_blocked = subset.iter().any(|&idx| {
                last_visited_color
                    .get(idx)
                    .map_or(false, |&visitor| visitor == Some(color_idx))
            });

            if is_blocked {
                postponed_subset_indices.push(subset_idx);
            } else {
                for &idx in subset {
                    max_index = Some(max_index.map_or(idx, |current| max(current, idx)));
                    if idx >= last_visited_color.len() {
                        // Amortize the cost of growing the table
                        last_visited_color.resize(2 * idx + 1, None);
                    }
                    last_visited_color[idx] = Some(color_idx);
                }
                indices.extend_from_slice(subset);
                offsets.push(indices.len());
                labels.push(subset_idx);
            }
        }

        debug_assert!({
            let color_subsets: Vec<_> = offsets.windows(2).map(|w| &indices[w[0]..w[1]]).collect();
            DisjointSubsets::try_from_subsets(&color_subsets, labels.clone()).is_ok()
        });

        // Disjoint by construction
        let color = unsafe { DisjointSubsets::from_disjoint_subsets_unchecked(offsets, indices, labels, max_index) };
        colors.push(color);

        mem::swap(&mut postponed_subset_indices, &mut current_subset_indices);
        postponed_subset_indices.clear();
        color_idx += 1;
    }

    colors
}
