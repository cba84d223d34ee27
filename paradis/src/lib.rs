//! paradis
//! =======
//!
//! Parallel scatter into shared storage over disjoint subsets of indices.
//!
//! In a spectral-element mesh, neighboring elements share the global degrees of freedom on
//! their common edges and corners. Accumulating element contributions concurrently into a
//! global array therefore races unless the elements processed at the same time touch
//! disjoint sets of indices. [`DisjointSubsets`] represents such a set of elements, and
//! [`coloring::sequential_greedy_coloring`] partitions an arbitrary collection of index sets
//! into a sequence of them.

pub mod coloring;
pub mod slice;

use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// Access to the records of a shared collection that are addressed by one subset.
///
/// Records are addressed by their *local* index in the subset, i.e. the position of the
/// global index in [`SubsetAccess::global_indices`].
pub struct SubsetAccess<'data, Access> {
    subset_label: usize,
    global_indices: &'data [usize],
    access: Access,
}

impl<'data, Access> SubsetAccess<'data, Access> {
    pub fn global_indices(&self) -> &[usize] {
        self.global_indices
    }

    /// The label attached to the subset, typically the index of the element it belongs to.
    pub fn label(&self) -> usize {
        self.subset_label
    }

    pub fn len(&self) -> usize {
        self.global_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_indices.is_empty()
    }

    pub fn get<'b>(&'b self, local_index: usize) -> <Access as ParallelIndexedAccess<'b>>::Record
    where
        'data: 'b,
        Access: ParallelIndexedAccess<'b>,
    {
        let global_index = self.global_indices[local_index];
        // The subset is disjoint from every other subset handed out concurrently, and
        // all indices were checked against the length of the storage.
        unsafe { self.access.get_unchecked(global_index) }
    }

    pub fn get_mut<'b>(&'b mut self, local_index: usize) -> <Access as ParallelIndexedAccess<'b>>::RecordMut
    where
        'data: 'b,
        Access: ParallelIndexedAccess<'b>,
    {
        let global_index = self.global_indices[local_index];
        unsafe { self.access.get_unchecked_mut(global_index) }
    }
}

/// Facilitates parallel access to (mutable) records stored in a collection.
///
/// # Safety
///
/// An implementor must ensure that it is sound for multiple threads to access a single record
/// *immutably*, provided that no thread accesses the same record mutably, and that it is sound
/// for multiple threads to access *disjoint* records mutably.
///
/// The consumer must make sure that a record accessed mutably is never accessed by any other
/// thread at the same time, and that a single thread never holds two records for the same
/// index if either of them is mutable.
pub unsafe trait ParallelIndexedAccess<'record>: Sync + Send + Clone {
    type Record;
    type RecordMut;

    unsafe fn get_unchecked(&self, index: usize) -> Self::Record;
    unsafe fn get_unchecked_mut(&self, index: usize) -> Self::RecordMut;
}

/// An indexed collection that exposes parallel indexed access to its contents.
///
/// # Safety
///
/// Consumers may access records with indices in `[0, len)` through the access returned by
/// [`ParallelIndexedCollection::create_access`], so an incorrect length is unsound.
pub unsafe trait ParallelIndexedCollection<'a> {
    type Access;

    unsafe fn create_access(&'a mut self) -> Self::Access;
    fn len(&self) -> usize;
}

/// A labeled collection of index subsets in which no two subsets share an index.
///
/// An index may appear several times within the same subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisjointSubsets {
    // Largest index in any subset, used to bounds-check the storage once per iteration
    // instead of once per access.
    max_index: Option<usize>,
    // Subset `i` is stored in `indices[offsets[i] .. offsets[i + 1]]`.
    offsets: Vec<usize>,
    indices: Vec<usize>,
    labels: Vec<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubsetsNotDisjointError {
    /// An index contained in more than one subset.
    pub shared_index: usize,
}

impl fmt::Display for SubsetsNotDisjointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index {} is contained in more than one subset", self.shared_index)
    }
}

impl Error for SubsetsNotDisjointError {}

impl DisjointSubsets {
    /// Creates disjoint subsets from the given subsets, verifying that they are disjoint.
    ///
    /// # Panics
    ///
    /// Panics if the number of labels differs from the number of subsets.
    pub fn try_from_subsets<S>(subsets: &[S], labels: Vec<usize>) -> Result<Self, SubsetsNotDisjointError>
    where
        S: AsRef<[usize]>,
    {
        assert_eq!(subsets.len(), labels.len(), "Must have exactly one label per subset.");

        let mut global_index_set = HashSet::new();
        // Duplicates within a subset are fine, so deduplicate locally before
        // checking against the indices of the other subsets
        let mut local_index_set = HashSet::new();

        for subset in subsets {
            local_index_set.clear();
            local_index_set.extend(subset.as_ref().iter().copied());
            for &idx in &local_index_set {
                if !global_index_set.insert(idx) {
                    return Err(SubsetsNotDisjointError { shared_index: idx });
                }
            }
        }

        let mut offsets = Vec::with_capacity(subsets.len() + 1);
        let mut indices = Vec::new();
        offsets.push(0);
        for subset in subsets {
            indices.extend_from_slice(subset.as_ref());
            offsets.push(indices.len());
        }
        let max_index = indices.iter().copied().max();

        Ok(Self {
            max_index,
            offsets,
            indices,
            labels,
        })
    }

    /// Creates disjoint subsets from a flat offset/index representation without checking that
    /// the subsets are disjoint.
    ///
    /// # Safety
    ///
    /// The subsets must be pairwise disjoint and `max_index` must be the largest index
    /// contained in any subset. Parallel iteration relies on both for soundness.
    pub unsafe fn from_disjoint_subsets_unchecked(
        offsets: Vec<usize>,
        indices: Vec<usize>,
        labels: Vec<usize>,
        max_index: Option<usize>,
    ) -> Self {
        assert_eq!(offsets.len(), labels.len() + 1, "Must have exactly one label per subset.");
        assert_eq!(offsets.last().copied(), Some(indices.len()));
        Self {
            max_index,
            offsets,
            indices,
            labels,
        }
    }

    /// The number of subsets.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn subset(&self, index: usize) -> Option<&[usize]> {
        let begin = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(&self.indices[begin..end])
    }

    pub fn subsets(&self) -> impl '_ + ExactSizeIterator<Item = &[usize]> {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    /// Create a parallel iterator over the subsets, giving each subset access to the
    /// records of `storage` addressed by its indices.
    ///
    /// Panics if any subset contains an index that exceeds the length reported by `storage`.
    pub fn subsets_par_iter<'a, Storage>(
        &'a self,
        storage: &'a mut Storage,
    ) -> impl 'a + IndexedParallelIterator<Item = SubsetAccess<'a, Storage::Access>>
    where
        Storage: ?Sized + ParallelIndexedCollection<'a>,
        Storage::Access: 'a + Send + Sync + Clone,
    {
        assert!(
            self.max_index.map_or(true, |max_index| max_index < storage.len()),
            "Subsets contain indices out of bounds."
        );
        // Creating the access consumes the only mutable borrow of the storage, and the subsets
        // are disjoint, so no record is handed out mutably to two subsets
        let access = unsafe { storage.create_access() };

        (0..self.len()).into_par_iter().map(move |subset_idx| {
            let begin = self.offsets[subset_idx];
            let end = self.offsets[subset_idx + 1];
            SubsetAccess {
                subset_label: self.labels[subset_idx],
                global_indices: &self.indices[begin..end],
                access: access.clone(),
            }
        })
    }
}
