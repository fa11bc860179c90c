// Copyright 2022 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use common_exception::ErrorCode;
use common_exception::Result;

use crate::reader::IndexReader;

/// A contiguous half-open document range inside one index segment
/// (§3 "Partial-leaf range"). Doc ids are leaf-local: `[min_doc,
/// max_doc)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialLeafRange {
    pub leaf_ord: usize,
    pub min_doc: u32,
    pub max_doc: u32,
}

impl PartialLeafRange {
    pub fn doc_count(&self) -> u32 {
        self.max_doc - self.min_doc
    }
}

/// Groups whole leaves into at most this many documents per slice
/// (§4.3 "segment_slice").
pub const MAX_DOCS_PER_SLICE: u64 = 250_000;
/// ... or at most this many segments, whichever bound is hit first.
pub const MAX_SEGMENTS_PER_SLICE: usize = 5;

fn leaf_bases(reader: &dyn IndexReader) -> Vec<u64> {
    let mut base = 0u64;
    let mut bases = Vec::with_capacity(reader.leaves().len());
    for leaf in reader.leaves() {
        bases.push(base);
        base += leaf.max_doc as u64;
    }
    bases
}

/// Maps one global, half-open doc range `[start, end)` (over the
/// concatenation of all leaves) to the partial-leaf ranges it crosses.
fn global_range_to_partial_leaves(
    reader: &dyn IndexReader,
    bases: &[u64],
    mut start: u64,
    end: u64,
) -> Vec<PartialLeafRange> {
    let mut out = Vec::new();
    for (idx, leaf) in reader.leaves().iter().enumerate() {
        if start >= end {
            break;
        }
        let leaf_base = bases[idx];
        let leaf_end = leaf_base + leaf.max_doc as u64;
        if leaf_end <= start {
            continue;
        }
        let range_start = start.max(leaf_base);
        let range_end = end.min(leaf_end);
        if range_start < range_end {
            out.push(PartialLeafRange {
                leaf_ord: leaf.ord,
                min_doc: (range_start - leaf_base) as u32,
                max_doc: (range_end - leaf_base) as u32,
            });
            start = range_end;
        }
    }
    out
}

/// Partitions the shard's documents into contiguous ranges of roughly
/// equal size (§4.3 "Document slicing").
///
/// The effective slice count is `min(n, total_docs)`: when `n` exceeds
/// the number of documents, each extra slice would otherwise be empty,
/// so `n` is first clamped down to `total_docs` and the `total_docs %
/// n` / `total_docs / n` split (§4.3) is applied to the clamped count.
/// This is the only reading under which the §8 invariant "slice count
/// equals `min(n, total_docs)`" and the "first slice absorbs the
/// remainder" rule are simultaneously satisfiable.
pub fn doc_slice(reader: &dyn IndexReader, n: usize) -> Result<Vec<Vec<PartialLeafRange>>> {
    if n == 0 {
        return Err(ErrorCode::BadArguments("doc_slice requires n >= 1"));
    }

    let total_docs = reader.max_doc() as u64;
    if total_docs == 0 {
        return Ok(Vec::new());
    }

    let effective_n = (n as u64).min(total_docs) as usize;
    let base_size = total_docs / effective_n as u64;
    let extra = total_docs % effective_n as u64;

    let bases = leaf_bases(reader);
    let mut slices = Vec::with_capacity(effective_n);
    let mut cursor = 0u64;
    for i in 0..effective_n {
        let size = if i == 0 { base_size + extra } else { base_size };
        let end = cursor + size;
        slices.push(global_range_to_partial_leaves(reader, &bases, cursor, end));
        cursor = end;
    }

    Ok(slices)
}

/// Groups whole leaves using the bounds named in §4.3: a slice
/// accumulates leaves until adding the next one would exceed either
/// `MAX_DOCS_PER_SLICE` or `MAX_SEGMENTS_PER_SLICE`, at which point a
/// new slice starts. A single oversized leaf still forms its own
/// slice, since segment slicing never splits a leaf.
pub fn segment_slice(reader: &dyn IndexReader) -> Vec<Vec<PartialLeafRange>> {
    let mut slices = Vec::new();
    let mut current: Vec<PartialLeafRange> = Vec::new();
    let mut current_docs = 0u64;

    for leaf in reader.leaves() {
        let would_exceed_docs = current_docs + leaf.max_doc as u64 > MAX_DOCS_PER_SLICE;
        let would_exceed_segments = current.len() + 1 > MAX_SEGMENTS_PER_SLICE;

        if !current.is_empty() && (would_exceed_docs || would_exceed_segments) {
            slices.push(std::mem::take(&mut current));
            current_docs = 0;
        }

        current_docs += leaf.max_doc as u64;
        current.push(PartialLeafRange {
            leaf_ord: leaf.ord,
            min_doc: 0,
            max_doc: leaf.max_doc,
        });
    }

    if !current.is_empty() {
        slices.push(current);
    }

    slices
}
