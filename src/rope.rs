//! Persistent byte rope.
//!
//! A [`Rope`] is an immutable binary tree over byte spans. Every edit returns
//! a new rope that shares all untouched subtrees (and the bytes behind every
//! leaf) with its input, so older ropes stay valid for as long as a document
//! snapshot holds them.
//!
//! Internal nodes carry a `weight`: the byte length of their left subtree.
//! Lookups and splits descend by comparing against it. Every node also counts
//! the newlines below it, so row lookups descend the same way.
//!
//! # Example
//!
//! ```
//! use tked::rope::Rope;
//!
//! let rope = Rope::from("hello");
//! let edited = rope.insert(2, "XY");
//! assert_eq!(edited.to_string(), "heXYllo");
//! assert_eq!(rope.to_string(), "hello");
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Depth past which a concatenation rebuilds the tree balanced.
///
/// Rebalancing only allocates new internal nodes; leaves are reused as-is.
const MAX_DEPTH: usize = 48;

/// Largest leaf [`Rope::new`] creates. Bigger inputs become a balanced tree
/// of leaves over one shared allocation.
const LEAF_SIZE: usize = 4096;

#[derive(Debug)]
enum Node {
    Leaf {
        data: Arc<[u8]>,
        start: usize,
        end: usize,
        newlines: usize,
    },
    Branch {
        weight: usize,
        len: usize,
        newlines: usize,
        depth: usize,
        left: Arc<Node>,
        right: Arc<Node>,
    },
}

impl Node {
    fn leaf(data: Arc<[u8]>, start: usize, end: usize) -> Arc<Self> {
        let newlines = count_newlines(&data[start..end]);
        Arc::new(Self::Leaf {
            data,
            start,
            end,
            newlines,
        })
    }

    fn branch(left: Arc<Self>, right: Arc<Self>) -> Arc<Self> {
        let weight = left.len();
        Arc::new(Self::Branch {
            weight,
            len: weight + right.len(),
            newlines: left.newlines() + right.newlines(),
            depth: 1 + left.depth().max(right.depth()),
            left,
            right,
        })
    }

    const fn len(&self) -> usize {
        match self {
            Self::Leaf { start, end, .. } => *end - *start,
            Self::Branch { len, .. } => *len,
        }
    }

    const fn newlines(&self) -> usize {
        match self {
            Self::Leaf { newlines, .. } | Self::Branch { newlines, .. } => *newlines,
        }
    }

    const fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Branch { depth, .. } => *depth,
        }
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

fn concat(left: Option<Arc<Node>>, right: Option<Arc<Node>>) -> Option<Arc<Node>> {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(left), Some(right)) => {
            let node = Node::branch(left, right);
            if node.depth() > MAX_DEPTH {
                Some(rebalance(&node))
            } else {
                Some(node)
            }
        }
    }
}

fn split(node: &Arc<Node>, idx: usize) -> (Option<Arc<Node>>, Option<Arc<Node>>) {
    match node.as_ref() {
        Node::Leaf {
            data, start, end, ..
        } => {
            if idx == 0 {
                (None, Some(Arc::clone(node)))
            } else if idx >= end - start {
                (Some(Arc::clone(node)), None)
            } else {
                let mid = start + idx;
                (
                    Some(Node::leaf(Arc::clone(data), *start, mid)),
                    Some(Node::leaf(Arc::clone(data), mid, *end)),
                )
            }
        }
        Node::Branch {
            weight,
            left,
            right,
            ..
        } => {
            if idx < *weight {
                let (l, r) = split(left, idx);
                (l, concat(r, Some(Arc::clone(right))))
            } else if idx > *weight {
                let (l, r) = split(right, idx - weight);
                (concat(Some(Arc::clone(left)), l), r)
            } else {
                (Some(Arc::clone(left)), Some(Arc::clone(right)))
            }
        }
    }
}

fn rebalance(node: &Arc<Node>) -> Arc<Node> {
    let leaves: Vec<Arc<Node>> = LeafIter::new(Some(node)).cloned().collect();
    build_balanced(&leaves)
}

/// Balanced tree over `leaves`, which must not be empty.
fn build_balanced(leaves: &[Arc<Node>]) -> Arc<Node> {
    if let [leaf] = leaves {
        return Arc::clone(leaf);
    }
    let (left, right) = leaves.split_at(leaves.len() / 2);
    Node::branch(build_balanced(left), build_balanced(right))
}

struct LeafIter<'a> {
    stack: Vec<&'a Arc<Node>>,
}

impl<'a> LeafIter<'a> {
    fn new(root: Option<&'a Arc<Node>>) -> Self {
        Self {
            stack: root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for LeafIter<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node.as_ref() {
                Node::Leaf { .. } => return Some(node),
                Node::Branch { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}

/// An immutable, structurally shared byte sequence.
///
/// Cloning is O(1). No operation mutates an existing rope.
#[derive(Clone, Default)]
pub struct Rope {
    root: Option<Arc<Node>>,
}

impl Rope {
    /// Copy `bytes` into a new rope.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Self::empty();
        }
        let data: Arc<[u8]> = Arc::from(bytes);
        let leaves: Vec<Arc<Node>> = (0..data.len())
            .step_by(LEAF_SIZE)
            .map(|start| Node::leaf(Arc::clone(&data), start, (start + LEAF_SIZE).min(data.len())))
            .collect();
        Self {
            root: Some(build_balanced(&leaves)),
        }
    }

    /// A rope with no content.
    pub const fn empty() -> Self {
        Self { root: None }
    }

    /// Build a rope from everything `source` yields.
    ///
    /// # Errors
    /// Returns the source's read error.
    pub fn read_all(mut source: impl Read) -> io::Result<Self> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Ok(Self::from(bytes))
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.len())
    }

    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of `\n` bytes.
    pub fn newlines(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.newlines())
    }

    /// Byte offset just past the `line`th newline, where line 0 starts at 0.
    ///
    /// Returns `None` when the rope has fewer than `line` newlines.
    pub fn line_start(&self, mut line: usize) -> Option<usize> {
        if line == 0 {
            return Some(0);
        }
        if line > self.newlines() {
            return None;
        }
        let mut node = self.root.as_deref()?;
        let mut offset = 0;
        loop {
            match node {
                Node::Leaf {
                    data, start, end, ..
                } => {
                    let pos = data[*start..*end]
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| **b == b'\n')
                        .nth(line - 1)
                        .map(|(pos, _)| pos)?;
                    return Some(offset + pos + 1);
                }
                Node::Branch {
                    weight,
                    left,
                    right,
                    ..
                } => {
                    if line <= left.newlines() {
                        node = left.as_ref();
                    } else {
                        line -= left.newlines();
                        offset += weight;
                        node = right.as_ref();
                    }
                }
            }
        }
    }

    /// Height of the underlying tree (0 for a single leaf or an empty rope).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.depth())
    }

    /// Split into `[0, idx)` and `[idx, len)`.
    ///
    /// Splitting at or past the end yields the whole rope and an empty one.
    pub fn split(&self, idx: usize) -> (Self, Self) {
        let Some(root) = self.root.as_ref() else {
            return (Self::empty(), Self::empty());
        };
        let (left, right) = split(root, idx);
        (Self { root: left }, Self { root: right })
    }

    /// Concatenate two ropes. An empty side returns the other unchanged.
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            root: concat(self.root.clone(), other.root.clone()),
        }
    }

    /// Insert `bytes` at `idx`.
    pub fn insert(&self, idx: usize, bytes: impl AsRef<[u8]>) -> Self {
        let (left, right) = self.split(idx);
        left.concat(&Self::new(bytes)).concat(&right)
    }

    /// Remove `[start, end)`. An empty or inverted range returns the rope unchanged.
    pub fn delete(&self, start: usize, end: usize) -> Self {
        if start >= end {
            return self.clone();
        }
        let (left, rest) = self.split(start);
        let (_, right) = rest.split(end - start);
        left.concat(&right)
    }

    /// The byte at `idx`, or `None` when `idx` is outside `[0, len)`.
    pub fn index(&self, mut idx: usize) -> Option<u8> {
        if idx >= self.len() {
            return None;
        }
        let mut node = self.root.as_deref()?;
        loop {
            match node {
                Node::Leaf {
                    data, start, end, ..
                } => {
                    let pos = start + idx;
                    return if pos < *end { data.get(pos).copied() } else { None };
                }
                Node::Branch {
                    weight,
                    left,
                    right,
                    ..
                } => {
                    if idx < *weight {
                        node = left.as_ref();
                    } else {
                        idx -= weight;
                        node = right.as_ref();
                    }
                }
            }
        }
    }

    /// Leaf byte slices in order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            leaves: LeafIter::new(self.root.as_ref()),
        }
    }

    /// All bytes in order.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks().flat_map(|chunk| chunk.iter().copied())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Stream the content into `sink`, returning the number of bytes written.
    ///
    /// # Errors
    /// Returns the first error reported by `sink`.
    pub fn write_to(&self, sink: &mut impl Write) -> io::Result<u64> {
        let mut written = 0u64;
        for chunk in self.chunks() {
            sink.write_all(chunk)?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}

/// Iterator over a rope's leaf slices.
pub struct Chunks<'a> {
    leaves: LeafIter<'a>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.leaves.next().map(|leaf| match leaf.as_ref() {
            Node::Leaf {
                data, start, end, ..
            } => &data[*start..*end],
            Node::Branch { .. } => &[],
        })
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Vec<u8>> for Rope {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.bytes().eq(other.bytes())
    }
}

impl Eq for Rope {}

/// Lossy UTF-8 rendering of the content.
impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rope").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(parts: &[&str]) -> Rope {
        parts
            .iter()
            .fold(Rope::empty(), |acc, part| acc.concat(&Rope::from(*part)))
    }

    // --- Construction ---

    #[test]
    fn test_new_len_and_string() {
        let rope = Rope::from("hello world");
        assert_eq!(rope.len(), 11);
        assert_eq!(rope.to_string(), "hello world");
    }

    #[test]
    fn test_empty_rope() {
        let rope = Rope::from("");
        assert!(rope.is_empty());
        assert_eq!(rope.len(), 0);
        assert_eq!(rope.to_string(), "");
        assert_eq!(rope.index(0), None);
    }

    // --- Concat ---

    #[test]
    fn test_concat_joins_content() {
        let rope = Rope::from("hello ").concat(&Rope::from("world"));
        assert_eq!(rope.to_string(), "hello world");
        assert_eq!(rope.len(), 11);
    }

    #[test]
    fn test_concat_with_empty_returns_other_side() {
        let rope = Rope::from("abc");
        assert_eq!(rope.concat(&Rope::empty()), rope);
        assert_eq!(Rope::empty().concat(&rope), rope);
        assert_eq!(rope.concat(&Rope::empty()).depth(), 0);
    }

    // --- Split ---

    #[test]
    fn test_split_in_middle() {
        let (left, right) = Rope::from("hello world").split(5);
        assert_eq!(left.to_string(), "hello");
        assert_eq!(right.to_string(), " world");
    }

    #[test]
    fn test_split_at_bounds() {
        let rope = Rope::from("abc");
        let (left, right) = rope.split(0);
        assert!(left.is_empty());
        assert_eq!(right.to_string(), "abc");

        let (left, right) = rope.split(3);
        assert_eq!(left.to_string(), "abc");
        assert!(right.is_empty());

        let (left, right) = rope.split(100);
        assert_eq!(left.to_string(), "abc");
        assert!(right.is_empty());
    }

    #[test]
    fn test_split_across_branches() {
        let rope = pieces(&["ab", "cd", "ef"]);
        for idx in 0..=6 {
            let (left, right) = rope.split(idx);
            assert_eq!(left.to_string(), &"abcdef"[..idx]);
            assert_eq!(right.to_string(), &"abcdef"[idx..]);
        }
    }

    #[test]
    fn test_split_does_not_mutate_input() {
        let rope = pieces(&["hello", " ", "world"]);
        let _ = rope.split(3);
        let _ = rope.split(8);
        assert_eq!(rope.to_string(), "hello world");
    }

    // --- Insert / Delete ---

    #[test]
    fn test_insert_into_middle() {
        let rope = Rope::from("hello").insert(2, "XY");
        assert_eq!(rope.to_string(), "heXYllo");
    }

    #[test]
    fn test_insert_at_ends() {
        let rope = Rope::from("mid");
        assert_eq!(rope.insert(0, "<").to_string(), "<mid");
        assert_eq!(rope.insert(3, ">").to_string(), "mid>");
    }

    #[test]
    fn test_delete_range() {
        let rope = Rope::from("hello").delete(1, 2);
        assert_eq!(rope.to_string(), "hllo");
    }

    #[test]
    fn test_delete_empty_or_inverted_range_is_noop() {
        let rope = Rope::from("hello");
        assert_eq!(rope.delete(2, 2), rope);
        assert_eq!(rope.delete(4, 1), rope);
    }

    #[test]
    fn test_delete_everything() {
        let rope = pieces(&["he", "llo"]).delete(0, 5);
        assert!(rope.is_empty());
    }

    #[test]
    fn test_edits_leave_original_untouched() {
        let original = Rope::from("hello");
        let inserted = original.insert(5, " world");
        let deleted = inserted.delete(0, 6);
        assert_eq!(original.to_string(), "hello");
        assert_eq!(inserted.to_string(), "hello world");
        assert_eq!(deleted.to_string(), "world");
    }

    // --- Index ---

    #[test]
    fn test_index_walks_branches() {
        let rope = pieces(&["ab", "c", "def"]);
        let collected: Vec<u8> = (0..rope.len()).filter_map(|i| rope.index(i)).collect();
        assert_eq!(collected, b"abcdef");
    }

    #[test]
    fn test_index_out_of_range_is_none() {
        let rope = Rope::from("abc");
        assert_eq!(rope.index(3), None);
        assert_eq!(rope.index(usize::MAX), None);
    }

    // --- Streaming ---

    #[test]
    fn test_write_to_reports_byte_count() {
        let rope = pieces(&["one ", "two ", "three"]);
        let mut out = Vec::new();
        let written = rope.write_to(&mut out).unwrap();
        assert_eq!(written, 13);
        assert_eq!(out, b"one two three");
    }

    #[test]
    fn test_read_all_builds_rope() {
        let rope = Rope::read_all(&b"streamed bytes"[..]).unwrap();
        assert_eq!(rope.to_string(), "streamed bytes");
    }

    #[test]
    fn test_read_all_surfaces_source_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            }
        }
        let err = Rope::read_all(Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_write_to_surfaces_sink_error() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = Rope::from("data").write_to(&mut Full).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
    }

    // --- Depth bound ---

    #[test]
    fn test_many_small_edits_keep_depth_bounded() {
        let mut rope = Rope::empty();
        for i in 0..5_000 {
            let at = rope.len() / 2;
            rope = rope.insert(at, if i % 2 == 0 { "a" } else { "b" });
        }
        assert_eq!(rope.len(), 5_000);
        assert!(rope.depth() <= MAX_DEPTH, "depth {} too large", rope.depth());
    }

    #[test]
    fn test_rebalance_preserves_content() {
        let mut rope = Rope::empty();
        let mut expected = String::new();
        for i in 0..200 {
            let piece = format!("{i},");
            rope = rope.concat(&Rope::from(piece.as_str()));
            expected.push_str(&piece);
        }
        assert_eq!(rope.to_string(), expected);
        assert!(rope.depth() <= MAX_DEPTH);
    }

    #[test]
    fn test_large_input_is_split_into_shared_leaves() {
        let text = "0123456789\n".repeat(1_000);
        let rope = Rope::from(text.as_str());
        assert!(rope.depth() > 0);
        assert!(rope.chunks().all(|chunk| chunk.len() <= LEAF_SIZE));
        assert_eq!(rope.len(), text.len());
        assert_eq!(rope.to_string(), text);
    }

    // --- Rows ---

    #[test]
    fn test_newlines_counted_across_edits() {
        let rope = pieces(&["a\nb", "\n", "c\nd"]);
        assert_eq!(rope.newlines(), 3);
        assert_eq!(rope.insert(1, "\n\n").newlines(), 5);
        assert_eq!(rope.delete(0, 4).newlines(), 1);
        assert_eq!(Rope::empty().newlines(), 0);
    }

    #[test]
    fn test_line_start_finds_offsets() {
        let rope = pieces(&["ab\n", "c", "d\n\ne"]);
        assert_eq!(rope.line_start(0), Some(0));
        assert_eq!(rope.line_start(1), Some(3));
        assert_eq!(rope.line_start(2), Some(6));
        assert_eq!(rope.line_start(3), Some(7));
        assert_eq!(rope.line_start(4), None);
    }

    #[test]
    fn test_line_start_in_large_rope() {
        let text: String = (0..20_000).map(|i| format!("line {i}\n")).collect();
        let rope = Rope::from(text.as_str());
        assert_eq!(rope.newlines(), 20_000);
        let expected = text.find("line 15000\n").unwrap();
        assert_eq!(rope.line_start(15_000), Some(expected));
        assert_eq!(rope.line_start(20_000), Some(text.len()));
    }

    #[test]
    fn test_display_is_lossy_across_chunks() {
        // "é" split across two leaves still renders correctly.
        let bytes = "é".as_bytes();
        let rope = Rope::new(&bytes[..1]).concat(&Rope::new(&bytes[1..]));
        assert_eq!(rope.to_string(), "é");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_rope() -> impl Strategy<Value = (Rope, String)> {
            prop::collection::vec("[a-z\\n\\t]{0,8}", 0..12).prop_map(|parts| {
                let text = parts.concat();
                let rope = parts
                    .iter()
                    .fold(Rope::empty(), |acc, part| acc.concat(&Rope::from(part.as_str())));
                (rope, text)
            })
        }

        proptest! {
            #[test]
            fn split_then_concat_restores_content(
                (rope, text) in arb_rope(),
                at in 0..64usize,
            ) {
                let idx = at.min(text.len());
                let (left, right) = rope.split(idx);
                prop_assert_eq!(left.concat(&right).to_string(), text);
            }

            #[test]
            fn insert_then_delete_is_identity(
                (rope, text) in arb_rope(),
                at in 0..64usize,
                inserted in "[a-z]{1,6}",
            ) {
                let idx = at.min(text.len());
                let edited = rope.insert(idx, &inserted);
                let restored = edited.delete(idx, idx + inserted.len());
                prop_assert_eq!(restored.to_string(), text);
            }

            #[test]
            fn line_start_matches_flat_scan((rope, text) in arb_rope()) {
                let starts: Vec<usize> = std::iter::once(0)
                    .chain(text.match_indices('\n').map(|(i, _)| i + 1))
                    .collect();
                prop_assert_eq!(rope.newlines(), starts.len() - 1);
                for (line, start) in starts.iter().enumerate() {
                    prop_assert_eq!(rope.line_start(line), Some(*start));
                }
                prop_assert_eq!(rope.line_start(starts.len()), None);
            }

            #[test]
            fn index_matches_flat_bytes((rope, text) in arb_rope()) {
                for (i, byte) in text.bytes().enumerate() {
                    prop_assert_eq!(rope.index(i), Some(byte));
                }
                prop_assert_eq!(rope.index(text.len()), None);
            }
        }
    }
}
