//! Word-level diff annotation and stats.
//!
//! Both texts are split on whitespace and aligned token by token. The
//! alignment is turned into [`Segment`]s that rebuild the revised text while
//! marking every span that differs from the original.
//!
//! Alignment takes the longest common run of tokens first and recurses on
//! the unmatched tokens to its left and right. Ties go to the run that starts
//! earliest in the original, then earliest in the revised text.

use std::collections::HashMap;
use std::ops::Range;

use checkr_types::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One alignment step: `old` indexes the original tokens, `new` the revised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub old: Range<usize>,
    pub new: Range<usize>,
}

/// Split `text` into comparison tokens, ignoring leading and trailing whitespace.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// A run of equal tokens: `original[old..old + len] == revised[new..new + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
    old: usize,
    new: usize,
    len: usize,
}

struct Matcher<'a> {
    original: &'a [&'a str],
    revised: &'a [&'a str],
    /// Positions of each revised token, ascending.
    positions: HashMap<&'a str, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(original: &'a [&'a str], revised: &'a [&'a str]) -> Self {
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, token) in revised.iter().enumerate() {
            positions.entry(*token).or_default().push(index);
        }
        Self {
            original,
            revised,
            positions,
        }
    }

    /// Longest run of equal tokens inside `old` x `new`.
    ///
    /// Among runs of the same length the one starting earliest in the
    /// original wins, then the one starting earliest in the revised text.
    fn longest_block(&self, old: Range<usize>, new: Range<usize>) -> Block {
        let mut best = Block {
            old: old.start,
            new: new.start,
            len: 0,
        };
        // run length ending at each revised position, for the previous original token
        let mut run_ending: HashMap<usize, usize> = HashMap::new();
        for i in old {
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(candidates) = self.positions.get(self.original[i]) {
                for &j in candidates {
                    if j < new.start {
                        continue;
                    }
                    if j >= new.end {
                        break;
                    }
                    let len = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending.get(&prev))
                        .map_or(1, |run| run + 1);
                    next_run.insert(j, len);
                    if len > best.len {
                        best = Block {
                            old: i + 1 - len,
                            new: j + 1 - len,
                            len,
                        };
                    }
                }
            }
            run_ending = next_run;
        }
        best
    }

    /// All matching blocks in order, adjacent runs collapsed, closed by an
    /// empty block at the end of both sequences.
    fn matching_blocks(&self) -> Vec<Block> {
        let old_len = self.original.len();
        let new_len = self.revised.len();

        let mut pending = vec![(0..old_len, 0..new_len)];
        let mut blocks = Vec::new();
        while let Some((old, new)) = pending.pop() {
            let block = self.longest_block(old.clone(), new.clone());
            if block.len == 0 {
                continue;
            }
            blocks.push(block);
            if old.start < block.old && new.start < block.new {
                pending.push((old.start..block.old, new.start..block.new));
            }
            let old_after = block.old + block.len;
            let new_after = block.new + block.len;
            if old_after < old.end && new_after < new.end {
                pending.push((old_after..old.end, new_after..new.end));
            }
        }
        blocks.sort_unstable();

        let mut collapsed: Vec<Block> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            if let Some(last) = collapsed.last_mut()
                && last.old + last.len == block.old
                && last.new + last.len == block.new
            {
                last.len += block.len;
                continue;
            }
            collapsed.push(block);
        }
        collapsed.push(Block {
            old: old_len,
            new: new_len,
            len: 0,
        });
        collapsed
    }
}

/// Compute the opcode sequence aligning `original` with `revised`.
///
/// Gaps between matching blocks become a single `Replace`, `Delete` or
/// `Insert`, so no two neighbouring opcodes share a tag.
#[must_use]
pub fn word_opcodes(original: &[&str], revised: &[&str]) -> Vec<Opcode> {
    let matcher = Matcher::new(original, revised);

    let mut ops = Vec::new();
    let mut old_pos = 0;
    let mut new_pos = 0;
    for block in matcher.matching_blocks() {
        let tag = match (old_pos < block.old, new_pos < block.new) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            ops.push(Opcode {
                tag,
                old: old_pos..block.old,
                new: new_pos..block.new,
            });
        }
        old_pos = block.old + block.len;
        new_pos = block.new + block.len;
        if block.len > 0 {
            ops.push(Opcode {
                tag: OpTag::Equal,
                old: block.old..old_pos,
                new: block.new..new_pos,
            });
        }
    }
    ops
}

/// Annotate `revised` against `original`.
///
/// - equal runs become `Unchanged` with the revised tokens
/// - replacements and insertions become `Changed` with the revised tokens
/// - deletions become an empty `Changed` placeholder
///
/// Joining the non-empty segment texts with single spaces yields the revised
/// tokens joined with single spaces. When there is nothing to align at all
/// (both texts blank) the result is a lone placeholder.
#[must_use]
pub fn annotate_revision(original: &str, revised: &str) -> Vec<Segment> {
    let old_tokens = tokenize(original);
    let new_tokens = tokenize(revised);

    let segments: Vec<Segment> = word_opcodes(&old_tokens, &new_tokens)
        .into_iter()
        .map(|op| {
            let text = new_tokens[op.new].join(" ");
            match op.tag {
                OpTag::Equal => Segment::Unchanged(text),
                OpTag::Replace | OpTag::Insert => Segment::Changed(text),
                OpTag::Delete => Segment::Changed(String::new()),
            }
        })
        .collect();

    if segments.is_empty() {
        return vec![Segment::Changed(String::new())];
    }
    segments
}

/// Count words added to and removed from `original` to produce `revised`.
#[must_use]
pub fn word_change_stats(original: &str, revised: &str) -> (u32, u32) {
    let old_tokens = tokenize(original);
    let new_tokens = tokenize(revised);

    let mut additions: u32 = 0;
    let mut deletions: u32 = 0;

    for op in word_opcodes(&old_tokens, &new_tokens) {
        match op.tag {
            OpTag::Insert => additions += op.new.len() as u32,
            OpTag::Delete => deletions += op.old.len() as u32,
            OpTag::Replace => {
                additions += op.new.len() as u32;
                deletions += op.old.len() as u32;
            }
            OpTag::Equal => {}
        }
    }

    (additions, deletions)
}
