//! Similarity scoring between reference text and a transcription
//!
//! Ratcliff/Obershelp matching: repeatedly take the longest common block,
//! recurse on both sides, and report `2 * matched / (len(a) + len(b))`.
//! Strings are compared per Unicode scalar value with no normalization.
//! No junk heuristics, so `score(s, s)` is exactly 1.0.

use std::collections::HashMap;

/// Computes a [0, 1] similarity ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Two empty strings score 1.0
    pub fn score(&self, reference: &str, candidate: &str) -> f64 {
        let a: Vec<char> = reference.chars().collect();
        let b: Vec<char> = candidate.chars().collect();

        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }

        let matched = BlockMatcher::new(&a, &b).matched_chars();
        (2.0 * matched as f64 / total as f64).clamp(0.0, 1.0)
    }
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, ascending
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            b_index.entry(*ch).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Total size of all matching blocks
    fn matched_chars(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        matched
    }

    /// Longest block `a[i..i+size] == b[j..j+size]` inside the window.
    /// Ties go to the smallest `i`, then the smallest `j`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // run length of the match ending at b[j] for the previous row of a
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_runs: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = if j > 0 {
                        run_ending_at.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let run = previous + 1;
                    next_runs.insert(j, run);
                    if run > best_size {
                        best_i = i + 1 - run;
                        best_j = j + 1 - run;
                        best_size = run;
                    }
                }
            }
            run_ending_at = next_runs;
        }

        (best_i, best_j, best_size)
    }
}
