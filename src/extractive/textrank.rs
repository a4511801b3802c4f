//! Sentence segmentation and TextRank scoring.

use std::collections::HashSet;

const DAMPING: f64 = 0.85;
const EPSILON: f64 = 1e-4;
const ZERO_DIVISION_PREVENTION: f64 = 1e-7;
const MAX_ITERATIONS: usize = 1000;

/// Split text into sentences.
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or
/// the end of the text, so decimals and abbreviations glued to the next
/// word ("3.14", "e.g.x") stay intact. Blank fragments are dropped.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        while let Some(&(_, next)) = chars.peek() {
            if is_terminator(next) {
                chars.next();
            } else {
                break;
            }
        }
        let boundary = match chars.peek() {
            None => text.len(),
            Some(&(idx, next)) if next.is_whitespace() => idx,
            Some(_) => continue,
        };
        push_trimmed(&mut sentences, &text[start..boundary]);
        start = boundary;
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        out.push(fragment);
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Lowercased content words of a sentence, duplicates kept.
pub(crate) fn content_words(sentence: &str, stop_words: &HashSet<&str>) -> Vec<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !stop_words.contains(w.as_str()))
        .collect()
}

/// Edge weight between two sentences: shared-word count normalised by
/// the log of both lengths.
fn edge_weight(a: &[String], b: &[String]) -> f64 {
    let shared: usize = a
        .iter()
        .map(|w| b.iter().filter(|other| *other == w).count())
        .sum();
    if shared == 0 {
        return 0.0;
    }
    let norm = (a.len() as f64).ln() + (b.len() as f64).ln();
    if norm.abs() < 1e-12 {
        // Both sentences are a single word.
        shared as f64
    } else {
        shared as f64 / norm
    }
}

/// TextRank score per sentence.
///
/// Returns `None` when there is nothing to rank or the scores are
/// unusable (non-finite, or no convergence).
pub(crate) fn rank(sentences: &[Vec<String>]) -> Option<Vec<f64>> {
    let n = sentences.len();
    if n == 0 {
        return None;
    }

    let mut weights = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in i..n {
            let w = edge_weight(&sentences[i], &sentences[j]);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }

    let teleport = (1.0 - DAMPING) / n as f64;
    for row in &mut weights {
        let sum: f64 = row.iter().sum::<f64>() + ZERO_DIVISION_PREVENTION;
        for w in row.iter_mut() {
            *w = teleport + DAMPING * (*w / sum);
        }
    }

    // Power iteration on the transposed matrix.
    let mut p = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        let next: Vec<f64> = (0..n)
            .map(|j| (0..n).map(|i| weights[i][j] * p[i]).sum())
            .collect();
        let delta = next
            .iter()
            .zip(&p)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        p = next;
        if !delta.is_finite() {
            return None;
        }
        if delta <= EPSILON {
            return p.iter().all(|x| x.is_finite()).then_some(p);
        }
    }
    None
}

/// Indices of the `count` best-scored sentences, in original order.
///
/// Ties keep the earlier sentence.
pub(crate) fn best_indices(scores: &[f64], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(count);
    order.sort_unstable();
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        content_words(s, &HashSet::new())
    }

    #[test]
    fn split_basic() {
        let s = split_sentences("One. Two! Three? Four");
        assert_eq!(s, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn split_keeps_decimals_and_terminator_runs() {
        let s = split_sentences("Pi is 3.14 roughly... Really?! Yes.");
        assert_eq!(s, vec!["Pi is 3.14 roughly...", "Really?!", "Yes."]);
    }

    #[test]
    fn split_empty_and_blank() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn content_words_strip_punctuation_and_stop_words() {
        let stop: HashSet<&str> = ["the"].into_iter().collect();
        assert_eq!(
            content_words("The Cat, the hat!", &stop),
            vec!["cat".to_string(), "hat".to_string()]
        );
    }

    #[test]
    fn edge_weight_no_overlap_is_zero() {
        assert_eq!(edge_weight(&words("red fox"), &words("blue whale")), 0.0);
    }

    #[test]
    fn edge_weight_single_words() {
        assert_eq!(edge_weight(&words("fox"), &words("fox")), 1.0);
    }

    #[test]
    fn rank_empty_is_none() {
        assert!(rank(&[]).is_none());
    }

    #[test]
    fn rank_sums_to_about_one() {
        let sentences = vec![
            words("rust compiler checks borrows"),
            words("the compiler rejects bad borrows"),
            words("cats sleep all day"),
        ];
        let scores = rank(&sentences).unwrap();
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 0.01, "total = {total}");
    }

    #[test]
    fn rank_prefers_central_sentence() {
        let sentences = vec![
            words("rust compiler borrow checker"),
            words("rust compiler"),
            words("borrow checker rust"),
            words("bananas are yellow"),
        ];
        let scores = rank(&sentences).unwrap();
        assert!(scores[0] > scores[3]);
        assert!(scores[2] > scores[3]);
    }

    #[test]
    fn best_indices_returns_original_order() {
        let scores = [0.1, 0.5, 0.2, 0.4];
        assert_eq!(best_indices(&scores, 2), vec![1, 3]);
    }

    #[test]
    fn best_indices_count_exceeds_len() {
        assert_eq!(best_indices(&[0.3, 0.7], 5), vec![0, 1]);
    }

    #[test]
    fn best_indices_ties_keep_earlier() {
        assert_eq!(best_indices(&[0.5, 0.5, 0.5], 1), vec![0]);
    }
}
