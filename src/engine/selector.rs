//! Stage selection from a question bank with no-repeat-until-exhaustion.
//! The used set is the caller's persisted memory; this module only mutates
//! it, the caller writes it back through the store.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::content::Question;

/// Pick up to `count` questions not yet in `used`, marking the picks used.
///
/// Exhaustion policy: a session never starves for content. If nothing is
/// unused, the used set is cleared and selection retries against the full
/// bank. If fewer than `count` remain, the remainder is taken whole and the
/// pool resets mid-selection to top the stage up; afterwards `used` holds
/// exactly the topped-up ids, so the next stage keeps avoiding repeats.
///
/// Returns an empty vec only for an empty bank, which callers treat as a
/// load error upstream.
pub fn select_stage(
    bank: &[Question],
    used: &mut HashSet<String>,
    count: usize,
    rng: &mut SmallRng,
) -> Vec<Question> {
    if bank.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut fresh: Vec<&Question> = bank.iter().filter(|q| !used.contains(&q.id)).collect();
    if fresh.is_empty() {
        used.clear();
        fresh = bank.iter().collect();
    }

    if fresh.len() > count {
        fresh.shuffle(rng);
        fresh.truncate(count);
        for q in &fresh {
            used.insert(q.id.clone());
        }
        return fresh.into_iter().cloned().collect();
    }

    // Short pool: take everything that's left, then reset and top up.
    let mut selection: Vec<Question> = fresh.into_iter().cloned().collect();
    for q in &selection {
        used.insert(q.id.clone());
    }

    if selection.len() < count && bank.len() > selection.len() {
        used.clear();
        let taken: HashSet<&str> = selection.iter().map(|q| q.id.as_str()).collect();
        let mut rest: Vec<&Question> = bank
            .iter()
            .filter(|q| !taken.contains(q.id.as_str()))
            .collect();
        rest.shuffle(rng);
        rest.truncate(count - selection.len());
        for q in &rest {
            used.insert(q.id.clone());
        }
        selection.extend(rest.into_iter().cloned());
    }

    selection
}
