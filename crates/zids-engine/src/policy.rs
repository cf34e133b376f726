use std::collections::HashMap;

/// ABP-style rule action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Allow,
    Block,
}

/// Final verdict for a scan (spec §4.6 "downstream policy").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block,
    NoMatch,
}

/// "Any ALLOW wins over any BLOCK; else BLOCK if any; else NOMATCH."
///
/// A rule id with no entry in `actions` defaults to `Block`, matching the
/// source's `id_to_action.get(rid, "BLOCK")`.
pub fn decide(hit_ids: &[u32], actions: &HashMap<u32, Action>) -> (Verdict, Vec<u32>) {
    let mut allow_hits = Vec::new();
    let mut block_hits = Vec::new();

    for &rid in hit_ids {
        match actions.get(&rid).copied().unwrap_or(Action::Block) {
            Action::Allow => allow_hits.push(rid),
            Action::Block => block_hits.push(rid),
        }
    }

    if !allow_hits.is_empty() {
        (Verdict::Allow, allow_hits)
    } else if !block_hits.is_empty() {
        (Verdict::Block, block_hits)
    } else {
        (Verdict::NoMatch, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_beats_block() {
        let mut actions = HashMap::new();
        actions.insert(1, Action::Block);
        actions.insert(2, Action::Allow);
        let (verdict, hits) = decide(&[1, 2], &actions);
        assert_eq!(verdict, Verdict::Allow);
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn block_when_no_allow() {
        let mut actions = HashMap::new();
        actions.insert(1, Action::Block);
        let (verdict, hits) = decide(&[1, 1], &actions);
        assert_eq!(verdict, Verdict::Block);
        assert_eq!(hits, vec![1, 1]);
    }

    #[test]
    fn no_match_for_empty_hits() {
        let (verdict, hits) = decide(&[], &HashMap::new());
        assert_eq!(verdict, Verdict::NoMatch);
        assert!(hits.is_empty());
    }

    #[test]
    fn unknown_rule_id_defaults_to_block() {
        let (verdict, hits) = decide(&[99], &HashMap::new());
        assert_eq!(verdict, Verdict::Block);
        assert_eq!(hits, vec![99]);
    }
}
