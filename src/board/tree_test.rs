use super::*;
use crate::board::EditorDocument;

fn reply(id: i64, parent_id: Option<i64>, created_at: i64) -> Reply {
    Reply {
        id,
        board_id: 1,
        parent_id,
        author: format!("user{id}"),
        content: EditorDocument::from_plain_text(&format!("reply {id}")),
        created_at,
        deleted: false,
    }
}

fn deleted(mut r: Reply) -> Reply {
    r.deleted = true;
    r
}

fn rows(tree: &ReplyTree) -> Vec<(i64, usize)> {
    tree.flatten().iter().map(|v| (v.reply.id, v.depth)).collect()
}

// =============================================================
// Building
// =============================================================

#[test]
fn nests_children_under_parents() {
    let tree = ReplyTree::build(vec![
        reply(1, None, 10),
        reply(2, Some(1), 20),
        reply(3, Some(2), 30),
        reply(4, None, 40),
    ]);
    assert_eq!(rows(&tree), vec![(1, 0), (2, 1), (3, 2), (4, 0)]);
    assert_eq!(tree.count(), 4);
}

#[test]
fn siblings_sorted_by_time_then_id() {
    let tree = ReplyTree::build(vec![
        reply(5, None, 30),
        reply(3, None, 10),
        reply(2, None, 30),
    ]);
    assert_eq!(rows(&tree), vec![(3, 0), (2, 0), (5, 0)]);
}

#[test]
fn missing_parent_promoted_to_root() {
    let tree = ReplyTree::build(vec![reply(1, None, 10), reply(2, Some(99), 5)]);
    assert_eq!(rows(&tree), vec![(2, 0), (1, 0)]);
}

#[test]
fn self_parent_promoted_to_root() {
    let tree = ReplyTree::build(vec![reply(7, Some(7), 1)]);
    assert_eq!(rows(&tree), vec![(7, 0)]);
}

#[test]
fn parent_cycle_terminates_and_keeps_every_reply() {
    let tree = ReplyTree::build(vec![
        reply(1, Some(2), 10),
        reply(2, Some(1), 20),
        reply(3, None, 30),
    ]);
    let mut ids: Vec<i64> = tree.flatten().iter().map(|v| v.reply.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn empty_list_builds_empty_tree() {
    let tree = ReplyTree::build(Vec::new());
    assert!(tree.roots.is_empty());
    assert_eq!(tree.count(), 0);
}

// =============================================================
// Deleted replies
// =============================================================

#[test]
fn deleted_leaf_is_pruned() {
    let tree = ReplyTree::build(vec![reply(1, None, 1), deleted(reply(2, Some(1), 2))]);
    assert_eq!(rows(&tree), vec![(1, 0)]);
}

#[test]
fn deleted_parent_with_live_child_is_placeholder() {
    let tree = ReplyTree::build(vec![deleted(reply(1, None, 1)), reply(2, Some(1), 2)]);
    let views = tree.flatten();
    assert_eq!(views.len(), 2);
    assert!(views[0].placeholder);
    assert!(!views[1].placeholder);
}

#[test]
fn deleted_chain_without_live_leaf_is_pruned() {
    let tree = ReplyTree::build(vec![deleted(reply(1, None, 1)), deleted(reply(2, Some(1), 2))]);
    assert!(tree.roots.is_empty());
}

// =============================================================
// Flattening
// =============================================================

#[test]
fn flatten_capped_clamps_depth() {
    let tree = ReplyTree::build(vec![
        reply(1, None, 1),
        reply(2, Some(1), 2),
        reply(3, Some(2), 3),
        reply(4, Some(3), 4),
    ]);
    let depths: Vec<usize> = tree.flatten_capped(1).iter().map(|v| v.depth).collect();
    assert_eq!(depths, vec![0, 1, 1, 1]);
}

#[test]
fn very_deep_thread_builds_and_flattens() {
    const DEPTH: i64 = 50_000;
    let replies: Vec<Reply> = (1..=DEPTH).map(|id| reply(id, (id > 1).then(|| id - 1), id)).collect();

    let tree = ReplyTree::build(replies);
    assert_eq!(tree.count(), 50_000);
    let rows = tree.flatten();
    assert_eq!(rows.len(), 50_000);
    assert_eq!(rows.last().map(|v| (v.reply.id, v.depth)), Some((DEPTH, 49_999)));
}

#[test]
fn duplicate_reply_id_keeps_first() {
    let mut twin = reply(1, None, 2);
    twin.author = "twin".into();
    let tree = ReplyTree::build(vec![reply(1, None, 1), twin, reply(2, Some(1), 3)]);

    assert_eq!(rows(&tree), vec![(1, 0), (2, 1)]);
    assert_eq!(tree.roots[0].reply.author, "user1");
}
