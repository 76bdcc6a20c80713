//! Nested reply tree built from the flat reply list.
//!
//! DESIGN
//! ======
//! Replies arrive flat with a `parent_id`. The tree is built in one pass from
//! the roots down, tracking visited ids, so a corrupt list (dangling parent,
//! parent cycle) can never loop or silently drop replies: anything not reached
//! from a real root is promoted to a root of its own.
//!
//! Deleted replies that still have live descendants stay as placeholders so
//! the thread keeps its shape; deleted leaves are pruned. A reply whose id
//! was already placed is dropped with a warning.
//!
//! Every walk (build, flatten, count, drop) uses an explicit stack, so thread
//! depth is bounded by memory rather than by the call stack.

#[cfg(test)]
#[path = "tree_test.rs"]
mod tests;

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::Reply;

/// A reply with its nested children, siblings ordered oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyNode {
    pub reply: Reply,
    pub children: Vec<ReplyNode>,
}

impl Drop for ReplyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// One row of the rendered thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplyView<'a> {
    pub depth: usize,
    pub reply: &'a Reply,
    /// Deleted reply kept only to hold its children in place.
    pub placeholder: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplyTree {
    pub roots: Vec<ReplyNode>,
}

impl ReplyTree {
    #[must_use]
    pub fn build(replies: Vec<Reply>) -> Self {
        let ids: HashSet<i64> = replies.iter().map(|r| r.id).collect();

        let mut by_parent: HashMap<Option<i64>, Vec<Reply>> = HashMap::new();
        for reply in replies {
            let parent = match reply.parent_id {
                Some(pid) if pid == reply.id => {
                    warn!(reply_id = reply.id, "reply is its own parent; promoting to root");
                    None
                }
                Some(pid) if !ids.contains(&pid) => {
                    warn!(reply_id = reply.id, parent_id = pid, "reply parent missing; promoting to root");
                    None
                }
                other => other,
            };
            by_parent.entry(parent).or_default().push(reply);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by_key(|r| (r.created_at, r.id));
        }

        let mut visited = HashSet::new();
        let mut roots: Vec<ReplyNode> = by_parent
            .remove(&None)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|reply| attach(reply, &mut by_parent, &mut visited))
            .collect();

        // Whatever is left sits on a parent cycle.
        let mut stranded: Vec<Reply> = by_parent.into_values().flatten().collect();
        if !stranded.is_empty() {
            warn!(count = stranded.len(), "reply parent cycle; promoting to roots");
            stranded.sort_by_key(|r| (r.created_at, r.id));
            let mut rest = HashMap::new();
            roots.extend(
                stranded
                    .into_iter()
                    .filter_map(|reply| attach(reply, &mut rest, &mut visited)),
            );
            roots.sort_by_key(|n| (n.reply.created_at, n.reply.id));
        }

        Self { roots }
    }

    /// Replies in render order with their nesting depth.
    #[must_use]
    pub fn flatten(&self) -> Vec<ReplyView<'_>> {
        self.flatten_capped(usize::MAX)
    }

    /// Like [`ReplyTree::flatten`], but depth is clamped to `max_depth` so
    /// deep threads stop indenting.
    #[must_use]
    pub fn flatten_capped(&self, max_depth: usize) -> Vec<ReplyView<'_>> {
        let mut out = Vec::new();
        let mut stack: Vec<(&ReplyNode, usize)> = self.roots.iter().rev().map(|n| (n, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            out.push(ReplyView { depth: depth.min(max_depth), reply: &node.reply, placeholder: node.reply.deleted });
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }

    /// Number of rows the thread renders.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack: Vec<&ReplyNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

/// A node under construction: children built so far plus those still to visit.
struct Frame {
    reply: Reply,
    children: Vec<ReplyNode>,
    pending: Vec<Reply>,
}

impl Frame {
    fn open(reply: Reply, by_parent: &mut HashMap<Option<i64>, Vec<Reply>>) -> Self {
        let mut pending = by_parent.remove(&Some(reply.id)).unwrap_or_default();
        pending.reverse();
        Self { reply, children: Vec::new(), pending }
    }

    fn close(self) -> Option<ReplyNode> {
        if self.reply.deleted && self.children.is_empty() {
            return None;
        }
        Some(ReplyNode { reply: self.reply, children: self.children })
    }
}

fn attach(reply: Reply, by_parent: &mut HashMap<Option<i64>, Vec<Reply>>, visited: &mut HashSet<i64>) -> Option<ReplyNode> {
    if !visited.insert(reply.id) {
        warn!(reply_id = reply.id, "duplicate reply id; dropping");
        return None;
    }

    let mut stack = vec![Frame::open(reply, by_parent)];
    loop {
        let top = stack.last_mut()?;
        if let Some(child) = top.pending.pop() {
            if visited.insert(child.id) {
                stack.push(Frame::open(child, by_parent));
            } else {
                warn!(reply_id = child.id, "duplicate reply id; dropping");
            }
            continue;
        }

        let node = stack.pop()?.close();
        match stack.last_mut() {
            Some(parent) => parent.children.extend(node),
            None => return node,
        }
    }
}
