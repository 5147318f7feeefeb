//! Depth-first visitor runtime.
//!
//! Analyzers implement [`Visitor`] on a private accumulator struct and hand it
//! to [`walk`], which performs one pre-order pass over the tree. `enter` is
//! called for every node (named and anonymous) and decides whether the walk
//! descends into its children; `leave` is called once the node's subtree is
//! done, which is where nesting counters are unwound.
//!
//! The walk is iterative over a tree cursor, so deeply nested sources cannot
//! exhaust the stack.

use tree_sitter::Node;

use super::NodeKind;

/// Whether the walk should visit a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Continue,
    Skip,
}

/// Per-node callbacks with private accumulator state.
pub trait Visitor<'t> {
    /// Called before a node's children are visited.
    fn enter(&mut self, _node: Node<'t>, _kind: NodeKind) -> Descend {
        Descend::Continue
    }

    /// Called after a node's children have been visited (or skipped).
    fn leave(&mut self, _node: Node<'t>, _kind: NodeKind) {}
}

/// Walk the subtree rooted at `root` in pre-order.
pub fn walk<'t, V: Visitor<'t>>(root: Node<'t>, visitor: &mut V) {
    let mut cursor = root.walk();
    let mut depth = 0usize;

    loop {
        let node = cursor.node();
        let kind = NodeKind::of(&node);
        if visitor.enter(node, kind) == Descend::Continue && cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        visitor.leave(node, kind);

        // Climb until a sibling is available or the root is finished.
        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
            depth -= 1;
            let parent = cursor.node();
            visitor.leave(parent, NodeKind::of(&parent));
        }
    }
}

/// Count nodes in a subtree (excluding the root itself) matching a predicate.
pub fn count_descendants<'t>(root: Node<'t>, predicate: impl Fn(NodeKind) -> bool) -> usize {
    struct Counter<F> {
        root_id: usize,
        predicate: F,
        count: usize,
    }

    impl<'t, F: Fn(NodeKind) -> bool> Visitor<'t> for Counter<F> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if node.id() != self.root_id && (self.predicate)(kind) {
                self.count += 1;
            }
            Descend::Continue
        }
    }

    let mut counter = Counter {
        root_id: root.id(),
        predicate,
        count: 0,
    };
    walk(root, &mut counter);
    counter.count
}

/// Whether any node in the subtree satisfies the predicate.
pub fn any_descendant<'t>(root: Node<'t>, predicate: impl Fn(&Node<'t>) -> bool) -> bool {
    struct Finder<'t, F> {
        predicate: F,
        found: bool,
        _marker: std::marker::PhantomData<Node<'t>>,
    }

    impl<'t, F: Fn(&Node<'t>) -> bool> Visitor<'t> for Finder<'t, F> {
        fn enter(&mut self, node: Node<'t>, _kind: NodeKind) -> Descend {
            if self.found {
                return Descend::Skip;
            }
            if (self.predicate)(&node) {
                self.found = true;
                return Descend::Skip;
            }
            Descend::Continue
        }
    }

    let mut finder = Finder {
        predicate,
        found: false,
        _marker: std::marker::PhantomData,
    };
    walk(root, &mut finder);
    finder.found
}
