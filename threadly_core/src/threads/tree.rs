use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ThreadItem;

/// How siblings are ordered in a built forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeOrder {
    /// Roots and every reply list sorted by creation time, newest first.
    NewestFirst,
    /// Siblings keep the order the rows were given in.
    AsLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub replies: Vec<ThreadNode<T>>,
}

/// Nests a flat set of rows into a forest.
///
/// A row whose parent is not in `rows` becomes a root, so callers wanting a
/// faithful tree must pass a closed set (a whole post, or a root with its
/// full subtree). Every input row appears exactly once in the output.
pub fn build_tree<T>(rows: &[T], order: TreeOrder) -> Vec<ThreadNode<T>>
where
    T: ThreadItem + Clone,
{
    let index: HashMap<T::Id, usize> = rows
        .iter()
        .enumerate()
        .map(|(position, row)| (row.id(), position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots = Vec::new();

    for (position, row) in rows.iter().enumerate() {
        match row.parent_id().and_then(|parent| index.get(&parent)) {
            Some(&parent) if parent != position => children[parent].push(position),
            _ => roots.push(position),
        }
    }

    let newest_first = |list: &mut Vec<usize>| {
        // stable, so equal timestamps keep load order
        list.sort_by(|a, b| rows[*b].created_at().cmp(rows[*a].created_at()));
    };

    if order == TreeOrder::NewestFirst {
        newest_first(&mut roots);
        children.iter_mut().for_each(newest_first);
    }

    // Pre-order walk. Each row is attached under the first node that reaches
    // it, which also breaks parent cycles in malformed input.
    let mut visited = vec![false; rows.len()];
    let mut attached: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut preorder = Vec::with_capacity(rows.len());
    let mut stack = Vec::new();

    let mut walk = |start: usize, visited: &mut Vec<bool>| {
        visited[start] = true;
        stack.push(start);
        while let Some(node) = stack.pop() {
            preorder.push(node);
            let fresh: Vec<usize> = children[node]
                .iter()
                .copied()
                .filter(|&child| !visited[child])
                .collect();
            for &child in &fresh {
                visited[child] = true;
            }
            stack.extend(fresh.iter().rev());
            attached[node] = fresh;
        }
    };

    for &root in &roots {
        walk(root, &mut visited);
    }

    // Rows caught in a parent cycle are unreachable from any root.
    let mut forest_roots = roots;
    for position in 0..rows.len() {
        if !visited[position] {
            forest_roots.push(position);
            walk(position, &mut visited);
        }
    }

    if order == TreeOrder::NewestFirst {
        newest_first(&mut forest_roots);
    }

    // Children follow their parent in pre-order, so building in reverse
    // finishes every subtree before the node that owns it.
    let mut built: Vec<Option<ThreadNode<T>>> = rows.iter().map(|_| None).collect();
    for &node in preorder.iter().rev() {
        let replies = std::mem::take(&mut attached[node])
            .into_iter()
            .filter_map(|child| built[child].take())
            .collect();
        built[node] = Some(ThreadNode {
            item: rows[node].clone(),
            replies,
        });
    }

    forest_roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        id: u32,
        parent: Option<u32>,
        created_at: String,
    }

    impl ThreadItem for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn parent_id(&self) -> Option<u32> {
            self.parent
        }

        fn created_at(&self) -> &str {
            &self.created_at
        }
    }

    fn row(id: u32, parent: Option<u32>) -> Row {
        Row {
            id,
            parent,
            created_at: format!("2025-01-01T00:00:{id:02}.000000Z"),
        }
    }

    fn ids(forest: &[ThreadNode<Row>]) -> Vec<u32> {
        forest.iter().map(|node| node.item.id).collect()
    }

    fn count(forest: &[ThreadNode<Row>]) -> usize {
        forest.iter().map(|node| 1 + count(&node.replies)).sum()
    }

    fn parent_links_hold(forest: &[ThreadNode<Row>]) -> bool {
        forest.iter().all(|node| {
            node.replies
                .iter()
                .all(|reply| reply.item.parent == Some(node.item.id))
                && parent_links_hold(&node.replies)
        })
    }

    #[test]
    fn test_as_loaded_keeps_input_order() {
        let rows = vec![row(1, None), row(2, Some(1)), row(3, None), row(4, Some(1))];
        let forest = build_tree(&rows, TreeOrder::AsLoaded);

        assert_eq!(ids(&forest), vec![1, 3]);
        assert_eq!(ids(&forest[0].replies), vec![2, 4]);
        assert!(forest[1].replies.is_empty());
    }

    #[test]
    fn test_newest_first_sorts_every_level() {
        let rows = vec![
            row(1, None),
            row(2, Some(1)),
            row(3, Some(1)),
            row(4, Some(2)),
            row(5, Some(2)),
            row(6, None),
        ];
        let forest = build_tree(&rows, TreeOrder::NewestFirst);

        assert_eq!(ids(&forest), vec![6, 1]);
        assert_eq!(ids(&forest[1].replies), vec![3, 2]);
        assert_eq!(ids(&forest[1].replies[1].replies), vec![5, 4]);
    }

    #[test]
    fn test_missing_parent_surfaces_as_root() {
        let rows = vec![row(2, Some(1)), row(3, Some(2))];
        let forest = build_tree(&rows, TreeOrder::AsLoaded);

        assert_eq!(ids(&forest), vec![2]);
        assert_eq!(ids(&forest[0].replies), vec![3]);
    }

    #[test]
    fn test_input_is_left_untouched() {
        let rows = vec![row(1, None), row(2, Some(1))];
        let before = rows.clone();
        let _ = build_tree(&rows, TreeOrder::NewestFirst);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_parent_cycle_still_emits_every_row() {
        let rows = vec![row(1, Some(2)), row(2, Some(1)), row(3, Some(3))];
        let forest = build_tree(&rows, TreeOrder::AsLoaded);

        assert_eq!(count(&forest), 3);
        assert_eq!(ids(&forest), vec![3, 1]);
        assert_eq!(ids(&forest[1].replies), vec![2]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let rows: Vec<Row> = (0..50_000)
            .map(|id| Row {
                id,
                parent: id.checked_sub(1),
                created_at: String::new(),
            })
            .collect();
        let forest = build_tree(&rows, TreeOrder::AsLoaded);

        assert_eq!(forest.len(), 1);
        let mut depth = 0;
        let mut node = &forest[0];
        while let Some(next) = node.replies.first() {
            depth += 1;
            node = next;
        }
        assert_eq!(depth, 49_999);
        // Drop iteratively so the test itself does not blow the stack.
        let mut pending = forest;
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }

    fn arbitrary_rows() -> impl Strategy<Value = Vec<Row>> {
        (1usize..40).prop_flat_map(|len| {
            proptest::collection::vec((proptest::option::of(0..len as u32 + 5), 0u32..60), len)
                .prop_map(|specs| {
                    specs
                        .into_iter()
                        .enumerate()
                        .map(|(id, (parent, second))| Row {
                            id: id as u32,
                            parent,
                            created_at: format!("2025-01-01T00:00:{second:02}.000000Z"),
                        })
                        .collect()
                })
        })
    }

    proptest! {
        #[test]
        fn prop_node_count_matches_input(rows in arbitrary_rows()) {
            for order in [TreeOrder::AsLoaded, TreeOrder::NewestFirst] {
                let forest = build_tree(&rows, order);
                prop_assert_eq!(count(&forest), rows.len());
                prop_assert!(parent_links_hold(&forest));
            }
        }
    }
}
