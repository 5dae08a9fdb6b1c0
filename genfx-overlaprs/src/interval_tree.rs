use num_traits::{PrimInt, Signed};

use super::Overlapper;
use genfx_core::models::Interval;

/// A centered interval tree over closed intervals.
///
/// Every node stores a center point and the intervals that contain it, once
/// sorted by start and once sorted by end (descending). Intervals entirely to
/// the left or right of the center go to the left or right subtree. Centers
/// are median endpoints, so the tree is balanced: build is O(n log n) and a
/// query is O(log n + k).
///
/// # Examples
///
/// ```
/// use genfx_overlaprs::{IntervalTree, Overlapper, Interval};
///
/// let genes = vec![
///     Interval { start: 1000i64, end: 2000, val: "BRCA1" },
///     Interval { start: 3000, end: 4000, val: "TP53" },
///     Interval { start: 5000, end: 6000, val: "EGFR" },
/// ];
///
/// let tree = IntervalTree::build(genes);
/// let mut hits: Vec<&str> = tree.find_iter(1500, 3000).map(|iv| iv.val).collect();
/// hits.sort();
/// assert_eq!(hits, vec!["BRCA1", "TP53"]);
/// ```
#[derive(Debug, Clone)]
pub struct IntervalTree<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    nodes: Vec<Node<I, T>>,
    root: Option<usize>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    center: I,
    by_start: Vec<Interval<I, T>>,
    by_end: Vec<Interval<I, T>>,
    left: Option<usize>,
    right: Option<usize>,
}

impl<I, T> IntervalTree<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build_node(nodes: &mut Vec<Node<I, T>>, intervals: Vec<Interval<I, T>>) -> Option<usize> {
        if intervals.is_empty() {
            return None;
        }

        // median endpoint: always an endpoint of some interval, so the node is never empty
        let mut endpoints: Vec<I> = intervals.iter().flat_map(|iv| [iv.start, iv.end]).collect();
        endpoints.sort_unstable();
        let center = endpoints[endpoints.len() / 2];

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut here = Vec::new();
        for iv in intervals {
            if iv.end < center {
                left.push(iv);
            } else if iv.start > center {
                right.push(iv);
            } else {
                here.push(iv);
            }
        }

        let mut by_start = here.clone();
        by_start.sort();
        let mut by_end = here;
        by_end.sort_by(|a, b| b.end.cmp(&a.end));

        let idx = nodes.len();
        nodes.push(Node {
            center,
            by_start,
            by_end,
            left: None,
            right: None,
        });

        let left = Self::build_node(nodes, left);
        let right = Self::build_node(nodes, right);
        nodes[idx].left = left;
        nodes[idx].right = right;
        Some(idx)
    }

    fn collect<'a>(&'a self, node: Option<usize>, start: I, end: I, out: &mut Vec<&'a Interval<I, T>>) {
        let Some(idx) = node else {
            return;
        };
        let node = &self.nodes[idx];

        if end < node.center {
            // every interval here ends at or after the center, past the query
            out.extend(node.by_start.iter().take_while(|iv| iv.start <= end));
            self.collect(node.left, start, end, out);
        } else if start > node.center {
            out.extend(node.by_end.iter().take_while(|iv| iv.end >= start));
            self.collect(node.right, start, end, out);
        } else {
            out.extend(node.by_start.iter());
            self.collect(node.left, start, end, out);
            self.collect(node.right, start, end, out);
        }
    }

    /// Depth of the deepest node, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        fn depth_of<I, T>(nodes: &[Node<I, T>], node: Option<usize>) -> usize
        where
            I: PrimInt + Signed + Send + Sync,
            T: Eq + Clone + Send + Sync,
        {
            match node {
                Some(idx) => 1 + depth_of(nodes, nodes[idx].left).max(depth_of(nodes, nodes[idx].right)),
                None => 0,
            }
        }
        depth_of(&self.nodes, self.root)
    }
}

impl<I, T> Overlapper<I, T> for IntervalTree<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        let len = intervals.len();
        let mut nodes = Vec::new();
        let root = Self::build_node(&mut nodes, intervals);
        IntervalTree { nodes, root, len }
    }

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>> {
        self.find_iter(start, end).cloned().collect()
    }

    fn find_iter<'a>(&'a self, start: I, end: I) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        let mut out = Vec::new();
        if start <= end {
            self.collect(self.root, start, end, &mut out);
        }
        Box::new(out.into_iter())
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn intervals() -> Vec<Interval<i64, u32>> {
        vec![
            Interval { start: 1, end: 5, val: 0 },
            Interval { start: 3, end: 7, val: 1 },
            Interval { start: 6, end: 10, val: 2 },
            Interval { start: 8, end: 12, val: 3 },
            Interval { start: 20, end: 20, val: 4 },
            Interval { start: -10, end: -2, val: 5 },
        ]
    }

    fn vals(tree: &IntervalTree<i64, u32>, start: i64, end: i64) -> Vec<u32> {
        let mut v: Vec<u32> = tree.find_iter(start, end).map(|iv| iv.val).collect();
        v.sort();
        v
    }

    #[rstest]
    fn test_find(intervals: Vec<Interval<i64, u32>>) {
        let tree = IntervalTree::build(intervals);
        assert_eq!(tree.len(), 6);
        assert_eq!(vals(&tree, 5, 6), vec![0, 1, 2]);
        assert_eq!(vals(&tree, 12, 20), vec![3, 4]);
        assert_eq!(vals(&tree, -3, 1), vec![0, 5]);
        assert_eq!(vals(&tree, 13, 19), Vec::<u32>::new());
        assert_eq!(vals(&tree, -100, 100), vec![0, 1, 2, 3, 4, 5]);
    }

    #[rstest]
    fn test_inverted_query_is_empty(intervals: Vec<Interval<i64, u32>>) {
        let tree = IntervalTree::build(intervals);
        assert!(tree.find(10, 5).is_empty());
    }

    #[rstest]
    fn test_balanced() {
        let intervals: Vec<Interval<i64, usize>> = (0..1024)
            .map(|i| Interval {
                start: i * 10,
                end: i * 10 + 5,
                val: i as usize,
            })
            .collect();
        let tree = IntervalTree::build(intervals);
        assert!(tree.depth() <= 12);
        assert_eq!(tree.find(0, 10_240).len(), 1024);
    }

    #[rstest]
    fn test_empty() {
        let tree: IntervalTree<i64, u32> = IntervalTree::build(vec![]);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.find(0, 10).is_empty());
    }
}
