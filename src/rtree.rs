//! 2D spatial index
//!
//! An R-tree over axis-aligned bounding boxes with numeric ids, for
//! cell-lookup and collision queries over built diagrams. Single inserts
//! use minimum-enlargement subtree choice with margin-minimizing node
//! splits; batches go through a sort-tile-recursive bulk build that is
//! spliced into an existing tree by height. Removal comes in two flavors:
//! eager (splice out and condense) and deferred (tombstone now, rebuild on
//! [`RTree::compact`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Maximum children per node; a node splits when it would exceed this
const MAX_ENTRIES: usize = 9;
/// Minimum children per node; a node underflowing this is condensed away
const MIN_ENTRIES: usize = 4;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    /// The empty box: unions with anything leave the other operand
    pub const EMPTY: Aabb = Aabb {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Tight box around a point set (x and y only); `None` when empty
    pub fn of_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut b = Self::EMPTY;
        for p in points {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    #[inline]
    pub fn extend(&mut self, other: &Aabb) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.extend(other);
        out
    }

    #[inline]
    pub fn area(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }

    /// Half the perimeter; the split heuristic minimizes this
    #[inline]
    pub fn margin(&self) -> f64 {
        (self.max_x - self.min_x) + (self.max_y - self.min_y)
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && self.min_y <= other.max_y
            && self.max_x >= other.min_x
            && self.max_y >= other.min_y
    }

    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Area added to this box by growing it to cover `other`
    #[inline]
    pub fn enlargement(&self, other: &Aabb) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Area of the overlap region, zero when disjoint
    pub fn intersection_area(&self, other: &Aabb) -> f64 {
        let w = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let h = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// Tree node: internal nodes hold child nodes, leaves (height 1) hold data
/// entries, data entries (height 0) hold an id and no children
#[derive(Debug, Clone)]
struct Node {
    aabb: Aabb,
    id: Option<usize>,
    removed: bool,
    height: usize,
    children: Vec<Node>,
}

impl Node {
    fn data(id: usize, aabb: Aabb) -> Self {
        Self {
            aabb,
            id: Some(id),
            removed: false,
            height: 0,
            children: Vec::new(),
        }
    }

    fn with_children(children: Vec<Node>, height: usize) -> Self {
        let mut node = Self {
            aabb: Aabb::EMPTY,
            id: None,
            removed: false,
            height,
            children,
        };
        node.recompute_aabb();
        node
    }

    fn recompute_aabb(&mut self) {
        self.aabb = Aabb::EMPTY;
        for child in &self.children {
            self.aabb.extend(&child.aabb);
        }
    }
}

/// An R-tree over `(id, Aabb)` entries
#[derive(Debug, Clone)]
pub struct RTree {
    root: Node,
    live: usize,
    tombstones: usize,
}

impl Default for RTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RTree {
    pub fn new() -> Self {
        Self {
            root: Node::with_children(Vec::new(), 1),
            live: 0,
            tombstones: 0,
        }
    }

    /// Number of live entries (deferred removals excluded)
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Insert one entry
    pub fn insert(&mut self, id: usize, aabb: Aabb) {
        self.insert_node(Node::data(id, aabb), 1);
        self.live += 1;
    }

    /// Bulk-insert a batch of entries
    ///
    /// Small batches fall back to repeated inserts. Larger ones are built
    /// into a packed subtree with sort-tile-recursive ordering and spliced
    /// into the existing tree at matching height, which keeps queries fast
    /// even when the tree is built all at once.
    pub fn load(&mut self, items: Vec<(usize, Aabb)>) {
        if items.len() < MIN_ENTRIES {
            for (id, aabb) in items {
                self.insert(id, aabb);
            }
            return;
        }

        let count = items.len();
        let data: Vec<Node> = items
            .into_iter()
            .map(|(id, aabb)| Node::data(id, aabb))
            .collect();
        let built = bulk_build(data);
        self.live += count;

        if self.root.children.is_empty() {
            self.root = built;
        } else if self.root.height == built.height {
            // neither tree fits inside the other; grow a new root
            let old = std::mem::replace(&mut self.root, Node::with_children(Vec::new(), 0));
            let height = old.height + 1;
            self.root = Node::with_children(vec![old, built], height);
        } else if self.root.height > built.height {
            let at_height = built.height + 1;
            self.insert_node(built, at_height);
        } else {
            // the built tree is taller; splice the existing root into it
            let old = std::mem::replace(&mut self.root, built);
            let at_height = old.height + 1;
            self.insert_node(old, at_height);
        }
    }

    /// Ids of all live entries whose box intersects the query box
    pub fn search(&self, query: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !node.aabb.intersects(query) {
                continue;
            }
            if let Some(id) = node.id {
                if !node.removed {
                    out.push(id);
                }
                continue;
            }
            for child in &node.children {
                stack.push(child);
            }
        }
        out
    }

    /// Whether any live entry intersects the query box
    pub fn collides(&self, query: &Aabb) -> bool {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !node.aabb.intersects(query) {
                continue;
            }
            if node.id.is_some() {
                if !node.removed {
                    return true;
                }
                continue;
            }
            for child in &node.children {
                stack.push(child);
            }
        }
        false
    }

    /// Remove one entry eagerly; returns whether it was found
    ///
    /// The entry's leaf is condensed if it underflows: the leaf is spliced
    /// out and its surviving entries are reinserted.
    pub fn remove(&mut self, id: usize, aabb: &Aabb) -> bool {
        let mut orphans = Vec::new();
        let found = remove_rec(&mut self.root, id, aabb, &mut orphans);
        if !found {
            return false;
        }
        self.live -= 1;
        for orphan in orphans {
            if orphan.removed {
                self.tombstones -= 1;
                continue;
            }
            self.insert_node(orphan, 1);
        }
        // collapse single-child internal roots
        while self.root.height > 1 && self.root.children.len() == 1 {
            if let Some(only) = self.root.children.pop() {
                self.root = only;
            }
        }
        true
    }

    /// Mark an entry removed without touching the tree structure
    ///
    /// The entry stops appearing in queries immediately; its node is
    /// physically dropped at the next [`RTree::compact`]. Returns whether
    /// the id was found live.
    pub fn remove_deferred(&mut self, id: usize) -> bool {
        if tombstone_rec(&mut self.root, id) {
            self.live -= 1;
            self.tombstones += 1;
            true
        } else {
            false
        }
    }

    /// Rebuild the tree without tombstoned entries
    pub fn compact(&mut self) {
        if self.tombstones == 0 {
            return;
        }
        let mut survivors = Vec::with_capacity(self.live);
        collect_live(&self.root, &mut survivors);
        self.root = Node::with_children(Vec::new(), 1);
        self.tombstones = 0;
        self.live = 0;
        let items: Vec<(usize, Aabb)> = survivors
            .into_iter()
            .filter_map(|n| n.id.map(|id| (id, n.aabb)))
            .collect();
        self.load(items);
    }

    /// Insert a subtree (or data node) into every ancestor at `at_height`,
    /// splitting upward as needed
    fn insert_node(&mut self, node: Node, at_height: usize) {
        if let Some(sibling) = insert_rec(&mut self.root, node, at_height) {
            let old = std::mem::replace(&mut self.root, Node::with_children(Vec::new(), 0));
            let height = old.height + 1;
            self.root = Node::with_children(vec![old, sibling], height);
        }
    }
}

/// Recursive insert; returns a split-off sibling when the node overflowed
fn insert_rec(node: &mut Node, item: Node, at_height: usize) -> Option<Node> {
    node.aabb.extend(&item.aabb);
    if node.height == at_height {
        node.children.push(item);
    } else {
        let i = choose_subtree(node, &item.aabb);
        if let Some(sibling) = insert_rec(&mut node.children[i], item, at_height) {
            node.children.push(sibling);
        }
    }
    if node.children.len() > MAX_ENTRIES {
        Some(split(node))
    } else {
        None
    }
}

/// Child with the least area enlargement, ties broken by least area
fn choose_subtree(node: &Node, aabb: &Aabb) -> usize {
    let mut best = 0;
    let mut best_enlargement = f64::INFINITY;
    let mut best_area = f64::INFINITY;
    for (i, child) in node.children.iter().enumerate() {
        let enlargement = child.aabb.enlargement(aabb);
        let area = child.aabb.area();
        if enlargement < best_enlargement
            || (enlargement == best_enlargement && area < best_area)
        {
            best = i;
            best_enlargement = enlargement;
            best_area = area;
        }
    }
    best
}

/// Split an overflowing node in half; returns the new sibling
///
/// Axis choice minimizes the summed margins over all valid distributions;
/// the split index then minimizes overlap area, ties broken by total area.
fn split(node: &mut Node) -> Node {
    sort_by_best_axis(&mut node.children);
    let index = choose_split_index(&node.children);
    let spilled = node.children.split_off(index);
    let sibling = Node::with_children(spilled, node.height);
    node.recompute_aabb();
    sibling
}

fn sort_by_best_axis(children: &mut [Node]) {
    children.sort_by(|a, b| {
        a.aabb
            .min_x
            .total_cmp(&b.aabb.min_x)
            .then(a.aabb.max_x.total_cmp(&b.aabb.max_x))
    });
    let x_margin = all_dist_margin(children);
    let mut by_y = children.to_vec();
    by_y.sort_by(|a, b| {
        a.aabb
            .min_y
            .total_cmp(&b.aabb.min_y)
            .then(a.aabb.max_y.total_cmp(&b.aabb.max_y))
    });
    let y_margin = all_dist_margin(&by_y);
    if y_margin < x_margin {
        children.clone_from_slice(&by_y);
    }
}

/// Sum of group margins over every split position that respects the
/// minimum fill
fn all_dist_margin(children: &[Node]) -> f64 {
    let m = MIN_ENTRIES;
    let k = children.len() - MIN_ENTRIES;

    let mut left = Aabb::EMPTY;
    for child in &children[..m] {
        left.extend(&child.aabb);
    }
    let mut margin = left.margin();
    for child in &children[m..k] {
        left.extend(&child.aabb);
        margin += left.margin();
    }

    let mut right = Aabb::EMPTY;
    for child in &children[k..] {
        right.extend(&child.aabb);
    }
    margin += right.margin();
    for child in children[m..k].iter().rev() {
        right.extend(&child.aabb);
        margin += right.margin();
    }
    margin
}

fn choose_split_index(children: &[Node]) -> usize {
    let m = MIN_ENTRIES;
    let k = children.len() - MIN_ENTRIES;
    let mut best = m;
    let mut best_overlap = f64::INFINITY;
    let mut best_area = f64::INFINITY;
    for i in m..=k {
        let mut left = Aabb::EMPTY;
        for child in &children[..i] {
            left.extend(&child.aabb);
        }
        let mut right = Aabb::EMPTY;
        for child in &children[i..] {
            right.extend(&child.aabb);
        }
        let overlap = left.intersection_area(&right);
        let area = left.area() + right.area();
        if overlap < best_overlap || (overlap == best_overlap && area < best_area) {
            best = i;
            best_overlap = overlap;
            best_area = area;
        }
    }
    best
}

/// Sort-tile-recursive packed build over data nodes
fn bulk_build(items: Vec<Node>) -> Node {
    let n = items.len();
    if n <= MAX_ENTRIES {
        return Node::with_children(items, 1);
    }
    let height = ((n as f64).ln() / (MAX_ENTRIES as f64).ln()).ceil() as usize;
    let root_fill = ((n as f64) / (MAX_ENTRIES.pow(height as u32 - 1) as f64)).ceil() as usize;
    build_level(items, height, root_fill)
}

fn build_level(mut items: Vec<Node>, height: usize, node_fill: usize) -> Node {
    if height == 1 {
        return Node::with_children(items, 1);
    }
    let n = items.len();
    let per_child = n.div_ceil(node_fill);
    let per_slice = per_child * (node_fill as f64).sqrt().ceil() as usize;

    items.sort_by(|a, b| a.aabb.min_x.total_cmp(&b.aabb.min_x));
    let mut children = Vec::with_capacity(node_fill);
    for slice in items.chunks_mut(per_slice) {
        slice.sort_by(|a, b| a.aabb.min_y.total_cmp(&b.aabb.min_y));
        for chunk in slice.chunks(per_child) {
            children.push(build_level(chunk.to_vec(), height - 1, MAX_ENTRIES));
        }
    }
    Node::with_children(children, height)
}

fn remove_rec(node: &mut Node, id: usize, aabb: &Aabb, orphans: &mut Vec<Node>) -> bool {
    if node.height == 1 {
        let Some(pos) = node
            .children
            .iter()
            .position(|c| c.id == Some(id) && !c.removed)
        else {
            return false;
        };
        node.children.remove(pos);
        node.recompute_aabb();
        return true;
    }
    for i in 0..node.children.len() {
        if !node.children[i].aabb.intersects(aabb) {
            continue;
        }
        if remove_rec(&mut node.children[i], id, aabb, orphans) {
            if node.children[i].children.len() < MIN_ENTRIES {
                let dead = node.children.remove(i);
                collect_data(dead, orphans);
            }
            node.recompute_aabb();
            return true;
        }
    }
    false
}

fn tombstone_rec(node: &mut Node, id: usize) -> bool {
    if node.height == 1 {
        for child in &mut node.children {
            if child.id == Some(id) && !child.removed {
                child.removed = true;
                return true;
            }
        }
        return false;
    }
    node.children.iter_mut().any(|c| tombstone_rec(c, id))
}

fn collect_data(node: Node, out: &mut Vec<Node>) {
    if node.id.is_some() {
        out.push(node);
        return;
    }
    for child in node.children {
        collect_data(child, out);
    }
}

fn collect_live(node: &Node, out: &mut Vec<Node>) {
    if node.id.is_some() {
        if !node.removed {
            out.push(node.clone());
        }
        return;
    }
    for child in &node.children {
        collect_live(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_boxes(count: usize, seed: u64) -> Vec<(usize, Aabb)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|id| {
                let x = rng.gen_range(-100.0..100.0);
                let y = rng.gen_range(-100.0..100.0);
                let w = rng.gen_range(0.1..5.0);
                let h = rng.gen_range(0.1..5.0);
                (id, Aabb::new(x, y, x + w, y + h))
            })
            .collect()
    }

    fn brute_force(items: &[(usize, Aabb)], query: &Aabb) -> Vec<usize> {
        items
            .iter()
            .filter(|(_, b)| b.intersects(query))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Every parent box must enclose all of its children's boxes
    fn assert_enclosure(node: &Node) {
        for child in &node.children {
            assert!(
                node.aabb.contains(&child.aabb),
                "parent {:?} does not enclose child {:?}",
                node.aabb,
                child.aabb
            );
            assert_enclosure(child);
        }
    }

    #[test]
    fn test_aabb_helpers() {
        let a = Aabb::new(0.0, 0.0, 2.0, 2.0);
        let b = Aabb::new(1.0, 1.0, 3.0, 4.0);
        assert_eq!(a.area(), 4.0);
        assert_eq!(a.margin(), 4.0);
        assert!(a.intersects(&b));
        assert_eq!(a.union(&b), Aabb::new(0.0, 0.0, 3.0, 4.0));
        assert_eq!(a.intersection_area(&b), 1.0);
        assert_eq!(a.enlargement(&b), 12.0 - 4.0);
        assert!(!a.intersects(&Aabb::new(5.0, 5.0, 6.0, 6.0)));
        assert!(a.contains(&Aabb::new(0.5, 0.5, 1.5, 1.5)));
    }

    #[test]
    fn test_aabb_of_points() {
        assert!(Aabb::of_points(&[]).is_none());
        let b = Aabb::of_points(&[Point::xy(1.0, 5.0), Point::xy(-2.0, 3.0)]).unwrap();
        assert_eq!(b, Aabb::new(-2.0, 3.0, 1.0, 5.0));
    }

    #[test]
    fn test_load_thousand_boxes_and_search_all() {
        let items = random_boxes(1000, 42);
        let mut tree = RTree::new();
        tree.load(items.clone());
        assert_eq!(tree.len(), 1000);

        let everything = Aabb::new(-200.0, -200.0, 200.0, 200.0);
        let mut found = tree.search(&everything);
        found.sort_unstable();
        let expected: Vec<usize> = (0..1000).collect();
        // every id exactly once
        assert_eq!(found, expected);
        assert_enclosure(&tree.root);
    }

    #[test]
    fn test_search_matches_brute_force() {
        let items = random_boxes(500, 7);
        let mut tree = RTree::new();
        for &(id, aabb) in &items {
            tree.insert(id, aabb);
        }
        assert_enclosure(&tree.root);

        for (i, query) in random_boxes(20, 8).into_iter().map(|(_, b)| b).enumerate() {
            let big = Aabb::new(
                query.min_x - 10.0,
                query.min_y - 10.0,
                query.max_x + 10.0,
                query.max_y + 10.0,
            );
            let mut got = tree.search(&big);
            got.sort_unstable();
            let mut want = brute_force(&items, &big);
            want.sort_unstable();
            assert_eq!(got, want, "query {} disagrees with brute force", i);
        }
    }

    #[test]
    fn test_collides() {
        let mut tree = RTree::new();
        tree.insert(1, Aabb::new(0.0, 0.0, 1.0, 1.0));
        assert!(tree.collides(&Aabb::new(0.5, 0.5, 2.0, 2.0)));
        assert!(!tree.collides(&Aabb::new(5.0, 5.0, 6.0, 6.0)));
    }

    #[test]
    fn test_load_splices_into_existing_tree() {
        let mut tree = RTree::new();
        let first = random_boxes(20, 1);
        for &(id, aabb) in &first {
            tree.insert(id, aabb);
        }
        let second: Vec<(usize, Aabb)> = random_boxes(200, 2)
            .into_iter()
            .map(|(id, b)| (id + 1000, b))
            .collect();
        tree.load(second);
        assert_eq!(tree.len(), 220);
        assert_enclosure(&tree.root);

        let everything = Aabb::new(-200.0, -200.0, 200.0, 200.0);
        assert_eq!(tree.search(&everything).len(), 220);
    }

    #[test]
    fn test_remove_condenses_and_reinserts() {
        let items = random_boxes(100, 3);
        let mut tree = RTree::new();
        tree.load(items.clone());

        for &(id, aabb) in items.iter().take(60) {
            assert!(tree.remove(id, &aabb), "entry {} not found", id);
        }
        assert_eq!(tree.len(), 40);
        assert_enclosure(&tree.root);

        let everything = Aabb::new(-200.0, -200.0, 200.0, 200.0);
        let mut found = tree.search(&everything);
        found.sort_unstable();
        let expected: Vec<usize> = (60..100).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_remove_missing_returns_false() {
        let mut tree = RTree::new();
        tree.insert(1, Aabb::new(0.0, 0.0, 1.0, 1.0));
        assert!(!tree.remove(2, &Aabb::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_deferred_remove_and_compact() {
        let items = random_boxes(50, 5);
        let mut tree = RTree::new();
        tree.load(items);

        assert!(tree.remove_deferred(10));
        assert!(tree.remove_deferred(11));
        assert!(!tree.remove_deferred(10), "already tombstoned");
        assert_eq!(tree.len(), 48);

        let everything = Aabb::new(-200.0, -200.0, 200.0, 200.0);
        let found = tree.search(&everything);
        assert_eq!(found.len(), 48);
        assert!(!found.contains(&10));
        assert!(!tree.collides(&Aabb::new(300.0, 300.0, 301.0, 301.0)));

        tree.compact();
        assert_eq!(tree.len(), 48);
        let mut after = tree.search(&everything);
        after.sort_unstable();
        let expected: Vec<usize> = (0..50).filter(|id| *id != 10 && *id != 11).collect();
        assert_eq!(after, expected);
        assert_enclosure(&tree.root);
    }

    #[test]
    fn test_empty_tree() {
        let tree = RTree::new();
        assert!(tree.is_empty());
        assert!(tree.search(&Aabb::new(-1.0, -1.0, 1.0, 1.0)).is_empty());
        assert!(!tree.collides(&Aabb::new(-1.0, -1.0, 1.0, 1.0)));
    }
}
