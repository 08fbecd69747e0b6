//! Union-find (disjoint set union) used by the component labeller.
//!
//! Union by size with full path compression keeps the amortised cost of a
//! sequence of operations at `O(α(n))` each.

#[derive(Clone, Debug)]
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
    components: usize,
}

impl DisjointSet {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            components: n,
        }
    }

    pub(crate) const fn components(&self) -> usize {
        self.components
    }

    /// Callers must pass `node < n`.
    pub(crate) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != root {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Merges the sets holding `left` and `right`, returning `true` when they
    /// were previously disjoint.
    pub(crate) fn union(&mut self, left: usize, right: usize) -> bool {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return false;
        }
        if self.size[left] < self.size[right] {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        self.size[left] += self.size[right];
        self.components -= 1;
        true
    }
}
