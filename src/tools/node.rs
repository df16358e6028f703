//! Binary tree node for Huffman trees.
//! Each parent owns its children outright, so dropping the root frees
//! the whole tree exactly once.

/// placeholder symbol carried by interior nodes
const INTERIOR_SYMBOL: u8 = b'$';

#[derive(Debug)]
pub struct Node {
    /// meaningful only for leaves
    pub symbol: u8,
    pub frequency: u64,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>
}

impl Node {
    /// create a leaf
    pub fn create(symbol: u8, frequency: u64) -> Self {
        Self {
            symbol,
            frequency,
            left: None,
            right: None
        }
    }
    /// Create a parent taking ownership of both nodes.
    /// Parent frequency is the sum of the children's.
    pub fn join(left: Node, right: Node) -> Self {
        Self {
            symbol: INTERIOR_SYMBOL,
            frequency: left.frequency.saturating_add(right.frequency),
            left: Some(Box::new(left)),
            right: Some(Box::new(right))
        }
    }
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
    /// child selected by a code bit, `false` is left and `true` is right
    pub fn child(&self, bit: bool) -> Option<&Node> {
        match bit {
            false => self.left.as_deref(),
            true => self.right.as_deref()
        }
    }
    /// total number of nodes in this subtree
    pub fn count_nodes(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.count_nodes())
            + self.right.as_ref().map_or(0, |n| n.count_nodes())
    }
    /// number of leaves in this subtree
    pub fn count_leaves(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.left.as_ref().map_or(0, |n| n.count_leaves())
            + self.right.as_ref().map_or(0, |n| n.count_leaves())
    }
}

#[test]
fn join_sums_frequency() {
    let parent = Node::join(Node::create(b'a',3), Node::create(b'b',4));
    assert_eq!(parent.frequency,7);
    assert!(!parent.is_leaf());
    assert_eq!(parent.child(false).map(|n| n.symbol),Some(b'a'));
    assert_eq!(parent.child(true).map(|n| n.symbol),Some(b'b'));
    assert_eq!(parent.count_nodes(),3);
    assert_eq!(parent.count_leaves(),2);
}

#[test]
fn leaf_has_no_children() {
    let leaf = Node::create(0,1);
    assert!(leaf.is_leaf());
    assert!(leaf.child(false).is_none());
    assert!(leaf.child(true).is_none());
}
