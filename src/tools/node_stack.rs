//! Fixed capacity LIFO of tree nodes, used while rebuilding a tree
//! from its serialized form.

use super::node::Node;
use crate::Error;

pub struct NodeStack {
    items: Vec<Node>,
    capacity: usize
}

impl NodeStack {
    pub fn create(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity
        }
    }
    pub fn size(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }
    pub fn push(&mut self, node: Node) -> Result<(),Error> {
        if self.is_full() {
            return Err(Error::CollectionFull);
        }
        self.items.push(node);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<Node,Error> {
        self.items.pop().ok_or(Error::CollectionEmpty)
    }
}

#[test]
fn push_pop_bounds() {
    let mut s = NodeStack::create(2);
    assert!(matches!(s.pop(),Err(Error::CollectionEmpty)));
    s.push(Node::create(1,0)).expect("push failed");
    s.push(Node::create(2,0)).expect("push failed");
    assert!(matches!(s.push(Node::create(3,0)),Err(Error::CollectionFull)));
    assert_eq!(s.size(),2);
    assert_eq!(s.pop().expect("pop failed").symbol,2);
    assert_eq!(s.pop().expect("pop failed").symbol,1);
    assert!(s.is_empty());
}
