//! Fixed capacity priority queue of tree nodes.
//!
//! Nodes are kept sorted by descending frequency from front to back, and
//! are always removed from the back.  Insertion only shifts nodes with a
//! strictly smaller frequency, so among equal frequencies the node enqueued
//! last is dequeued first.  Tree reproducibility depends on this ordering.

use super::node::Node;
use crate::Error;

pub struct PriorityQueue {
    nodes: Vec<Node>,
    capacity: usize
}

impl PriorityQueue {
    pub fn create(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity
        }
    }
    pub fn size(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.nodes.len() == self.capacity
    }
    /// Insertion sort step, the queue is unchanged if it is full.
    pub fn enqueue(&mut self, node: Node) -> Result<(),Error> {
        if self.is_full() {
            return Err(Error::CollectionFull);
        }
        let mut i = self.nodes.len();
        while i > 0 && self.nodes[i-1].frequency < node.frequency {
            i -= 1;
        }
        self.nodes.insert(i,node);
        Ok(())
    }
    /// remove the node with the smallest frequency
    pub fn dequeue(&mut self) -> Result<Node,Error> {
        self.nodes.pop().ok_or(Error::CollectionEmpty)
    }
}

#[test]
fn ties_are_last_in_first_out() {
    // (frequency, enqueue order)
    let mut q = PriorityQueue::create(4);
    for (i,f) in [5,3,5,3].iter().enumerate() {
        q.enqueue(Node::create(i as u8,*f)).expect("enqueue failed");
    }
    let mut order = Vec::new();
    while !q.is_empty() {
        let n = q.dequeue().expect("dequeue failed");
        order.push((n.frequency,n.symbol));
    }
    assert_eq!(order,vec![(3,3),(3,1),(5,2),(5,0)]);
}

#[test]
fn capacity_is_enforced() {
    let mut q = PriorityQueue::create(2);
    q.enqueue(Node::create(0,1)).expect("enqueue failed");
    q.enqueue(Node::create(1,2)).expect("enqueue failed");
    assert!(q.is_full());
    assert!(matches!(q.enqueue(Node::create(2,0)),Err(Error::CollectionFull)));
    assert_eq!(q.size(),2);
    // smallest frequency survives at the back
    assert_eq!(q.dequeue().expect("dequeue failed").symbol,0);
    assert_eq!(q.dequeue().expect("dequeue failed").symbol,1);
    assert!(matches!(q.dequeue(),Err(Error::CollectionEmpty)));
}
