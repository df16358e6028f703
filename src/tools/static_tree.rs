//! Huffman tree construction, code table derivation, and the compact
//! serialized form of the tree.
//!
//! The serialized tree is a post-order dump: `L` followed by the symbol
//! for a leaf, `I` alone for an interior node.  A tree with `L` leaves
//! always dumps to `3L-1` bytes.

use super::node::Node;
use super::priority_queue::PriorityQueue;
use super::node_stack::NodeStack;
use super::bit_path::BitPath;
use crate::{Error,ALPHABET};

const LEAF_TOKEN: u8 = b'L';
const INTERIOR_TOKEN: u8 = b'I';

/// Serialized length of a tree with `leaves` leaves, 0 if there are none
pub fn serialized_size(leaves: usize) -> usize {
    (3 * leaves).saturating_sub(1)
}

/// Build the Huffman tree from a frequency table indexed by symbol.
/// Zero entries do not get a leaf.
pub fn build_tree(hist: &[u64;ALPHABET]) -> Result<Node,Error> {
    let capacity = hist.iter().filter(|f| **f != 0).count();
    if capacity == 0 {
        return Err(Error::EmptyHistogram);
    }
    let mut pq = PriorityQueue::create(capacity);
    for (sym,freq) in hist.iter().enumerate() {
        if *freq != 0 {
            pq.enqueue(Node::create(sym as u8,*freq))?;
        }
    }
    while pq.size() >= 2 {
        let left = pq.dequeue()?;
        let right = pq.dequeue()?;
        log::trace!("join {} + {}",left.frequency,right.frequency);
        pq.enqueue(Node::join(left,right))?;
    }
    pq.dequeue()
}

/// Map from symbol to code
pub struct CodeTable {
    codes: Vec<Option<BitPath>>
}

impl CodeTable {
    fn new() -> Self {
        Self {
            codes: vec![None;ALPHABET]
        }
    }
    pub fn get(&self, symbol: u8) -> Option<&BitPath> {
        self.codes[symbol as usize].as_ref()
    }
}

/// Derive the code of every leaf by walking the tree depth first.
pub fn build_codes(root: &Node) -> Result<CodeTable,Error> {
    let mut table = CodeTable::new();
    let mut path = BitPath::new();
    walk(root,&mut path,&mut table)?;
    Ok(table)
}

/// `path` is left as it was found on return
fn walk(node: &Node, path: &mut BitPath, table: &mut CodeTable) -> Result<(),Error> {
    if node.is_leaf() {
        table.codes[node.symbol as usize] = Some(path.clone());
        return Ok(());
    }
    for bit in [false,true] {
        let child = node.child(bit).ok_or(Error::MalformedTree)?;
        path.push(bit)?;
        walk(child,path,table)?;
        path.pop()?;
    }
    Ok(())
}

/// Dump the tree in post-order
pub fn serialize(root: &Node) -> Vec<u8> {
    let mut ans = Vec::new();
    dump(root,&mut ans);
    ans
}

fn dump(node: &Node, ans: &mut Vec<u8>) {
    if let Some(left) = &node.left {
        dump(left,ans);
    }
    if let Some(right) = &node.right {
        dump(right,ans);
    }
    if node.is_leaf() {
        ans.push(LEAF_TOKEN);
        ans.push(node.symbol);
    } else {
        ans.push(INTERIOR_TOKEN);
    }
}

/// Rebuild a tree from its post-order dump, which must fill `dump` exactly.
/// Rebuilt nodes have zero frequency.
pub fn deserialize(dump: &[u8]) -> Result<Node,Error> {
    let mut stack = NodeStack::create(ALPHABET);
    let mut i = 0;
    while i < dump.len() {
        match dump[i] {
            LEAF_TOKEN => {
                i += 1;
                let symbol = *dump.get(i).ok_or(Error::MalformedTree)?;
                stack.push(Node::create(symbol,0)).map_err(|_| Error::MalformedTree)?;
            },
            INTERIOR_TOKEN => {
                // post-order puts the right subtree on top
                let right = stack.pop().map_err(|_| Error::MalformedTree)?;
                let left = stack.pop().map_err(|_| Error::MalformedTree)?;
                stack.push(Node::join(left,right))?;
            },
            tok => {
                log::error!("unknown tree token {:#04x} at {}",tok,i);
                return Err(Error::MalformedTree);
            }
        }
        i += 1;
    }
    if stack.size() != 1 {
        log::error!("tree dump left {} nodes on the stack",stack.size());
        return Err(Error::MalformedTree);
    }
    let root = stack.pop()?;
    if root.is_leaf() {
        log::error!("tree has only one leaf");
        return Err(Error::MalformedTree);
    }
    Ok(root)
}

#[cfg(test)]
fn bumped_histogram(dat: &[u8]) -> [u64;ALPHABET] {
    let mut hist = [0;ALPHABET];
    hist[0] += 1;
    hist[ALPHABET-1] += 1;
    for c in dat {
        hist[*c as usize] += 1;
    }
    hist
}

#[test]
fn node_and_leaf_counts() {
    let hist = bumped_histogram("I am Sam. Sam I am.".as_bytes());
    let leaves = hist.iter().filter(|f| **f != 0).count();
    let root = build_tree(&hist).expect("build failed");
    assert_eq!(root.count_leaves(),leaves);
    assert_eq!(root.count_nodes(),2*leaves-1);
    assert_eq!(root.frequency,hist.iter().sum::<u64>());
    assert_eq!(serialize(&root).len(),serialized_size(leaves));
    assert_eq!(serialized_size(1),2);
    assert_eq!(serialized_size(0),0);
}

#[test]
fn empty_histogram_fails() {
    assert!(matches!(build_tree(&[0;ALPHABET]),Err(Error::EmptyHistogram)));
}

#[test]
fn codes_are_prefix_free() {
    let hist = bumped_histogram("the quick brown fox jumps over the lazy dog".as_bytes());
    let root = build_tree(&hist).expect("build failed");
    let table = build_codes(&root).expect("codes failed");
    let present: Vec<u8> = (0..ALPHABET).filter(|s| hist[*s] != 0).map(|s| s as u8).collect();
    for a in &present {
        for b in &present {
            if a != b {
                let ca = table.get(*a).expect("missing code");
                let cb = table.get(*b).expect("missing code");
                assert!(!ca.is_prefix_of(cb));
            }
        }
    }
    assert!(table.get(b'Z').is_none());
}

#[test]
fn repeated_symbol_tree() {
    let hist = bumped_histogram(&[65;5]);
    let root = build_tree(&hist).expect("build failed");
    // ties between 0 and 255 resolve to 255 on the left
    assert_eq!(serialize(&root),vec![b'L',255,b'L',0,b'I',b'L',65,b'I']);
    let table = build_codes(&root).expect("codes failed");
    let code_of = |s: u8| table.get(s).expect("missing code").iter().collect::<Vec<bool>>();
    assert_eq!(code_of(65),vec![true]);
    assert_eq!(code_of(255),vec![false,false]);
    assert_eq!(code_of(0),vec![false,true]);
}

#[test]
fn rebuild_preserves_shape() {
    let hist = bumped_histogram("abracadabra".as_bytes());
    let root = build_tree(&hist).expect("build failed");
    let dump = serialize(&root);
    let rebuilt = deserialize(&dump).expect("rebuild failed");
    assert_eq!(serialize(&rebuilt),dump);
    let codes = build_codes(&root).expect("codes failed");
    let rebuilt_codes = build_codes(&rebuilt).expect("codes failed");
    for s in 0..=255u8 {
        assert_eq!(codes.get(s),rebuilt_codes.get(s));
    }
}

#[test]
fn malformed_dumps_are_rejected() {
    // interior with nothing to join
    assert!(matches!(deserialize(b"I"),Err(Error::MalformedTree)));
    // truncated leaf
    assert!(matches!(deserialize(&[b'L',1,b'L']),Err(Error::MalformedTree)));
    // two subtrees left over
    assert!(matches!(deserialize(&[b'L',1,b'L',2]),Err(Error::MalformedTree)));
    // unknown token
    assert!(matches!(deserialize(&[b'L',1,b'L',2,b'X']),Err(Error::MalformedTree)));
    // single leaf
    assert!(matches!(deserialize(&[b'L',1]),Err(Error::MalformedTree)));
    // nothing at all
    assert!(matches!(deserialize(&[]),Err(Error::MalformedTree)));
}

#[test]
fn deepest_codes_fit_the_path() {
    // Saturated equal counts: every join ties with the leaves and is dequeued
    // first, so the tree is a chain and the two deepest codes are 255 bits.
    let root = build_tree(&[u64::MAX;ALPHABET]).expect("build failed");
    assert_eq!(root.count_leaves(),ALPHABET);
    let table = build_codes(&root).expect("codes failed");
    let longest = (0..=255u8).map(|s| table.get(s).expect("missing code").len()).max();
    assert_eq!(longest,Some(255));
    assert_eq!(table.get(255).expect("missing code").len(),255);
    assert_eq!(table.get(254).expect("missing code").len(),255);
    assert_eq!(table.get(0).expect("missing code").len(),1);
    assert_eq!(serialize(&root).len(),serialized_size(ALPHABET));
}
