//! Bounded bit sequence used both as the path recorder during the
//! depth first walk and as the stored code of a symbol.
//! Bit `false` means descend left, `true` means descend right.

use bit_vec::BitVec;
use crate::Error;
use crate::ALPHABET;

#[derive(Clone,Debug,PartialEq)]
pub struct BitPath {
    bits: BitVec,
    capacity: usize
}

impl BitPath {
    /// empty path that can hold up to one bit per symbol
    pub fn new() -> Self {
        Self::with_capacity(ALPHABET)
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
            capacity
        }
    }
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.bits.len() == self.capacity
    }
    pub fn push(&mut self, bit: bool) -> Result<(),Error> {
        if self.is_full() {
            return Err(Error::CollectionFull);
        }
        self.bits.push(bit);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<bool,Error> {
        self.bits.pop().ok_or(Error::CollectionEmpty)
    }
    pub fn iter(&self) -> bit_vec::Iter<'_> {
        self.bits.iter()
    }
    /// true if `self` is a prefix of `other` (or equal to it)
    pub fn is_prefix_of(&self, other: &BitPath) -> bool {
        self.len() <= other.len() && self.iter().zip(other.iter()).all(|(a,b)| a==b)
    }
}

impl Default for BitPath {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn push_pop_discipline() {
    let mut path = BitPath::with_capacity(3);
    path.push(false).expect("push failed");
    path.push(true).expect("push failed");
    path.push(true).expect("push failed");
    assert!(path.is_full());
    assert!(matches!(path.push(false),Err(Error::CollectionFull)));
    assert_eq!(path.iter().collect::<Vec<bool>>(),vec![false,true,true]);
    assert_eq!(path.pop().expect("pop failed"),true);
    assert_eq!(path.pop().expect("pop failed"),true);
    assert_eq!(path.pop().expect("pop failed"),false);
    assert!(matches!(path.pop(),Err(Error::CollectionEmpty)));
}

#[test]
fn prefix_check() {
    let mut a = BitPath::new();
    let mut b = BitPath::new();
    a.push(true).expect("push failed");
    b.push(true).expect("push failed");
    b.push(false).expect("push failed");
    assert!(a.is_prefix_of(&b));
    assert!(!b.is_prefix_of(&a));
}
