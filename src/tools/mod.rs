//! Building blocks for the static Huffman format

pub mod node;
pub mod priority_queue;
pub mod node_stack;
pub mod bit_path;
pub mod bit_io;
pub mod static_tree;
