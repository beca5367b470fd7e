//! A persistent stack of symbols.
//!
//! Every operation that changes the stack returns a new value and leaves the receiver untouched.
//! Values share their common lower part through reference-counted nodes, so cloning a stack for
//! a new search branch is O(1) and no branch can observe another branch's pushes or pops.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::types::EPSILON_SYMBOL;

#[derive(Debug)]
struct Node {
    symbol: char,
    below: Option<Rc<Node>>,
}

/// An immutable stack value.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    top: Option<Rc<Node>>,
    len: usize,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the topmost symbol, or `None` if the stack is empty.
    pub fn top(&self) -> Option<char> {
        self.top.as_ref().map(|node| node.symbol)
    }

    /// Returns the stack without its topmost symbol, or `None` if the stack is empty.
    pub fn pop(&self) -> Option<Stack> {
        self.top.as_ref().map(|node| Stack {
            top: node.below.clone(),
            len: self.len - 1,
        })
    }

    /// Returns a stack with `symbols` pushed in order, so the last symbol ends on top.
    pub fn push(&self, symbols: &[char]) -> Stack {
        symbols.iter().fold(self.clone(), |stack, &symbol| Stack {
            top: Some(Rc::new(Node {
                symbol,
                below: stack.top.clone(),
            })),
            len: stack.len + 1,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Iterates over the symbols from the top down.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.top.as_deref(),
        }
    }

    /// Returns the symbols bottom first, the order they would have been pushed in.
    pub fn to_vec(&self) -> Vec<char> {
        let mut symbols: Vec<char> = self.iter().collect();
        symbols.reverse();
        symbols
    }
}

impl From<&str> for Stack {
    /// Builds a stack from a word written bottom first.
    fn from(word: &str) -> Self {
        let symbols: Vec<char> = word.chars().collect();
        Stack::new().push(&symbols)
    }
}

impl Drop for Stack {
    // Unlink uniquely owned nodes one at a time so long stacks do not recurse on drop.
    fn drop(&mut self) {
        let mut next = self.top.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => next = node.below.take(),
                Err(_) => break,
            }
        }
    }
}

impl PartialEq for Stack {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Stack {}

impl Hash for Stack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for symbol in self.iter() {
            symbol.hash(state);
        }
    }
}

impl Serialize for Stack {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

impl fmt::Display for Stack {
    /// Renders the stack top first, or ε when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{EPSILON_SYMBOL}");
        }
        self.iter().try_for_each(|symbol| write!(f, "{symbol}"))
    }
}

/// Iterator over a [`Stack`], top first.
pub struct Iter<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.next.map(|node| {
            self.next = node.below.as_deref();
            node.symbol
        })
    }
}
