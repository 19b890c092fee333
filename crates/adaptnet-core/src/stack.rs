//! Bounded protocol stacks
//!
//! A [`ProtocolStack`] models how a message is currently encapsulated: a LIFO
//! sequence of single-byte [`Protocol`] tags with a fixed capacity. Element 0
//! is the innermost protocol and the last element is the top.
//!
//! Two stacks are equal when they hold the same tags in the same order.
//! Capacity does not take part in equality or hashing, so stacks can be used
//! as routing keys by value.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{StackError, StackResult};

/// A single protocol layer, identified by a one-byte tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Protocol(pub u8);

impl Protocol {
    /// Create a protocol from its tag byte
    pub fn new(tag: u8) -> Self {
        Self(tag)
    }

    /// The raw tag byte
    pub fn tag(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Protocol {
    fn from(tag: u8) -> Self {
        Self(tag)
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

/// Bounded LIFO stack of protocols
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawStack")]
pub struct ProtocolStack {
    capacity: usize,
    protocols: Vec<Protocol>,
}

#[derive(Deserialize)]
struct RawStack {
    capacity: usize,
    protocols: Vec<Protocol>,
}

impl TryFrom<RawStack> for ProtocolStack {
    type Error = StackError;

    fn try_from(raw: RawStack) -> Result<Self, Self::Error> {
        Self::from_protocols(raw.capacity, raw.protocols)
    }
}

impl ProtocolStack {
    /// Create an empty stack holding at most `capacity` protocols
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            protocols: Vec::with_capacity(capacity),
        }
    }

    /// Build a stack from protocols listed bottom first
    pub fn from_protocols(
        capacity: usize,
        protocols: impl IntoIterator<Item = Protocol>,
    ) -> StackResult<Self> {
        let protocols: Vec<Protocol> = protocols.into_iter().collect();
        if protocols.len() > capacity {
            return Err(StackError::TooLong {
                len: protocols.len(),
                capacity,
            });
        }
        Ok(Self {
            capacity,
            protocols,
        })
    }

    /// Build a stack from a tag string, bottom first
    ///
    /// `from_tags(4, "xy")` is the stack `<x-y>` with `y` on top.
    pub fn from_tags(capacity: usize, tags: &str) -> StackResult<Self> {
        Self::from_protocols(capacity, tags.bytes().map(Protocol))
    }

    /// Maximum number of protocols this stack can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of protocols currently on the stack
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.protocols.len() >= self.capacity
    }

    /// Push a protocol on top of the stack
    pub fn push(&mut self, protocol: Protocol) -> StackResult<()> {
        if self.is_full() {
            return Err(StackError::Overflow {
                capacity: self.capacity,
            });
        }
        self.protocols.push(protocol);
        Ok(())
    }

    /// Remove and return the top protocol, `None` when empty
    pub fn pop(&mut self) -> Option<Protocol> {
        self.protocols.pop()
    }

    /// The top protocol, `None` when empty
    pub fn top(&self) -> Option<Protocol> {
        self.protocols.last().copied()
    }

    /// The protocol `offset` positions below the top (`peek(0)` is the top)
    pub fn peek(&self, offset: usize) -> Option<Protocol> {
        self.protocols
            .len()
            .checked_sub(offset + 1)
            .map(|index| self.protocols[index])
    }

    /// Protocols bottom first
    pub fn as_slice(&self) -> &[Protocol] {
        &self.protocols
    }
}

impl PartialEq for ProtocolStack {
    fn eq(&self, other: &Self) -> bool {
        self.protocols == other.protocols
    }
}

impl Eq for ProtocolStack {}

impl Hash for ProtocolStack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocols.hash(state);
    }
}

impl Display for ProtocolStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, protocol) in self.protocols.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{}", protocol)?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_stack_is_empty() {
        let stack = ProtocolStack::new(10);
        assert_eq!(stack.capacity(), 10);
        assert!(stack.is_empty());
        assert!(!stack.is_full());
        assert_eq!(stack.top(), None);
        assert_eq!(stack.to_string(), "<>");
    }

    #[test]
    fn test_push_and_pop() {
        let mut stack = ProtocolStack::new(10);
        stack.push(Protocol(b'a')).unwrap();
        stack.push(Protocol(b'b')).unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.to_string(), "<a-b>");
        assert_eq!(stack.pop(), Some(Protocol(b'b')));
        assert_eq!(stack.pop(), Some(Protocol(b'a')));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_push_on_full_stack_fails() {
        let mut stack = ProtocolStack::new(2);
        stack.push(Protocol(b'a')).unwrap();
        stack.push(Protocol(b'a')).unwrap();
        assert!(stack.is_full());

        let err = stack.push(Protocol(b'a')).unwrap_err();
        assert_eq!(err, StackError::Overflow { capacity: 2 });
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_peek_offsets() {
        let stack = ProtocolStack::from_tags(4, "xyz").unwrap();
        assert_eq!(stack.top(), Some(Protocol(b'z')));
        assert_eq!(stack.peek(0), Some(Protocol(b'z')));
        assert_eq!(stack.peek(1), Some(Protocol(b'y')));
        assert_eq!(stack.peek(2), Some(Protocol(b'x')));
        assert_eq!(stack.peek(3), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut stack = ProtocolStack::new(3);
        for _ in 0..3 {
            stack.push(Protocol(b'a')).unwrap();
        }
        let mut copy = stack.clone();
        copy.pop();

        assert!(!copy.is_full());
        assert!(stack.is_full());
    }

    #[test]
    fn test_from_tags() {
        let empty = ProtocolStack::from_tags(10, "").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty, ProtocolStack::new(10));

        let mut pushed = ProtocolStack::new(10);
        for tag in b"abcd" {
            pushed.push(Protocol(*tag)).unwrap();
        }
        assert_eq!(pushed, ProtocolStack::from_tags(10, "abcd").unwrap());
    }

    #[test]
    fn test_from_tags_too_long() {
        let err = ProtocolStack::from_tags(2, "abc").unwrap_err();
        assert_eq!(err, StackError::TooLong { len: 3, capacity: 2 });
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let small = ProtocolStack::from_tags(2, "xy").unwrap();
        let large = ProtocolStack::from_tags(8, "xy").unwrap();
        assert_eq!(small, large);

        let mut set = HashSet::new();
        set.insert(small);
        assert!(set.contains(&large));
        assert!(!set.contains(&ProtocolStack::from_tags(8, "yx").unwrap()));
    }

    #[test]
    fn test_deserialize_rejects_overflow() {
        let ok: ProtocolStack =
            serde_json::from_str(r#"{"capacity":2,"protocols":[120,121]}"#).unwrap();
        assert_eq!(ok.to_string(), "<x-y>");

        let too_long =
            serde_json::from_str::<ProtocolStack>(r#"{"capacity":1,"protocols":[120,121]}"#);
        assert!(too_long.is_err());
    }
}
