use crate::error::{GateError, Result};

/// Stable index of a node inside the arena of the chain that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One link of a [`Chain`](super::Chain).
///
/// `child` points towards the tail and `parent` back towards the head. The
/// value slot is only ever empty for nodes built by hand with [`Node::empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    pub(crate) value: Option<T>,
    pub(crate) child: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<T> Node<T> {
    pub fn new(value: Option<T>, child: Option<NodeId>, parent: Option<NodeId>) -> Self {
        Self {
            value,
            child,
            parent,
        }
    }

    pub fn empty() -> Self {
        Self::new(None, None, None)
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The stored value, or [`GateError::EmptyNode`] for an empty slot
    pub fn unwrap(&self) -> Result<&T> {
        self.value.as_ref().ok_or(GateError::EmptyNode)
    }

    /// The next node, or [`GateError::NoChild`] at the tail
    pub fn forward(&self) -> Result<NodeId> {
        self.child.ok_or(GateError::NoChild)
    }

    /// The previous node, or [`GateError::NoParent`] at the head
    pub fn backward(&self) -> Result<NodeId> {
        self.parent.ok_or(GateError::NoParent)
    }
}
