//! Iterative construction of ordered trees.
//!
//! Walks over route declarations and hydration shapes use an explicit stack,
//! so nested nodes cannot be built by returning from a recursive call.
//! Instead each nested map gets a frame; nodes are pushed into frames in any
//! order and [`TreeBuilder::finish`] stitches frames into their parents.

/// A node that can own a nested ordered map of its own kind.
pub(crate) trait Branch: Sized {
    /// Attach the finished child entries to this node.
    fn attach(&mut self, children: Vec<(String, Self)>);
}

struct Frame<T> {
    parent: Option<(usize, usize)>,
    entries: Vec<(String, T)>,
}

/// Frame arena for building a tree from a worklist.
pub(crate) struct TreeBuilder<T> {
    frames: Vec<Frame<T>>,
}

/// Index of the root frame.
pub(crate) const ROOT: usize = 0;

impl<T: Branch> TreeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            frames: vec![Frame {
                parent: None,
                entries: Vec::new(),
            }],
        }
    }

    /// Append an entry to a frame, returning its index within the frame.
    pub(crate) fn push(&mut self, frame: usize, key: impl Into<String>, node: T) -> usize {
        let entries = &mut self.frames[frame].entries;
        entries.push((key.into(), node));
        entries.len() - 1
    }

    /// Open a child frame whose entries will be attached to `frame[entry]`.
    pub(crate) fn open(&mut self, frame: usize, entry: usize) -> usize {
        self.frames.push(Frame {
            parent: Some((frame, entry)),
            entries: Vec::new(),
        });
        self.frames.len() - 1
    }

    /// Attach every frame to its parent and return the root entries.
    ///
    /// Child frames are always opened after their parent, so popping in
    /// reverse creation order finishes children before parents.
    pub(crate) fn finish(mut self) -> Vec<(String, T)> {
        while let Some(frame) = self.frames.pop() {
            match frame.parent {
                Some((parent, entry)) => self.frames[parent].entries[entry].1.attach(frame.entries),
                None => return frame.entries,
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Node {
        Leaf(u8),
        Map(Vec<(String, Node)>),
    }

    impl Branch for Node {
        fn attach(&mut self, children: Vec<(String, Self)>) {
            if let Node::Map(entries) = self {
                *entries = children;
            }
        }
    }

    #[test]
    fn frames_are_stitched_into_parents() {
        let mut builder = TreeBuilder::new();
        let a = builder.push(ROOT, "a", Node::Map(Vec::new()));
        builder.push(ROOT, "z", Node::Leaf(9));
        let a_frame = builder.open(ROOT, a);
        let b = builder.push(a_frame, "b", Node::Map(Vec::new()));
        let b_frame = builder.open(a_frame, b);
        builder.push(b_frame, "c", Node::Leaf(1));

        assert_eq!(
            builder.finish(),
            vec![
                (
                    "a".to_string(),
                    Node::Map(vec![(
                        "b".to_string(),
                        Node::Map(vec![("c".to_string(), Node::Leaf(1))])
                    )])
                ),
                ("z".to_string(), Node::Leaf(9)),
            ]
        );
    }
}
