use super::ObjectRef;

/// All descendants of `root` (excluding `root`) in depth-first pre-order
///
/// Each child is followed by its own subtree before its next sibling, which is
/// the order tree dumps and first-match searches use.
pub fn descendants(root: &ObjectRef) -> Vec<ObjectRef> {
    let mut out = Vec::new();
    let mut stack: Vec<ObjectRef> = root.children().into_iter().rev().collect();

    while let Some(obj) = stack.pop() {
        stack.extend(obj.children().into_iter().rev());
        out.push(obj);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    #[test]
    fn test_pre_order_traversal() {
        let host = MemoryHost::new();
        let root = host.object("root", "Window").build();
        let a = host.object("a", "Frame").build();
        let a1 = host.object("a1", "Label").build();
        let a2 = host.object("a2", "Label").build();
        let b = host.object("b", "Frame").build();
        a.add_child(a1);
        a.add_child(a2);
        root.add_child(a);
        root.add_child(b);

        let root: ObjectRef = root;
        let names: Vec<String> = descendants(&root)
            .iter()
            .map(|o| o.object_name())
            .collect();
        assert_eq!(names, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_leaf_has_no_descendants() {
        let host = MemoryHost::new();
        let leaf: ObjectRef = host.object("leaf", "Label").build();
        assert!(descendants(&leaf).is_empty());
    }
}
