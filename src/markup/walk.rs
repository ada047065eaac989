use crate::markup::ast::SyntaxNode;

/// Callback invoked for every node of a markup tree.
pub trait Visitor {
    type Error;

    fn enter(&mut self, node: &SyntaxNode) -> Result<(), Self::Error>;
}

impl<F, E> Visitor for F
where
    F: FnMut(&SyntaxNode) -> Result<(), E>,
{
    type Error = E;

    fn enter(&mut self, node: &SyntaxNode) -> Result<(), E> {
        self(node)
    }
}

/// Visit `root` and all descendant nodes depth-first, in source order.
///
/// Each node is entered exactly once, before its children. The first error
/// returned by the visitor stops the walk.
pub fn walk<V: Visitor>(root: &SyntaxNode, visitor: &mut V) -> Result<(), V::Error> {
    visitor.enter(root)?;
    for child in root.child_nodes() {
        walk(child, visitor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    #[test]
    fn visits_in_document_order() {
        let root = parse("<div><pre>{'a'}</pre><p><pre /></p></div><pre />").unwrap();
        let mut starts = Vec::new();
        walk(&root, &mut |node: &SyntaxNode| {
            if node.name == "pre" {
                starts.push(node.start);
            }
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(starts, vec![5, 24, 41]);
    }

    #[test]
    fn visits_each_node_once() {
        let root = parse("<a><b><c /></b>text<!-- note --></a>").unwrap();
        let mut count = 0;
        walk(&root, &mut |_: &SyntaxNode| {
            count += 1;
            Ok::<_, ()>(())
        })
        .unwrap();

        // fragment, a, b, c, text, comment
        assert_eq!(count, 6);
    }

    #[test]
    fn error_stops_walk() {
        let root = parse("<pre /><pre /><pre />").unwrap();
        let mut seen = 0;
        let result = walk(&root, &mut |node: &SyntaxNode| {
            if node.name == "pre" {
                seen += 1;
                if seen == 2 {
                    return Err("stop");
                }
            }
            Ok(())
        });

        assert_eq!(result, Err("stop"));
        assert_eq!(seen, 2);
    }
}
