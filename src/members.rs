//! Member selection and display ordering.
//!
//! [`Members`] is a lazy view over a node's children. Filters compose in any
//! order and the view can be cloned to restart iteration; [`Members::ordered`]
//! produces the display order.

use crate::model::{Category, DocNode, Kind, Visibility};

#[derive(Clone)]
enum Predicate {
    Kinds(Vec<Kind>),
    Categories(Vec<Category>),
    Visibilities(Vec<Visibility>),
    Custom(fn(&DocNode) -> bool),
}

impl Predicate {
    fn accepts(&self, node: &DocNode) -> bool {
        match self {
            Predicate::Kinds(kinds) => kinds.contains(&node.kind()),
            Predicate::Categories(categories) => categories.contains(&node.kind().category()),
            Predicate::Visibilities(levels) => levels.contains(&node.visibility()),
            Predicate::Custom(f) => f(node),
        }
    }
}

/// Filtered view over a sequence of sibling nodes
#[derive(Clone)]
pub struct Members<'a> {
    nodes: std::slice::Iter<'a, DocNode>,
    predicates: Vec<Predicate>,
}

impl<'a> Members<'a> {
    pub fn new(nodes: &'a [DocNode]) -> Self {
        Self {
            nodes: nodes.iter(),
            predicates: Vec::new(),
        }
    }

    /// Members of a node
    pub fn of(node: &'a DocNode) -> Self {
        Self::new(node.children())
    }

    /// Keep members whose kind is one of `kinds`
    pub fn kinds(mut self, kinds: &[Kind]) -> Self {
        self.predicates.push(Predicate::Kinds(kinds.to_vec()));
        self
    }

    /// Keep members in one of the display categories
    pub fn categories(mut self, categories: &[Category]) -> Self {
        self.predicates.push(Predicate::Categories(categories.to_vec()));
        self
    }

    /// Keep members with one of the visibility levels
    pub fn visibility(mut self, levels: &[Visibility]) -> Self {
        self.predicates.push(Predicate::Visibilities(levels.to_vec()));
        self
    }

    pub fn public_only(self) -> Self {
        self.visibility(&[Visibility::Public])
    }

    /// Keep invocable members (methods, functions, constructors)
    pub fn callables(self) -> Self {
        self.filter_by(|node| node.kind().is_callable())
    }

    /// Keep members accepted by an arbitrary predicate
    pub fn filter_by(mut self, predicate: fn(&DocNode) -> bool) -> Self {
        self.predicates.push(Predicate::Custom(predicate));
        self
    }

    /// Remaining members in display order
    pub fn ordered(self) -> Vec<&'a DocNode> {
        order_members(self)
    }
}

impl<'a> Iterator for Members<'a> {
    type Item = &'a DocNode;

    fn next(&mut self) -> Option<Self::Item> {
        let predicates = &self.predicates;
        self.nodes
            .by_ref()
            .find(|node| predicates.iter().all(|p| p.accepts(node)))
    }
}

/// Sort nodes for display: by category, then by name. The sort is stable,
/// so equal names keep declaration order.
pub fn order_members<'a, I>(nodes: I) -> Vec<&'a DocNode>
where
    I: IntoIterator<Item = &'a DocNode>,
{
    let mut ordered: Vec<&'a DocNode> = nodes.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.kind()
            .category()
            .cmp(&b.kind().category())
            .then_with(|| a.name().cmp(b.name()))
    });
    ordered
}
