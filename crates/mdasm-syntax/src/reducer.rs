//! Reduction: scope tree to a single AST node.
//!
//! Scopes are collapsed innermost first. Inside one scope the children form
//! a flat list of values, raw operators and label markers, which is folded
//! by repeated passes:
//!
//! 1. Pick the unresolved operator that binds tightest (lowest
//!    [`precedence`](crate::ast::OperatorKind::precedence), leftmost on
//!    ties). Label markers are candidates only in the root scope and bind
//!    loosest of all.
//! 2. Attach whichever complete neighbours it still needs.
//! 3. If nothing could be attached the pivot is ignored until the next
//!    successful attachment; otherwise all ignore marks are cleared.
//!
//! The scope is resolved when no candidate remains. Exactly one complete
//! node must be left.
//!
//! The walk is iterative, so nesting depth is bounded only by memory.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::ast::{AstNode, OperatorKind};
use crate::error::SyntaxError;
use crate::grouper::{ScopeKind, ScopeNode};

/// Label markers resolve after every operator.
const LABEL_PRECEDENCE: u8 = 12;

/// Collapse a line's scope tree.
///
/// Returns `Ok(None)` for a line with nothing in it.
///
/// # Errors
///
/// - [`SyntaxError::UnresolvedExpression`] when a scope does not fold into
///   one complete node.
/// - [`SyntaxError::InvalidMacroArgument`] when a macro argument does not.
pub fn reduce(root: ScopeNode) -> Result<Option<AstNode>, SyntaxError> {
    let mut stack = vec![Frame::new(Role::Root, root.children)];

    while let Some(frame) = stack.last_mut() {
        match frame.children.next() {
            Some(child) if child.is_scope() => {
                let role = match child.kind {
                    ScopeKind::MacroCall => Role::call(child.value),
                    ScopeKind::Operator => Role::Subscript,
                    _ if matches!(frame.role, Role::Call { .. }) => Role::Argument,
                    _ => Role::Group,
                };
                stack.push(Frame::new(role, child.children));
            }
            Some(child) => frame.items.push(Item::leaf(child)),
            None => {
                let result = match stack.pop() {
                    Some(done) => done.collapse()?,
                    None => None,
                };
                match stack.last_mut() {
                    Some(parent) => {
                        if let Some(node) = result {
                            parent.items.push(Item::Node(node));
                        }
                    }
                    None => return Ok(result),
                }
            }
        }
    }
    Ok(None)
}

/// What a scope collapses into.
#[derive(Debug)]
enum Role {
    Root,
    Group,
    Subscript,
    Argument,
    Call {
        name: String,
        size_suffix: Option<String>,
    },
}

impl Role {
    fn call(value: Option<AstNode>) -> Self {
        match value {
            Some(AstNode::MacroCall {
                name, size_suffix, ..
            }) => Role::Call { name, size_suffix },
            _ => Role::Call {
                name: String::new(),
                size_suffix: None,
            },
        }
    }
}

#[derive(Debug)]
enum Item {
    Node(AstNode),
    Label,
}

impl Item {
    fn leaf(node: ScopeNode) -> Self {
        match (node.kind, node.value) {
            (ScopeKind::Label, _) | (_, None) => Item::Label,
            (_, Some(value)) => Item::Node(value),
        }
    }

    fn is_complete(&self) -> bool {
        matches!(self, Item::Node(n) if n.is_complete())
    }

    /// Pivot precedence, if this item still has something to resolve.
    fn precedence(&self, labels: bool) -> Option<u8> {
        match self {
            Item::Label if labels => Some(LABEL_PRECEDENCE),
            Item::Node(node @ AstNode::Operator { op, .. }) if !node.is_complete() => {
                Some(op.precedence())
            }
            _ => None,
        }
    }
}

struct Slot {
    item: Item,
    ignored: bool,
}

struct Frame {
    role: Role,
    children: vec::IntoIter<ScopeNode>,
    items: Vec<Item>,
}

impl Frame {
    fn new(role: Role, children: Vec<ScopeNode>) -> Self {
        Self {
            role,
            items: Vec::with_capacity(children.len()),
            children: children.into_iter(),
        }
    }

    fn collapse(self) -> Result<Option<AstNode>, SyntaxError> {
        let role = match self.role {
            Role::Call { name, size_suffix } => {
                let args = self
                    .items
                    .into_iter()
                    .filter_map(|item| match item {
                        Item::Node(node) => Some(node),
                        Item::Label => None,
                    })
                    .collect();
                return Ok(Some(AstNode::MacroCall {
                    name,
                    size_suffix,
                    args,
                }));
            }
            role => role,
        };

        let mut items = resolve(self.items, matches!(role, Role::Root));
        if items.len() > 1 {
            log::trace!("{} items left unresolved in {:?} scope", items.len(), role);
            return Err(match role {
                Role::Argument => SyntaxError::InvalidMacroArgument {
                    detail: String::from("argument does not reduce to a single value"),
                    offset: None,
                },
                _ => SyntaxError::UnresolvedExpression,
            });
        }

        let node = match items.pop() {
            Some(Item::Node(node)) => node,
            Some(Item::Label) => return Err(SyntaxError::UnresolvedExpression),
            None => {
                return match role {
                    Role::Argument => Ok(Some(AstNode::text(""))),
                    Role::Subscript => Err(SyntaxError::UnresolvedExpression),
                    _ => Ok(None),
                }
            }
        };

        if !node.is_complete() {
            return Err(match role {
                Role::Argument => SyntaxError::InvalidMacroArgument {
                    detail: format!("'{}' is incomplete", node),
                    offset: None,
                },
                _ => SyntaxError::UnresolvedExpression,
            });
        }

        Ok(Some(match role {
            Role::Subscript => AstNode::Operator {
                op: OperatorKind::ArraySubscript,
                left: None,
                right: Some(Box::new(node)),
            },
            _ => node,
        }))
    }
}

/// Fold one scope's items as far as they go.
fn resolve(items: Vec<Item>, labels: bool) -> Vec<Item> {
    let mut slots: Vec<Slot> = signs(items)
        .into_iter()
        .map(|item| Slot {
            item,
            ignored: false,
        })
        .collect();

    while let Some(pivot) = pick(&slots, labels) {
        if attach(&mut slots, pivot) {
            for slot in &mut slots {
                slot.ignored = false;
            }
        } else {
            slots[pivot].ignored = true;
        }
    }

    slots.into_iter().map(|slot| slot.item).collect()
}

/// Turn `-`/`+` with nothing to their left into signs: `-` becomes `Neg`,
/// `+` is dropped.
fn signs(items: Vec<Item>) -> Vec<Item> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        if let Item::Node(AstNode::Operator {
            op: op @ (OperatorKind::Sub | OperatorKind::Add),
            left: None,
            right: None,
        }) = &item
        {
            let prefix = match out.last() {
                None | Some(Item::Label) => true,
                Some(Item::Node(AstNode::Operator { right: None, .. })) => true,
                Some(Item::Node(_)) => false,
            };
            if prefix {
                if *op == OperatorKind::Sub {
                    out.push(Item::Node(AstNode::operator(OperatorKind::Neg)));
                }
                continue;
            }
        }
        out.push(item);
    }
    out
}

fn pick(slots: &[Slot], labels: bool) -> Option<usize> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.ignored)
        .filter_map(|(k, slot)| slot.item.precedence(labels).map(|p| (p, k)))
        .min()
        .map(|(_, k)| k)
}

fn complete_at(slots: &[Slot], k: usize) -> bool {
    slots.get(k).map_or(false, |slot| slot.item.is_complete())
}

fn take_node(slots: &mut Vec<Slot>, k: usize) -> Option<Box<AstNode>> {
    match slots.remove(k).item {
        Item::Node(node) => Some(Box::new(node)),
        Item::Label => None,
    }
}

fn attach(slots: &mut Vec<Slot>, k: usize) -> bool {
    match &slots[k].item {
        Item::Label => attach_label(slots, k),
        Item::Node(AstNode::Operator { op, left, right }) => {
            let needs_left = !op.is_unary() && left.is_none();
            let needs_right = right.is_none();
            attach_operator(slots, k, needs_left, needs_right)
        }
        Item::Node(_) => false,
    }
}

fn attach_operator(slots: &mut Vec<Slot>, k: usize, needs_left: bool, needs_right: bool) -> bool {
    let take_right = needs_right && complete_at(slots, k + 1);
    let take_left = needs_left && k > 0 && complete_at(slots, k - 1);
    if !take_right && !take_left {
        return false;
    }

    let right_node = if take_right {
        take_node(slots, k + 1)
    } else {
        None
    };
    let (pivot, left_node) = if take_left {
        (k - 1, take_node(slots, k - 1))
    } else {
        (k, None)
    };

    if let Item::Node(AstNode::Operator { left, right, .. }) = &mut slots[pivot].item {
        if right_node.is_some() {
            *right = right_node;
        }
        if left_node.is_some() {
            *left = left_node;
        }
    }
    true
}

/// `name: target`. The name must be complete; the target may be absent, a
/// complete node, or an assignment still missing its left side (`foo: = 5`).
fn attach_label(slots: &mut Vec<Slot>, k: usize) -> bool {
    if k == 0 || !complete_at(slots, k - 1) {
        return false;
    }
    let has_target = match slots.get(k + 1).map(|slot| &slot.item) {
        None => false,
        Some(Item::Node(node)) if node.is_complete() || is_equate(node) => true,
        Some(_) => return false,
    };

    let target = if has_target {
        take_node(slots, k + 1)
    } else {
        None
    };
    let name = match take_node(slots, k - 1) {
        Some(name) => name,
        None => return false,
    };
    slots[k - 1].item = Item::Node(AstNode::LabelCreate { name, target });
    true
}

fn is_equate(node: &AstNode) -> bool {
    matches!(
        node,
        AstNode::Operator {
            op: OperatorKind::Set,
            left: None,
            right: Some(_),
        }
    )
}
