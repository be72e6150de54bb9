use std::cell::{Ref, RefCell};

use bit_set::BitSet;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::op::{self, Op};
use crate::value::Value;

/// Position of a node in its graph's arena; this is the node's identity.
pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
  pub(crate) value: f64,
  pub(crate) grad: f64,
  pub(crate) operands: SmallVec<[NodeIndex; 2]>,
  pub(crate) op: Op,
  pub(crate) label: String,
}

/// An arena holding every node of a computation graph.
///
/// Nodes are only ever appended, and a node's operands must already exist
/// when it is pushed, so an operand index is always smaller than the index of
/// the node that uses it. The operand relation can therefore never form a
/// cycle.
///
/// Values handed out by a graph borrow it, so the graph outlives every node
/// reachable from them. Only gradients are mutated after construction.
#[derive(Debug, Default)]
pub struct Graph {
  nodes: RefCell<Vec<Node>>,
}

impl Graph {
  pub fn new() -> Self {
    Self {
      nodes: RefCell::new(Vec::new()),
    }
  }

  /// Create a leaf holding `value`
  #[inline]
  pub fn var(&self, value: f64) -> Value<'_> {
    self.push(value, Op::Leaf, &[])
  }

  /// Create a leaf holding `value` with a human readable label attached
  pub fn var_labeled(&self, value: f64, label: impl Into<String>) -> Value<'_> {
    let var = self.var(value);
    var.set_label(label);
    var
  }

  /// Number of nodes recorded so far, including intermediates that are no
  /// longer reachable from any value the caller holds
  pub fn len(&self) -> usize {
    self.nodes.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.borrow().is_empty()
  }

  /// Reset the gradient of every node to 0.0 so the graph can take part in
  /// another independent backward pass
  pub fn zero_grad(&self) {
    let mut nodes = self.nodes.borrow_mut();
    trace!("zeroing gradients of {} nodes", nodes.len());
    for node in nodes.iter_mut() {
      node.grad = 0.0;
    }
  }

  /// Every node `root` depends on (itself included), ordered so that each
  /// node comes after all of its operands
  pub fn topological_order<'g>(&'g self, root: &Value<'g>) -> Vec<Value<'g>> {
    assert!(root.belongs_to(self), "value belongs to a different graph");
    self
      .topological_order_of(root.index())
      .into_iter()
      .map(|index| Value::new(self, index))
      .collect()
  }

  #[inline]
  pub(crate) fn push(&self, value: f64, op: Op, operands: &[NodeIndex]) -> Value<'_> {
    debug_assert_eq!(operands.len(), op.arity());
    let mut nodes = self.nodes.borrow_mut();
    let index = nodes.len();
    nodes.push(Node {
      value,
      grad: 0.0,
      operands: SmallVec::from_slice(operands),
      op,
      label: String::new(),
    });
    Value::new(self, index)
  }

  #[inline]
  pub(crate) fn nodes(&self) -> Ref<'_, Vec<Node>> {
    self.nodes.borrow()
  }

  #[inline]
  pub(crate) fn map_node<R, G>(&self, index: NodeIndex, f: G) -> R
  where
    G: FnOnce(&Node) -> R,
  {
    f(&self.nodes.borrow()[index])
  }

  #[inline]
  pub(crate) fn map_node_mut<R, G>(&self, index: NodeIndex, f: G) -> R
  where
    G: FnOnce(&mut Node) -> R,
  {
    f(&mut self.nodes.borrow_mut()[index])
  }

  /// Reverse-mode pass from `root`: seed it with 1.0, then run every
  /// reachable node's backward rule exactly once, dependents before operands
  pub(crate) fn backward(&self, root: NodeIndex) {
    let order = self.topological_order_of(root);
    debug!(
      "backward from node {}: {} of {} nodes reachable",
      root,
      order.len(),
      self.len()
    );

    let mut nodes = self.nodes.borrow_mut();
    nodes[root].grad = 1.0;

    for &index in order.iter().rev() {
      // read phase
      let node = &nodes[index];
      if node.operands.is_empty() {
        continue;
      }
      let inputs: SmallVec<[f64; 2]> = node.operands.iter().map(|&i| nodes[i].value).collect();

      // compute phase
      let deltas = op::pullback(node.op, node.value, node.grad, &inputs);
      let operands = node.operands.clone();

      // write phase, an operand used twice receives both contributions
      for (operand, delta) in operands.into_iter().zip(deltas) {
        nodes[operand].grad += delta;
      }
    }
  }

  /// Postorder depth-first walk from `root` along operand edges
  fn topological_order_of(&self, root: NodeIndex) -> Vec<NodeIndex> {
    let nodes = self.nodes.borrow();

    let mut stack = Vec::with_capacity(64);
    let mut order = Vec::with_capacity(64);
    // operands always sit below their dependents, so root bounds every index
    let mut visited = BitSet::with_capacity(root + 1);

    stack.push((root, false));

    // explicit stack so deep graphs cannot overflow the call stack
    while let Some((index, operands_done)) = stack.pop() {
      if operands_done {
        order.push(index);
      } else if visited.insert(index) {
        // marker to record the node once its operands are recorded
        stack.push((index, true));
        // pushed in reverse so the first operand is walked first
        for &operand in nodes[index].operands.iter().rev() {
          if !visited.contains(operand) {
            stack.push((operand, false));
          }
        }
      }
    }

    order
  }
}
