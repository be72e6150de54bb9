use std::fmt;
use std::io::Write;
use std::ops::{Add, Mul, Neg, Sub};
use std::ptr;

use log::debug;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeIndex};
use crate::op::Op;

/// A handle to one scalar node of a [`Graph`].
///
/// Values are cheap to copy; copies refer to the same node. Two values are
/// equal only when they are the same node, never because their data match.
#[derive(Clone, Copy)]
pub struct Value<'g> {
  graph: &'g Graph,
  index: NodeIndex,
}

/// Anything that can take part in an operation as an operand.
///
/// Bare numbers become fresh leaves of the graph they are combined into.
pub trait IntoValue<'g> {
  fn into_value(self, graph: &'g Graph) -> Value<'g>;

  /// `-self`, as used by subtraction
  #[inline]
  fn into_negated(self, graph: &'g Graph) -> Value<'g>
  where
    Self: Sized,
  {
    self.into_value(graph).neg()
  }

  /// `self^-1`, as used by division
  #[inline]
  fn into_reciprocal(self, graph: &'g Graph) -> Result<Value<'g>>
  where
    Self: Sized,
  {
    self.into_value(graph).pow(-1.0)
  }
}

impl<'g> IntoValue<'g> for Value<'g> {
  #[inline]
  fn into_value(self, graph: &'g Graph) -> Value<'g> {
    assert!(self.belongs_to(graph), "value belongs to a different graph");
    self
  }
}

impl<'g> IntoValue<'g> for &Value<'g> {
  #[inline(always)]
  fn into_value(self, graph: &'g Graph) -> Value<'g> {
    (*self).into_value(graph)
  }
}

/// Constants are folded before they become leaves, so `x - 2.0` records a
/// leaf holding `-2.0` rather than a negation node
impl<'g> IntoValue<'g> for f64 {
  #[inline]
  fn into_value(self, graph: &'g Graph) -> Value<'g> {
    graph.var(self)
  }

  #[inline]
  fn into_negated(self, graph: &'g Graph) -> Value<'g> {
    graph.var(-self)
  }

  fn into_reciprocal(self, graph: &'g Graph) -> Result<Value<'g>> {
    Error::check_pow(self, -1.0)?;
    Ok(graph.var(self.powf(-1.0)))
  }
}

#[allow(clippy::should_implement_trait)]
impl<'g> Value<'g> {
  #[inline]
  pub(crate) fn new(graph: &'g Graph, index: NodeIndex) -> Self {
    Self { graph, index }
  }

  #[inline]
  pub(crate) fn belongs_to(&self, graph: &Graph) -> bool {
    ptr::eq(self.graph, graph)
  }

  /// The forward value, fixed at construction
  #[inline]
  pub fn value(&self) -> f64 {
    self.graph.map_node(self.index, |node| node.value)
  }

  /// The accumulated gradient of the last backward pass this node took part
  /// in, 0.0 before any
  #[inline]
  pub fn grad(&self) -> f64 {
    self.graph.map_node(self.index, |node| node.grad)
  }

  #[inline]
  pub fn op(&self) -> Op {
    self.graph.map_node(self.index, |node| node.op)
  }

  /// The direct inputs this node was computed from, in recorded order
  pub fn operands(&self) -> Vec<Value<'g>> {
    self.graph.map_node(self.index, |node| {
      node
        .operands
        .iter()
        .map(|&index| Value::new(self.graph, index))
        .collect()
    })
  }

  pub fn label(&self) -> String {
    self.graph.map_node(self.index, |node| node.label.clone())
  }

  pub fn set_label(&self, label: impl Into<String>) {
    let label = label.into();
    self.graph.map_node_mut(self.index, |node| node.label = label);
  }

  /// Position of this node in its graph
  #[inline]
  pub fn index(&self) -> NodeIndex {
    self.index
  }

  #[inline]
  pub fn graph(&self) -> &'g Graph {
    self.graph
  }

  #[inline]
  pub fn neg(&self) -> Value<'g> {
    self.graph.push(-self.value(), Op::Neg, &[self.index])
  }

  #[inline]
  pub fn add(&self, other: impl IntoValue<'g>) -> Value<'g> {
    let other = other.into_value(self.graph);
    let value = self.value() + other.value();
    self.graph.push(value, Op::Add, &[self.index, other.index])
  }

  /// `self + (-other)`
  #[inline]
  pub fn sub(&self, other: impl IntoValue<'g>) -> Value<'g> {
    let negated = other.into_negated(self.graph);
    self.add(negated)
  }

  /// Reflected subtraction, `other - self`
  #[inline]
  pub fn rsub(&self, other: impl IntoValue<'g>) -> Value<'g> {
    Value::add(&self.neg(), other)
  }

  #[inline]
  pub fn mul(&self, other: impl IntoValue<'g>) -> Value<'g> {
    let other = other.into_value(self.graph);
    let value = self.value() * other.value();
    self.graph.push(value, Op::Mul, &[self.index, other.index])
  }

  /// `self * other^-1`; fails when `other` is zero
  pub fn div(&self, other: impl IntoValue<'g>) -> Result<Value<'g>> {
    let reciprocal = other.into_reciprocal(self.graph)?;
    Ok(self.mul(reciprocal))
  }

  /// Reflected division, `other * self^-1`; fails when `self` is zero
  pub fn rdiv(&self, other: impl IntoValue<'g>) -> Result<Value<'g>> {
    let reciprocal = self.pow(-1.0)?;
    Ok(Value::mul(&reciprocal, other))
  }

  /// Raise to a constant exponent.
  ///
  /// Fails when the result is undefined over the reals: a negative base with
  /// a non-integer exponent, or zero with a negative exponent.
  pub fn pow(&self, exponent: f64) -> Result<Value<'g>> {
    let base = self.value();
    if let Err(err) = Error::check_pow(base, exponent) {
      debug!("rejected pow on node {}: {}", self.index, err);
      return Err(err);
    }
    Ok(self.raise(exponent))
  }

  #[inline]
  pub fn exp(&self) -> Value<'g> {
    self.graph.push(self.value().exp(), Op::Exp, &[self.index])
  }

  /// Hyperbolic tangent, evaluated as `(1 - e^-2|x|) / (1 + e^-2|x|)` with
  /// the sign of `x` restored.
  ///
  /// The intermediate nodes only produce the value. The returned node's sole
  /// operand is `self`, and its backward rule applies `1 - tanh^2` directly
  /// instead of flowing through the intermediates.
  pub fn tanh(&self) -> Value<'g> {
    let negative = self.value() < 0.0;
    // exponent is never positive, so e lies in [0, 1] and cannot overflow
    let e = self.mul(if negative { 2.0 } else { -2.0 }).exp();
    // 1 + e >= 1, so the reciprocal is always defined
    let t = (1.0 - e) * (e + 1.0).raise(-1.0);
    let value = if negative { -t.value() } else { t.value() };
    self.graph.push(value, Op::Tanh, &[self.index])
  }

  /// Compute the gradient of this value with respect to every node it
  /// depends on, accumulating into their `grad`
  pub fn backward(&self) {
    self.graph.backward(self.index);
  }

  /// Write the subgraph rooted here as graphviz dot
  pub fn dot(&self, writer: &mut impl Write) -> std::io::Result<()> {
    self.graph.dot(self, writer)
  }

  #[inline]
  fn raise(&self, exponent: f64) -> Value<'g> {
    let value = self.value().powf(exponent);
    self.graph.push(value, Op::Pow { exponent }, &[self.index])
  }
}

impl PartialEq for Value<'_> {
  fn eq(&self, other: &Self) -> bool {
    ptr::eq(self.graph, other.graph) && self.index == other.index
  }
}

impl Eq for Value<'_> {}

impl fmt::Display for Value<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Value(data={:?}, grad={:?})", self.value(), self.grad())
  }
}

impl fmt::Debug for Value<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.graph.map_node(self.index, |node| {
      f.debug_struct("Value")
        .field("index", &self.index)
        .field("op", &node.op.to_string())
        .field("data", &node.value)
        .field("grad", &node.grad)
        .finish()
    })
  }
}

impl<'g> Neg for Value<'g> {
  type Output = Value<'g>;

  #[inline(always)]
  fn neg(self) -> Self::Output {
    Value::neg(&self)
  }
}

impl<'g> Neg for &Value<'g> {
  type Output = Value<'g>;

  #[inline(always)]
  fn neg(self) -> Self::Output {
    Value::neg(self)
  }
}

// Every combination of owned value, borrowed value and constant on the right
macro_rules! binary_operator {
  ($trait:ident, $method:ident) => {
    impl<'g> $trait<Value<'g>> for Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: Value<'g>) -> Self::Output {
        Value::$method(&self, other)
      }
    }

    impl<'a, 'g> $trait<&'a Value<'g>> for Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: &'a Value<'g>) -> Self::Output {
        Value::$method(&self, other)
      }
    }

    impl<'a, 'g> $trait<Value<'g>> for &'a Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: Value<'g>) -> Self::Output {
        Value::$method(self, other)
      }
    }

    impl<'a, 'b, 'g> $trait<&'b Value<'g>> for &'a Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: &'b Value<'g>) -> Self::Output {
        Value::$method(self, other)
      }
    }

    impl<'g> $trait<f64> for Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        Value::$method(&self, other)
      }
    }

    impl<'a, 'g> $trait<f64> for &'a Value<'g> {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        Value::$method(self, other)
      }
    }
  };
}

binary_operator!(Add, add);
binary_operator!(Sub, sub);
binary_operator!(Mul, mul);

// Constant on the left
macro_rules! reflected_operator {
  ($trait:ident, $method:ident, $reflected:ident) => {
    impl<'g> $trait<Value<'g>> for f64 {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: Value<'g>) -> Self::Output {
        Value::$reflected(&other, self)
      }
    }

    impl<'a, 'g> $trait<&'a Value<'g>> for f64 {
      type Output = Value<'g>;

      #[inline(always)]
      fn $method(self, other: &'a Value<'g>) -> Self::Output {
        Value::$reflected(other, self)
      }
    }
  };
}

reflected_operator!(Add, add, add);
reflected_operator!(Sub, sub, rsub);
reflected_operator!(Mul, mul, mul);
