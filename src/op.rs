use std::fmt;

use smallvec::{smallvec, SmallVec};

/// The operation that produced a node.
///
/// Every node carries one of these instead of a closure; [`pullback`] is the
/// single dispatch point that turns it back into gradient contributions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
  /// A user-supplied constant, no operands
  Leaf,
  Neg,
  Add,
  Mul,
  /// Raise to a constant exponent; the exponent itself is not differentiated
  Pow { exponent: f64 },
  Exp,
  /// Fused hyperbolic tangent, its single operand is the original input
  Tanh,
}

impl Op {
  /// Number of operands a node of this kind records
  #[inline]
  pub fn arity(&self) -> usize {
    match self {
      Op::Leaf => 0,
      Op::Neg | Op::Pow { .. } | Op::Exp | Op::Tanh => 1,
      Op::Add | Op::Mul => 2,
    }
  }
}

/// Diagnostic tag, leaves render as the empty string
impl fmt::Display for Op {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Op::Leaf => Ok(()),
      Op::Neg => f.write_str("neg"),
      Op::Add => f.write_str("+"),
      Op::Mul => f.write_str("*"),
      Op::Pow { exponent } => write!(f, "pow_{exponent}"),
      Op::Exp => f.write_str("exp"),
      Op::Tanh => f.write_str("tanh"),
    }
  }
}

/// Local backward rule of a node.
///
/// Given the node's own forward `value`, its accumulated gradient `upstream`
/// and the forward values of its operands (in recorded order), return the
/// amount to add to each operand's gradient, in the same order.
#[inline]
pub(crate) fn pullback(op: Op, value: f64, upstream: f64, inputs: &[f64]) -> SmallVec<[f64; 2]> {
  debug_assert_eq!(inputs.len(), op.arity());
  match op {
    Op::Leaf => SmallVec::new(),
    Op::Neg => smallvec![-upstream],
    Op::Add => smallvec![upstream, upstream],
    // product rule, each side scaled by the other's value
    Op::Mul => smallvec![inputs[1] * upstream, inputs[0] * upstream],
    Op::Pow { exponent } => {
      smallvec![exponent * inputs[0].powf(exponent - 1.0) * upstream]
    }
    // d/dx exp(x) = exp(x), which is the node's own value
    Op::Exp => smallvec![value * upstream],
    // d/dx tanh(x) = 1 - tanh(x)^2
    Op::Tanh => smallvec![(1.0 - value * value) * upstream],
  }
}
