use auto_value::{Graph, Value};
use rstest::rstest;

const EPSILON: f64 = 1e-6;
const TOLERANCE: f64 = 1e-4;

fn setup_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// An expression over three inputs touching every operation, with `x` used
/// more than once
fn expression<'g>(graph: &'g Graph, inputs: [f64; 3]) -> (Value<'g>, [Value<'g>; 3]) {
  let x = graph.var(inputs[0]);
  let y = graph.var(inputs[1]);
  let z = graph.var(inputs[2]);
  let a = (x * y + 1.0).tanh();
  let b = (x - z).exp();
  let c = b.div(y.pow(2.0).unwrap() + 1.0).unwrap();
  let d = (-a * c).pow(3.0).unwrap();
  let out = d + x * x - 2.0 * z + (1.0 - y);
  (out, [x, y, z])
}

fn evaluate(inputs: [f64; 3]) -> f64 {
  let graph = Graph::new();
  expression(&graph, inputs).0.value()
}

#[rstest]
#[case([0.5, -1.2, 0.3])]
#[case([-0.7, 0.4, 1.1])]
#[case([1.5, 2.0, -0.5])]
#[case([0.0, 0.1, 0.0])]
fn matches_finite_differences(#[case] inputs: [f64; 3]) {
  setup_logger();
  let graph = Graph::new();
  let (out, vars) = expression(&graph, inputs);
  out.backward();

  for (i, var) in vars.iter().enumerate() {
    let mut plus = inputs;
    let mut minus = inputs;
    plus[i] += EPSILON;
    minus[i] -= EPSILON;
    let numeric = (evaluate(plus) - evaluate(minus)) / (2.0 * EPSILON);
    assert!(
      (var.grad() - numeric).abs() < TOLERANCE,
      "input {}: analytic {} numeric {}",
      i,
      var.grad(),
      numeric
    );
  }
}

#[rstest]
#[case(-3.0, 1.0)]
#[case(0.0, 0.0)]
#[case(1.7, 4.2)]
#[case(-0.5, -12.0)]
fn sum_has_unit_derivatives(#[case] a: f64, #[case] b: f64) {
  let graph = Graph::new();
  let a = graph.var(a);
  let b = graph.var(b);
  let y = a + b;
  y.backward();
  assert_eq!(a.grad(), 1.0);
  assert_eq!(b.grad(), 1.0);
}

#[rstest]
#[case(-3.0, 1.0)]
#[case(0.0, 5.0)]
#[case(1.7, 4.2)]
fn product_rule(#[case] a: f64, #[case] b: f64) {
  let graph = Graph::new();
  let va = graph.var(a);
  let vb = graph.var(b);
  let y = va * vb;
  y.backward();
  assert_eq!(va.grad(), b);
  assert_eq!(vb.grad(), a);
}

#[rstest]
#[case(-2.5)]
#[case(0.0)]
#[case(3.0)]
fn fan_out_sums_contributions(#[case] x: f64) {
  let graph = Graph::new();
  let v = graph.var(x);
  let y = v + v;
  y.backward();
  assert_eq!(v.grad(), 2.0);

  let graph = Graph::new();
  let v = graph.var(x);
  let y = v * v;
  y.backward();
  assert_eq!(v.grad(), 2.0 * x);
}

#[rstest]
#[case(-5.0)]
#[case(-0.8)]
#[case(0.0)]
#[case(0.3)]
#[case(2.5)]
#[case(7.0)]
#[case(400.0)]
#[case(1000.0)]
#[case(-1000.0)]
fn tanh_bound_and_derivative(#[case] x: f64) {
  let graph = Graph::new();
  let v = graph.var(x);
  let t = v.tanh();
  // the open interval (-1, 1) rounds to its endpoints once f64 saturates
  assert!(t.value() >= -1.0 && t.value() <= 1.0);
  if x.abs() < 10.0 {
    assert!(t.value() > -1.0 && t.value() < 1.0);
  }
  assert!((t.value() - x.tanh()).abs() < 1e-9);
  t.backward();
  assert_eq!(v.grad(), 1.0 - t.value() * t.value());
}

#[rstest]
#[case(2.0)]
#[case(-1.5)]
fn root_is_seeded(#[case] x: f64) {
  let graph = Graph::new();
  let v = graph.var(x);
  let y = (v * 3.0).exp();
  y.backward();
  assert_eq!(y.grad(), 1.0);
}

#[test]
fn end_to_end() {
  setup_logger();
  let graph = Graph::new();
  let a = graph.var_labeled(2.0, "a");
  let b = graph.var_labeled(-3.0, "b");
  let c = graph.var_labeled(10.0, "c");
  let e = a * b;
  let d = e + c;
  let f = graph.var_labeled(-2.0, "f");
  let l = d * f;

  assert_eq!(e.value(), -6.0);
  assert_eq!(d.value(), 4.0);
  assert_eq!(l.value(), -8.0);

  l.backward();

  assert_eq!(l.grad(), 1.0);
  assert_eq!(d.grad(), -2.0);
  assert_eq!(f.grad(), 4.0);
  assert_eq!(e.grad(), -2.0);
  assert_eq!(c.grad(), -2.0);
  assert_eq!(a.grad(), 6.0);
  assert_eq!(b.grad(), -4.0);
}

#[test]
fn neuron() {
  // inputs x1, x2, weights w1, w2, bias b; o = tanh(x1*w1 + x2*w2 + b)
  let graph = Graph::new();
  let x1 = graph.var(2.0);
  let x2 = graph.var(0.0);
  let w1 = graph.var(-3.0);
  let w2 = graph.var(1.0);
  let b = graph.var(6.881_373_587_019_543);
  let n = x1 * w1 + x2 * w2 + b;
  let o = n.tanh();
  o.backward();

  assert!((o.value() - 0.7071).abs() < 1e-4);
  assert!((n.grad() - 0.5).abs() < 1e-4);
  assert!((x1.grad() - -1.5).abs() < 1e-4);
  assert!((w1.grad() - 1.0).abs() < 1e-4);
  assert!((x2.grad() - 0.5).abs() < 1e-4);
  assert_eq!(w2.grad(), 0.0);
}

#[test]
fn fresh_graph_per_pass() {
  let run = |x: f64| {
    let graph = Graph::new();
    let v = graph.var(x);
    let y = v.pow(2.0).unwrap() * 3.0;
    y.backward();
    v.grad()
  };
  assert_eq!(run(2.0), 12.0);
  assert_eq!(run(2.0), 12.0);
}
