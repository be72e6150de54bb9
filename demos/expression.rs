use std::io;

use auto_value::Graph;

fn main() -> io::Result<()> {
  env_logger::init();

  // Build the graph for L = (a * b + c) * f
  let graph = Graph::new();
  let a = graph.var_labeled(2.0, "a");
  let b = graph.var_labeled(-3.0, "b");
  let c = graph.var_labeled(10.0, "c");
  let e = a * b;
  e.set_label("e");
  let d = e + c;
  d.set_label("d");
  let f = graph.var_labeled(-2.0, "f");
  let l = d * f;
  l.set_label("L");

  l.backward();

  for value in [a, b, c, e, d, f, l] {
    println!("{:>2} = {}", value.label(), value);
  }

  // pipe into `dot -Tsvg` to render
  println!();
  l.dot(&mut io::stdout().lock())
}
