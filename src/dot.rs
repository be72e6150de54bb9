use std::io::{self, Write};

use crate::graph::Graph;
use crate::op::Op;
use crate::value::Value;

impl Graph {
  /// Write graphviz dot for every node `root` depends on.
  ///
  /// Each node is drawn as a record of label, data and grad; nodes produced
  /// by an operation get a separate op vertex that their operands point into.
  pub fn dot(&self, root: &Value<'_>, writer: &mut impl Write) -> io::Result<()> {
    let order = self.topological_order(root);
    let nodes = self.nodes();

    writeln!(writer, "digraph G {{\nrankdir=\"LR\";")?;
    for value in &order {
      let id = value.index();
      let node = &nodes[id];
      writeln!(
        writer,
        "a{} [shape=record, label=\"{{ {} | data {:.4} | grad {:.4} }}\"];",
        id,
        escape(&node.label),
        node.value,
        node.grad
      )?;
      if node.op != Op::Leaf {
        writeln!(writer, "a{}op [label=\"{}\"];", id, node.op)?;
        writeln!(writer, "a{id}op -> a{id};")?;
      }
    }
    for value in &order {
      let id = value.index();
      for operand in &nodes[id].operands {
        writeln!(writer, "a{} -> a{}op;", operand, id)?;
      }
    }
    writeln!(writer, "}}")?;
    Ok(())
  }
}

/// Make a label safe inside a quoted record field
fn escape(label: &str) -> String {
  let mut escaped = String::with_capacity(label.len());
  for c in label.chars() {
    if matches!(c, '"' | '{' | '}' | '|' | '<' | '>' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}
