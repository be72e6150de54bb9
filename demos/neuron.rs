use auto_value::{Graph, Result, Value};

/// A single tanh neuron with two inputs
struct Neuron {
  w1: f64,
  w2: f64,
  b: f64,
  learning_rate: f64,
}

impl Neuron {
  fn forward<'g>(&self, params: &[Value<'g>; 3], x1: f64, x2: f64) -> Value<'g> {
    let [w1, w2, b] = params;
    (w1 * x1 + w2 * x2 + b).tanh()
  }

  /// One step of gradient descent over the whole data set, on a fresh graph
  fn step(&mut self, data: &[(f64, f64, f64)]) -> Result<f64> {
    let graph = Graph::new();
    let params = [graph.var(self.w1), graph.var(self.w2), graph.var(self.b)];

    // mean squared error
    let mut loss = graph.var(0.0);
    for &(x1, x2, y) in data {
      let out = self.forward(&params, x1, x2);
      loss = loss + (out - y).pow(2.0)?;
    }
    let loss = loss.div(data.len() as f64)?;
    loss.backward();

    let [w1, w2, b] = params;
    self.w1 -= self.learning_rate * w1.grad();
    self.w2 -= self.learning_rate * w2.grad();
    self.b -= self.learning_rate * b.grad();
    Ok(loss.value())
  }
}

fn main() -> Result<()> {
  env_logger::init();

  // target: a soft AND of the two inputs
  let data = [
    (-1.0, -1.0, -0.9),
    (-1.0, 1.0, -0.9),
    (1.0, -1.0, -0.9),
    (1.0, 1.0, 0.9),
  ];

  let mut neuron = Neuron {
    w1: 0.3,
    w2: -0.2,
    b: 0.1,
    learning_rate: 0.1,
  };

  let epochs = 500;
  for epoch in 0..epochs {
    let loss = neuron.step(&data)?;
    if epoch % 50 == 0 {
      println!("Epoch {} | Loss = {:.6}", epoch, loss);
    }
  }

  println!("trained parameters:");
  println!("w1 = {}", neuron.w1);
  println!("w2 = {}", neuron.w2);
  println!("b  = {}", neuron.b);

  let graph = Graph::new();
  let params = [
    graph.var(neuron.w1),
    graph.var(neuron.w2),
    graph.var(neuron.b),
  ];
  for &(x1, x2, y) in &data {
    let out = neuron.forward(&params, x1, x2);
    println!("input: ({}, {}), target: {}, output: {:.6}", x1, x2, y, out.value());
  }
  Ok(())
}
