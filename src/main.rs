use light_nn::loss::Sse;
use light_nn::nn::{Layer, Linear, Sequential, Sigmoid};
use light_nn::optim::GradientDescent;
use light_nn::tensor::{Init, RawTensor};
use light_nn::train_epoch;

use rand::prelude::*;

fn main() -> light_nn::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);

    println!("Training neural network to create XOR gate");
    let xs: Vec<RawTensor<f64>> = [[0., 0.], [0., 1.], [1., 0.], [1., 1.]]
        .iter()
        .map(|x| RawTensor::from(x.to_vec()))
        .collect();
    let ys: Vec<RawTensor<f64>> = [0., 1., 1., 0.]
        .iter()
        .map(|&y| RawTensor::from(vec![y]))
        .collect();

    let mut net = Sequential::<f64>::default()
        .with(Linear::new(2, 2, Init::Xavier, &mut rng))
        .with(Sigmoid::new())
        .with(Linear::new(2, 1, Init::Xavier, &mut rng));
    let mut optimizer = GradientDescent::<f64>::new(0.1);

    for epoch in 0..3000 {
        let epoch_loss = train_epoch(&mut net, &Sse, &mut optimizer, xs.iter().zip(&ys))?;
        if epoch % 500 == 0 || epoch == 2999 {
            println!("epoch={epoch}, xor loss={epoch_loss:.3}");
        }
    }

    for x in xs.iter() {
        let predicted = net.forward(x.clone())?;
        println!("input={:?}, predicted={:.3}", x.as_slice(), predicted.as_slice()[0]);
    }

    println!("\nXOR network params");
    for param in net.params() {
        println!("{:?}", param.borrow().as_slice());
    }
    Ok(())
}
