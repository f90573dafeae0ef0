use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::numeric::Numeric;
use crate::error::Error;

/// How freshly constructed parameters are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Init {
    /// Standard normal samples.
    Normal,
    /// Uniform samples on `[0, 1)`.
    Uniform,
    /// Normal samples scaled by `ndims / sum(dims)`, which keeps activations
    /// from blowing up in deep or tanh networks.
    #[default]
    Xavier,
}

impl Init {
    pub(crate) fn sample<T, R>(self, shape: &[usize], rng: &mut R) -> Vec<T>
    where
        T: Numeric,
        R: Rng + ?Sized,
    {
        let count = shape.iter().product::<usize>();
        match self {
            Init::Uniform => (0..count).map(|_| T::constant(rng.gen::<f64>())).collect(),
            Init::Normal => sample_scaled_normal(count, 1.0, rng),
            Init::Xavier => {
                let total = shape.iter().sum::<usize>().max(1);
                let scale = shape.len() as f64 / total as f64;
                sample_scaled_normal(count, scale, rng)
            }
        }
    }
}

fn sample_scaled_normal<T, R>(count: usize, scale: f64, rng: &mut R) -> Vec<T>
where
    T: Numeric,
    R: Rng + ?Sized,
{
    (0..count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            T::constant(scale * z)
        })
        .collect()
}

impl FromStr for Init {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Init::Normal),
            "uniform" => Ok(Init::Uniform),
            "xavier" => Ok(Init::Xavier),
            other => Err(Error::UnknownInit(other.to_string())),
        }
    }
}

impl fmt::Display for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Init::Normal => "normal",
            Init::Uniform => "uniform",
            Init::Xavier => "xavier",
        };
        f.write_str(name)
    }
}

/// Mean and standard deviation of `samples`.
#[cfg(test)]
fn moments(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[test]
fn test_init_from_str() {
    assert_eq!("xavier".parse::<Init>().unwrap(), Init::Xavier);
    assert_eq!("uniform".parse::<Init>().unwrap(), Init::Uniform);
    assert_eq!("normal".parse::<Init>().unwrap(), Init::Normal);
    assert!(matches!("he".parse::<Init>(), Err(Error::UnknownInit(_))));
    assert_eq!(Init::Xavier.to_string().parse::<Init>().unwrap(), Init::Xavier);
}

#[test]
fn test_uniform_stays_in_unit_interval() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let samples: Vec<f64> = Init::Uniform.sample(&[25, 10], &mut rng);
    assert_eq!(samples.len(), 250);
    assert!(samples.iter().all(|&x| (0.0..1.0).contains(&x)));
}

#[test]
fn test_xavier_is_scaled_by_dims() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    // 2 / (100 + 100) = 0.01
    let samples: Vec<f64> = Init::Xavier.sample(&[100, 100], &mut rng);
    let (mean, std) = moments(&samples);
    assert!(mean.abs() < 0.002, "mean={mean}");
    assert!((std - 0.01).abs() < 0.001, "std={std}");

    let normal = rand_distr::Normal::new(0.0, 1.0).unwrap();
    let reference: Vec<f64> = (0..10_000).map(|_| normal.sample(&mut rng)).collect();
    let (_, reference_std) = moments(&reference);
    let samples: Vec<f64> = Init::Normal.sample(&[10_000], &mut rng);
    let (_, std) = moments(&samples);
    assert!((std - reference_std).abs() < 0.05);
}
