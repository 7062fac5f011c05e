use rayon::prelude::*;

use super::AggregationErr;
use crate::storage::{LstmTensors, Matrix, Shape, TensorBundle, Vector};

/// Computes the element-wise arithmetic mean of `bundles`.
///
/// The first bundle's `Wi` and `bi` define the round's shape, every other bundle must
/// match it exactly. Each element is summed in the order of `bundles`, starting from
/// `0.0`, and then divided by the amount of bundles. Rows are reduced in parallel but the
/// per-element summation order never changes, so the result is bit-for-bit reproducible.
///
/// # Arguments
/// * `bundles` - The round's contributions, in participant order.
///
/// # Returns
/// The averaged tensors or an `AggregationErr` if the shapes don't agree.
pub fn mean(bundles: &[TensorBundle]) -> Result<LstmTensors, AggregationErr> {
    let first = bundles.first().ok_or(AggregationErr::NoContributions)?;
    let shape = first
        .tensors
        .shape()
        .map_err(|source| AggregationErr::Shape {
            node: first.node_id.clone(),
            source,
        })?;

    for bundle in &bundles[1..] {
        bundle
            .tensors
            .conform(shape)
            .map_err(|source| AggregationErr::Shape {
                node: bundle.node_id.clone(),
                source,
            })?;
    }

    let n = bundles.len() as f64;
    let all: Vec<&LstmTensors> = bundles.iter().map(|b| &b.tensors).collect();

    Ok(LstmTensors {
        wi: mean_matrix(&all, shape, n, |t| &t.wi),
        wf: mean_matrix(&all, shape, n, |t| &t.wf),
        wo: mean_matrix(&all, shape, n, |t| &t.wo),
        wc: mean_matrix(&all, shape, n, |t| &t.wc),
        bi: mean_vector(&all, shape.bias_len, n, |t| &t.bi),
        bf: mean_vector(&all, shape.bias_len, n, |t| &t.bf),
        bo: mean_vector(&all, shape.bias_len, n, |t| &t.bo),
        bc: mean_vector(&all, shape.bias_len, n, |t| &t.bc),
    })
}

fn mean_matrix<F>(all: &[&LstmTensors], shape: Shape, n: f64, select: F) -> Matrix
where
    F: Fn(&LstmTensors) -> &Matrix + Sync,
{
    (0..shape.rows)
        .into_par_iter()
        .map(|i| {
            let mut row = vec![0.0; shape.cols];

            for tensors in all {
                row.iter_mut()
                    .zip(&select(*tensors)[i])
                    .for_each(|(acc, x)| *acc += x);
            }

            row.iter_mut().for_each(|x| *x /= n);
            row
        })
        .collect()
}

fn mean_vector<F>(all: &[&LstmTensors], len: usize, n: f64, select: F) -> Vector
where
    F: Fn(&LstmTensors) -> &Vector,
{
    let mut out = vec![0.0; len];

    for tensors in all {
        out.iter_mut()
            .zip(select(*tensors))
            .for_each(|(acc, x)| *acc += x);
    }

    out.iter_mut().for_each(|x| *x /= n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ShapeErr;

    fn uniform(node: &str, rows: usize, cols: usize, value: f64) -> TensorBundle {
        let m = vec![vec![value; cols]; rows];
        let v = vec![value; rows];
        let tensors = LstmTensors {
            wi: m.clone(),
            wf: m.clone(),
            wo: m.clone(),
            wc: m,
            bi: v.clone(),
            bf: v.clone(),
            bo: v.clone(),
            bc: v,
        };
        TensorBundle::new(node, tensors, 1)
    }

    #[test]
    fn test_mean_of_three_contributions() {
        let bundles = [
            uniform("soft", 2, 2, 1.0),
            uniform("web", 2, 2, 2.0),
            uniform("hard", 2, 2, 6.0),
        ];

        let out = mean(&bundles).unwrap();
        assert_eq!(out.wi, vec![vec![3.0; 2]; 2]);
        assert_eq!(out.wc, vec![vec![3.0; 2]; 2]);
        assert_eq!(out.bo, vec![3.0; 2]);
    }

    #[test]
    fn test_mean_of_identical_contributions_is_identity() {
        let mut soft = uniform("soft", 2, 2, 0.0);
        soft.tensors.wi = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let mut web = soft.clone();
        web.node_id = "web".into();
        let mut hard = soft.clone();
        hard.node_id = "hard".into();

        let out = mean(&[soft.clone(), web, hard]).unwrap();
        for (got, want) in out.wi.iter().flatten().zip(soft.tensors.wi.iter().flatten()) {
            assert!((got - want).abs() <= 1e-12 * want.abs());
        }
    }

    #[test]
    fn test_summation_follows_contribution_order() {
        let values = [1.0, 1e16, -1e16];
        let bundles: Vec<_> = values
            .iter()
            .map(|&v| uniform("n", 1, 1, v))
            .collect();

        // Summed in reverse the 1.0 survives and the mean is 1/3.
        let expected: f64 = ((0.0 + 1.0) + 1e16 + -1e16) / 3.0;
        let out = mean(&bundles).unwrap();
        assert_eq!(expected, 0.0);
        assert_eq!(out.wi[0][0].to_bits(), expected.to_bits());
        assert_eq!(out.bi[0].to_bits(), expected.to_bits());
    }

    #[test]
    fn test_nan_propagates() {
        let bundles = [uniform("soft", 1, 1, f64::NAN), uniform("web", 1, 1, 1.0)];

        let out = mean(&bundles).unwrap();
        assert!(out.wf[0][0].is_nan());
        assert!(out.bf[0].is_nan());
    }

    #[test]
    fn test_shape_mismatch_names_the_contributor() {
        let bundles = [uniform("soft", 2, 2, 1.0), uniform("web", 2, 3, 1.0)];

        let err = mean(&bundles).unwrap_err();
        assert_eq!(
            err,
            AggregationErr::Shape {
                node: "web".into(),
                source: ShapeErr::MatrixShape {
                    tensor: "Wi",
                    expected: (2, 2),
                    got: (2, 3)
                }
            }
        );
    }

    #[test]
    fn test_empty_round_is_refused() {
        assert_eq!(mean(&[]).unwrap_err(), AggregationErr::NoContributions);
    }

    #[test]
    fn test_empty_tensors_average_to_empty_tensors() {
        let bundles = [uniform("soft", 0, 0, 1.0), uniform("web", 0, 0, 2.0)];

        let out = mean(&bundles).unwrap();
        assert!(out.wi.is_empty());
        assert!(out.bi.is_empty());
    }
}
