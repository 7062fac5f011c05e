use serde::{Deserialize, Serialize};

use super::{Shape, ShapeErr, StagingKey};

/// A numbered aggregation cycle.
pub type Round = u32;

/// A dense row-major matrix, transported as nested arrays.
pub type Matrix = Vec<Vec<f64>>;

/// A dense vector, transported as a flat array.
pub type Vector = Vec<f64>;

/// The gate weights and biases of an LSTM cell.
///
/// Field names keep the wire casing: capital-initial weights, lowercase-initial biases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LstmTensors {
    #[serde(rename = "Wi")]
    pub wi: Matrix,
    #[serde(rename = "Wf")]
    pub wf: Matrix,
    #[serde(rename = "Wo")]
    pub wo: Matrix,
    #[serde(rename = "Wc")]
    pub wc: Matrix,
    pub bi: Vector,
    pub bf: Vector,
    pub bo: Vector,
    pub bc: Vector,
}

impl LstmTensors {
    /// The four weight matrices paired with their wire names, in gate order.
    pub fn matrices(&self) -> [(&'static str, &Matrix); 4] {
        [
            ("Wi", &self.wi),
            ("Wf", &self.wf),
            ("Wo", &self.wo),
            ("Wc", &self.wc),
        ]
    }

    /// The four bias vectors paired with their wire names, in gate order.
    pub fn vectors(&self) -> [(&'static str, &Vector); 4] {
        [
            ("bi", &self.bi),
            ("bf", &self.bf),
            ("bo", &self.bo),
            ("bc", &self.bc),
        ]
    }

    /// Finds the first element that isn't a finite number, in gate order.
    ///
    /// # Returns
    /// The wire name of the offending tensor and its value, `None` if every element is finite.
    pub fn non_finite(&self) -> Option<(&'static str, f64)> {
        let matrices = self
            .matrices()
            .into_iter()
            .flat_map(|(tensor, m)| m.iter().flatten().map(move |&x| (tensor, x)));
        let vectors = self
            .vectors()
            .into_iter()
            .flat_map(|(tensor, v)| v.iter().map(move |&x| (tensor, x)));

        matrices.chain(vectors).find(|(_, x)| !x.is_finite())
    }

    /// Validates the internal shape invariants of these tensors.
    ///
    /// `Wi` defines the matrix shape and `bi` the bias length, every other tensor must match.
    ///
    /// # Returns
    /// The common shape or the first violation found.
    pub fn shape(&self) -> Result<Shape, ShapeErr> {
        let (rows, cols) = Shape::matrix_dims("Wi", &self.wi)?;
        let shape = Shape {
            rows,
            cols,
            bias_len: self.bi.len(),
        };

        self.conform(shape)?;
        Ok(shape)
    }

    /// Checks that every tensor has exactly the `expected` shape.
    ///
    /// # Arguments
    /// * `expected` - The shape every matrix and vector must have.
    ///
    /// # Returns
    /// A `ShapeErr` naming the first tensor that doesn't conform.
    pub fn conform(&self, expected: Shape) -> Result<(), ShapeErr> {
        for (tensor, matrix) in self.matrices() {
            let got = Shape::matrix_dims(tensor, matrix)?;

            if got != (expected.rows, expected.cols) {
                return Err(ShapeErr::MatrixShape {
                    tensor,
                    expected: (expected.rows, expected.cols),
                    got,
                });
            }
        }

        for (tensor, vector) in self.vectors() {
            if vector.len() != expected.bias_len {
                return Err(ShapeErr::BiasLength {
                    tensor,
                    expected: expected.bias_len,
                    got: vector.len(),
                });
            }
        }

        Ok(())
    }
}

/// One participant's contribution for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorBundle {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(flatten)]
    pub tensors: LstmTensors,
    pub round: Round,
}

impl TensorBundle {
    /// Creates a new `TensorBundle`.
    ///
    /// # Arguments
    /// * `node_id` - The contributing participant.
    /// * `tensors` - The contributed weights and biases.
    /// * `round` - The round of the contribution.
    pub fn new<S: Into<String>>(node_id: S, tensors: LstmTensors, round: Round) -> Self {
        Self {
            node_id: node_id.into(),
            tensors,
            round,
        }
    }

    /// The key this bundle is staged under.
    pub fn key(&self) -> StagingKey {
        StagingKey::new(self.node_id.clone(), self.round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensors(rows: usize, cols: usize, bias_len: usize) -> LstmTensors {
        let m = vec![vec![0.5; cols]; rows];
        let v = vec![0.25; bias_len];
        LstmTensors {
            wi: m.clone(),
            wf: m.clone(),
            wo: m.clone(),
            wc: m,
            bi: v.clone(),
            bf: v.clone(),
            bo: v.clone(),
            bc: v,
        }
    }

    #[test]
    fn test_shape_of_consistent_tensors() {
        let shape = tensors(2, 3, 2).shape().unwrap();
        assert_eq!(
            shape,
            Shape {
                rows: 2,
                cols: 3,
                bias_len: 2
            }
        );
    }

    #[test]
    fn test_shape_rejects_mismatched_gate_matrix() {
        let mut t = tensors(2, 2, 2);
        t.wo = vec![vec![0.0; 3]; 2];

        let err = t.shape().unwrap_err();
        assert_eq!(
            err,
            ShapeErr::MatrixShape {
                tensor: "Wo",
                expected: (2, 2),
                got: (2, 3)
            }
        );
    }

    #[test]
    fn test_shape_rejects_ragged_rows() {
        let mut t = tensors(2, 2, 2);
        t.wc[1].push(1.0);

        let err = t.shape().unwrap_err();
        assert_eq!(
            err,
            ShapeErr::RaggedMatrix {
                tensor: "Wc",
                row: 1,
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_shape_rejects_mismatched_bias() {
        let mut t = tensors(2, 2, 2);
        t.bc.pop();

        let err = t.shape().unwrap_err();
        assert_eq!(
            err,
            ShapeErr::BiasLength {
                tensor: "bc",
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_non_finite_names_the_first_offending_tensor() {
        let mut t = tensors(2, 2, 2);
        assert_eq!(t.non_finite(), None);

        t.bo[1] = f64::NEG_INFINITY;
        assert_eq!(t.non_finite(), Some(("bo", f64::NEG_INFINITY)));

        t.wf[0][1] = f64::INFINITY;
        assert_eq!(t.non_finite(), Some(("Wf", f64::INFINITY)));

        t.wf[0][1] = f64::NAN;
        assert!(matches!(t.non_finite(), Some(("Wf", x)) if x.is_nan()));
    }

    #[test]
    fn test_bundle_json_uses_wire_field_names() {
        let bundle = TensorBundle::new("soft", tensors(1, 1, 1), 3);
        let json = serde_json::to_value(&bundle).unwrap();

        for field in ["nodeId", "Wi", "Wf", "Wo", "Wc", "bi", "bf", "bo", "bc", "round"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }

        let back: TensorBundle = serde_json::from_value(json).unwrap();
        assert_eq!(back, bundle);
    }
}
