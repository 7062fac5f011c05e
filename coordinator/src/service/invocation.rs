use log::debug;
use serde::de::DeserializeOwned;

use super::Coordinator;
use crate::{
    error::{CoordinatorErr, Result},
    events::EventSink,
    storage::{LstmTensors, Round, TensorBundle},
};

/// A decoded call to one of the coordinator's entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    UploadParameter(TensorBundle),
    StartAggregation(Round),
    CheckWorking,
    GetAggregatedResult(Round),
}

impl Invocation {
    /// Decodes an invocation from its function name and text arguments.
    ///
    /// Tensors are JSON arrays, rounds are decimal integers.
    ///
    /// # Arguments
    /// * `function` - The name of the entry point.
    /// * `args` - The arguments, in declaration order.
    ///
    /// # Returns
    /// The decoded invocation, `UnknownFunction` or `InvalidArgument`.
    pub fn parse(function: &str, args: &[String]) -> Result<Self> {
        match function {
            "UploadParameter" => {
                let [node, wi, wf, wo, wc, bi, bf, bo, bc, round] =
                    arity::<10>(function, args)?;

                let tensors = LstmTensors {
                    wi: json("Wi", wi)?,
                    wf: json("Wf", wf)?,
                    wo: json("Wo", wo)?,
                    wc: json("Wc", wc)?,
                    bi: json("bi", bi)?,
                    bf: json("bf", bf)?,
                    bo: json("bo", bo)?,
                    bc: json("bc", bc)?,
                };

                Ok(Self::UploadParameter(TensorBundle::new(
                    node.as_str(),
                    tensors,
                    parse_round(round)?,
                )))
            }
            "StartAggregation" => {
                let [round] = arity::<1>(function, args)?;
                Ok(Self::StartAggregation(parse_round(round)?))
            }
            "CheckWorking" => {
                let [] = arity::<0>(function, args)?;
                Ok(Self::CheckWorking)
            }
            "GetAggregatedResult" => {
                let [round] = arity::<1>(function, args)?;
                Ok(Self::GetAggregatedResult(parse_round(round)?))
            }
            other => Err(CoordinatorErr::UnknownFunction(other.to_string())),
        }
    }
}

impl<E: EventSink> Coordinator<E> {
    /// Decodes and runs an invocation.
    ///
    /// # Arguments
    /// * `function` - The name of the entry point.
    /// * `args` - Its text arguments.
    ///
    /// # Returns
    /// The text reply, empty for `UploadParameter`.
    pub async fn invoke(&self, function: &str, args: &[String]) -> Result<String> {
        debug!("invoking {function} with {} argument(s)", args.len());

        match Invocation::parse(function, args)? {
            Invocation::UploadParameter(bundle) => {
                self.upload_parameter(bundle)?;
                Ok(String::new())
            }
            Invocation::StartAggregation(round) => self.start_aggregation(round).await,
            Invocation::CheckWorking => Ok(self.check_working().to_string()),
            Invocation::GetAggregatedResult(round) => self.aggregated_result(round),
        }
    }
}

/// Borrows `args` as an array of exactly `N` arguments.
fn arity<'a, const N: usize>(function: &str, args: &'a [String]) -> Result<&'a [String; N]> {
    args.try_into().map_err(|_| CoordinatorErr::InvalidArgument {
        name: "args",
        reason: format!("{function} takes {N} argument(s), got {}", args.len()),
    })
}

fn json<T: DeserializeOwned>(name: &'static str, arg: &str) -> Result<T> {
    serde_json::from_str(arg).map_err(|e| CoordinatorErr::InvalidArgument {
        name,
        reason: e.to_string(),
    })
}

fn parse_round(arg: &str) -> Result<Round> {
    let invalid = |reason: String| CoordinatorErr::InvalidArgument {
        name: "round",
        reason,
    };

    let round: i64 = arg
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{arg:?} is not an integer")))?;

    if round < 0 {
        return Err(invalid(format!("{round} is negative")));
    }

    Round::try_from(round).map_err(|_| invalid(format!("{round} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn upload_args(round: &str) -> Vec<String> {
        args(&[
            "web",
            "[[1.0,2.0]]",
            "[[1.0,2.0]]",
            "[[1.0,2.0]]",
            "[[1.0,2.0]]",
            "[0.5]",
            "[0.5]",
            "[0.5]",
            "[0.5]",
            round,
        ])
    }

    #[test]
    fn test_parse_upload() {
        let Invocation::UploadParameter(bundle) =
            Invocation::parse("UploadParameter", &upload_args("3")).unwrap()
        else {
            panic!("expected an upload");
        };

        assert_eq!(bundle.node_id, "web");
        assert_eq!(bundle.round, 3);
        assert_eq!(bundle.tensors.wc, vec![vec![1.0, 2.0]]);
        assert_eq!(bundle.tensors.bo, vec![0.5]);
    }

    #[test]
    fn test_parse_round_invocations() {
        assert_eq!(
            Invocation::parse("StartAggregation", &args(&["12"])).unwrap(),
            Invocation::StartAggregation(12)
        );
        assert_eq!(
            Invocation::parse("GetAggregatedResult", &args(&["0"])).unwrap(),
            Invocation::GetAggregatedResult(0)
        );
        assert_eq!(
            Invocation::parse("CheckWorking", &[]).unwrap(),
            Invocation::CheckWorking
        );
    }

    #[test]
    fn test_negative_or_garbage_round_is_refused() {
        for round in ["-1", "one", "", "4294967296"] {
            let err = Invocation::parse("StartAggregation", &args(&[round])).unwrap_err();
            assert!(
                matches!(err, CoordinatorErr::InvalidArgument { name: "round", .. }),
                "{round:?} was accepted"
            );
        }
    }

    #[test]
    fn test_wrong_arity_is_refused() {
        let err = Invocation::parse("StartAggregation", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument args: StartAggregation takes 1 argument(s), got 0"
        );

        let err = Invocation::parse("CheckWorking", &args(&["x"])).unwrap_err();
        assert!(matches!(err, CoordinatorErr::InvalidArgument { .. }));
    }

    #[test]
    fn test_malformed_tensor_names_the_argument() {
        let mut args = upload_args("1");
        args[6] = "[0.5".into();

        let err = Invocation::parse("UploadParameter", &args).unwrap_err();
        assert!(matches!(err, CoordinatorErr::InvalidArgument { name: "bf", .. }));
    }

    #[test]
    fn test_unknown_function() {
        let err = Invocation::parse("DeleteEverything", &[]).unwrap_err();
        assert_eq!(err.to_string(), "unknown function DeleteEverything");
    }
}
