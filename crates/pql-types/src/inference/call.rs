//! Typing of function and aggregate calls

use pql_ast::{AggregateCall, CallExpr, Expr, SourceLocation};
use pql_diagnostics::Result;

use super::StaticTypeInferencer;
use super::expr::is_numeric_member;
use crate::semantic::accepts;
use crate::{ArityRange, ProblemDetail, StaticType};

impl StaticTypeInferencer<'_> {
    /// Type a call against its registered signature
    ///
    /// Wrong arity is checked first and skips argument checks. Every other
    /// problem is reported per argument, and the declared return type is the
    /// continuation type.
    pub(super) fn infer_call(
        &mut self,
        call: &CallExpr,
        location: SourceLocation,
    ) -> Result<StaticType> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.infer_expr(arg)?);
        }

        let functions = self.functions;
        let Some(signature) = functions.get(&call.name) else {
            self.report(
                location,
                ProblemDetail::NoSuchFunction {
                    function: call.name.clone(),
                },
            );
            return Ok(StaticType::Any);
        };

        let arity = signature.arity();
        if !arity.contains(args.len()) {
            self.report(
                location,
                ProblemDetail::IncorrectNumberOfArguments {
                    function: call.name.clone(),
                    expected: arity,
                    actual: args.len(),
                },
            );
            return Ok(signature.return_type.clone());
        }

        let mut result = signature.return_type.clone();
        for (index, (arg, ty)) in call.args.iter().zip(&args).enumerate() {
            let Some(param) = signature.param_type(index) else {
                continue;
            };
            if param.is_any() || ty.is_any() {
                continue;
            }
            if ty.is_unknown() {
                self.report(
                    arg.location,
                    ProblemDetail::NullOrMissingFunctionArgument {
                        function: call.name.clone(),
                    },
                );
                continue;
            }

            let known = ty.known_members();
            let accepted = known.iter().filter(|m| accepts(param, m)).count();
            if accepted == 0 {
                self.report(
                    arg.location,
                    ProblemDetail::InvalidArgumentTypeForFunction {
                        function: call.name.clone(),
                        expected: param.clone(),
                        actual: ty.clone(),
                    },
                );
                continue;
            }
            if accepted < known.len() {
                result = result.as_optional();
            }
            if let Some(unknown) = ty.unknown_part() {
                result = result.union(&unknown);
            }
        }
        Ok(result)
    }

    /// Type an aggregate call
    pub(super) fn infer_aggregate(
        &mut self,
        agg: &AggregateCall,
        location: SourceLocation,
    ) -> Result<StaticType> {
        let name = agg.name.to_ascii_lowercase();
        let arg = match &agg.arg {
            Some(arg) => Some(self.infer_aggregate_arg(arg)?),
            None => None,
        };

        let ty = match (name.as_str(), arg) {
            ("count", _) => StaticType::int8(),
            ("sum" | "avg" | "min" | "max", None) => {
                self.report(
                    location,
                    ProblemDetail::IncorrectNumberOfArguments {
                        function: name.clone(),
                        expected: ArityRange { min: 1, max: Some(1) },
                        actual: 0,
                    },
                );
                match name.as_str() {
                    "avg" => StaticType::decimal().as_nullable(),
                    "sum" => StaticType::all_numeric().as_nullable(),
                    _ => StaticType::Any,
                }
            }
            ("sum", Some(ty)) => {
                if !self.check_numeric_argument(&name, &ty, location) {
                    StaticType::all_numeric().as_nullable()
                } else if ty.is_any() {
                    StaticType::Any
                } else {
                    let numeric = ty
                        .known_members()
                        .into_iter()
                        .filter(|m| is_numeric_member(m))
                        .cloned();
                    StaticType::union_of(numeric).as_nullable()
                }
            }
            ("avg", Some(ty)) => {
                self.check_numeric_argument(&name, &ty, location);
                StaticType::decimal().as_nullable()
            }
            ("min" | "max", Some(ty)) => ty.without_unknowns().as_nullable(),
            _ => {
                self.report(
                    location,
                    ProblemDetail::NoSuchFunction {
                        function: agg.name.clone(),
                    },
                );
                StaticType::Any
            }
        };
        Ok(ty)
    }

    fn check_numeric_argument(
        &mut self,
        function: &str,
        ty: &StaticType,
        location: SourceLocation,
    ) -> bool {
        if ty.is_any() {
            return true;
        }
        if ty.is_unknown() {
            self.report(
                location,
                ProblemDetail::NullOrMissingFunctionArgument {
                    function: function.to_string(),
                },
            );
            return false;
        }
        if !ty.known_members().into_iter().any(is_numeric_member) {
            self.report(
                location,
                ProblemDetail::InvalidArgumentTypeForFunction {
                    function: function.to_string(),
                    expected: StaticType::all_numeric(),
                    actual: ty.clone(),
                },
            );
            return false;
        }
        true
    }

    /// Type an aggregate argument in the FROM frame of its query level
    ///
    /// In a grouped query the grouped frame is swapped out for the saved FROM
    /// frame while the argument is typed, wherever the call appears. An
    /// aggregate inside the argument sees the FROM frame directly.
    fn infer_aggregate_arg(&mut self, arg: &Expr) -> Result<StaticType> {
        let from_scope = self
            .levels
            .last_mut()
            .and_then(|level| level.from_scope.take());
        let Some(from_scope) = from_scope else {
            return self.infer_expr(arg);
        };

        let grouped = self.chain.leave();
        self.chain.push(from_scope);
        let result = self.infer_expr(arg);
        let from_scope = self.chain.leave();
        if let Some(grouped) = grouped {
            self.chain.push(grouped);
        }
        if let Some(level) = self.levels.last_mut() {
            level.from_scope = from_scope;
        }
        result
    }
}
