use itertools::Itertools;
use ndarray::{Array2, Zip};
use std::collections::HashMap;

use crate::expression::{
    parser::{parse, Expr},
    vocabulary::{Builtin, Vocabulary, ALGEBRA},
    Evaluate, ExpressionError,
};

type Result<T> = std::result::Result<T, ExpressionError>;

/// Named arrays an expression is evaluated against.
pub type Context = HashMap<String, Array2<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(Array2<f64>),
    List(Vec<Value>),
    /// Builtin with leading arguments already bound.
    Function(Builtin, Vec<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Function(..) => "function",
        }
    }

    fn shape(&self) -> Option<(usize, usize)> {
        match self {
            Value::Array(array) => Some(array.dim()),
            _ => None,
        }
    }

    fn numeric(self, function: Builtin) -> Result<Value> {
        match self {
            Value::Scalar(_) | Value::Array(_) => Ok(self),
            other => Err(type_error(function, "scalar or array", &other)),
        }
    }

    fn scalar(&self, function: Builtin) -> Result<f64> {
        match self {
            Value::Scalar(value) => Ok(*value),
            other => Err(type_error(function, "scalar", other)),
        }
    }

    fn map(self, function: Builtin, f: impl Fn(f64) -> f64) -> Result<Value> {
        match self {
            Value::Scalar(value) => Ok(Value::Scalar(f(value))),
            Value::Array(array) => Ok(Value::Array(array.mapv_into(f))),
            other => Err(type_error(function, "scalar or array", &other)),
        }
    }
}

fn type_error(function: Builtin, expected: &'static str, found: &Value) -> ExpressionError {
    ExpressionError::Type {
        function: function.to_string(),
        expected,
        found: found.kind(),
    }
}

fn truth(value: f64) -> f64 {
    if value != 0. && !value.is_nan() {
        1.
    } else {
        0.
    }
}

fn from_bool(value: bool) -> f64 {
    if value {
        1.
    } else {
        0.
    }
}

/// Elementwise `f` with scalars broadcast over arrays.
fn zip_with(function: Builtin, lhs: Value, rhs: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Scalar(lhs), Value::Scalar(rhs)) => Ok(Value::Scalar(f(lhs, rhs))),
        (Value::Array(lhs), Value::Scalar(rhs)) => Ok(Value::Array(lhs.mapv_into(|x| f(x, rhs)))),
        (Value::Scalar(lhs), Value::Array(rhs)) => Ok(Value::Array(rhs.mapv_into(|y| f(lhs, y)))),
        (Value::Array(lhs), Value::Array(rhs)) => {
            if lhs.dim() != rhs.dim() {
                return Err(ExpressionError::ShapeMismatch {
                    lhs: lhs.dim(),
                    rhs: rhs.dim(),
                });
            }
            Ok(Value::Array(
                Zip::from(&lhs).and(&rhs).map_collect(|&x, &y| f(x, y)),
            ))
        }
        (Value::Scalar(_) | Value::Array(_), other) | (other, _) => {
            Err(type_error(function, "scalar or array", &other))
        }
    }
}

/// Left fold of a binary operation over every argument, lists flattened.
fn fold(function: Builtin, args: Vec<Value>, f: impl Fn(f64, f64) -> f64 + Copy) -> Result<Value> {
    let mut args = flatten(args).into_iter();
    let first = args
        .next()
        .ok_or_else(|| ExpressionError::Arity {
            function: function.to_string(),
            found: 0,
        })?
        .numeric(function)?;
    args.try_fold(first, |acc, value| zip_with(function, acc, value, f))
}

fn flatten(args: Vec<Value>) -> Vec<Value> {
    args.into_iter()
        .flat_map(|value| match value {
            Value::List(items) => flatten(items),
            value => vec![value],
        })
        .collect()
}

fn scalars(function: Builtin, value: &Value) -> Result<Vec<f64>> {
    match value {
        Value::List(items) => items.iter().map(|item| item.scalar(function)).collect(),
        Value::Array(array) => Ok(array.iter().copied().collect()),
        other => Err(type_error(function, "list of scalars", other)),
    }
}

/// Piecewise linear interpolation clamped to the end points.
fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let upper = xp.partition_point(|edge| *edge <= x).clamp(1, last);
    let lower = upper - 1;
    let span = xp[upper] - xp[lower];
    if span == 0. {
        return fp[upper];
    }
    fp[lower] + (x - xp[lower]) * (fp[upper] - fp[lower]) / span
}

/// Array algebra over named bands.
///
/// Supports arithmetic and comparison operators, `where`, `interp`,
/// elementwise math functions and the higher order `map` and `partial`.
#[derive(Debug, Clone, Copy)]
pub struct Algebra {
    vocabulary: Vocabulary,
}

impl Default for Algebra {
    fn default() -> Self {
        Self {
            vocabulary: ALGEBRA,
        }
    }
}

impl Evaluate for Algebra {
    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn evaluate(&self, expression: &str, context: &Context) -> Result<Array2<f64>> {
        let expr = parse(expression, &self.vocabulary)?;
        match self.eval(&expr, context)? {
            Value::Array(array) => Ok(array),
            // Constant expressions fill the shape of the bound arrays.
            Value::Scalar(value) => context
                .values()
                .next()
                .map(|array| Array2::from_elem(array.dim(), value))
                .ok_or(ExpressionError::NotAnArray("scalar")),
            other => Err(ExpressionError::NotAnArray(other.kind())),
        }
    }
}

impl Algebra {
    pub fn eval(&self, expr: &Expr, context: &Context) -> Result<Value> {
        match expr {
            Expr::Number(value) => Ok(Value::Scalar(*value)),
            Expr::Variable(name) => context
                .get(name)
                .map(|array| Value::Array(array.clone()))
                .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone())),
            Expr::Function(builtin) => Ok(Value::Function(*builtin, Vec::new())),
            Expr::Call(builtin, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, context))
                    .collect::<Result<Vec<_>>>()?;
                self.apply(*builtin, args)
            }
        }
    }

    fn call(&self, function: Value, args: Vec<Value>) -> Result<Value> {
        match function {
            Value::Function(builtin, mut bound) => {
                bound.extend(args);
                if !builtin.arity().accepts(bound.len()) {
                    return Err(ExpressionError::Arity {
                        function: builtin.to_string(),
                        found: bound.len(),
                    });
                }
                self.apply(builtin, bound)
            }
            other => Err(ExpressionError::Type {
                function: "call".into(),
                expected: "function",
                found: other.kind(),
            }),
        }
    }

    fn apply(&self, builtin: Builtin, args: Vec<Value>) -> Result<Value> {
        use Builtin::*;
        let mut args = args;
        match builtin {
            Add => fold(builtin, args, |x, y| x + y),
            Sub if args.len() == 1 => args.remove(0).map(builtin, |x| -x),
            Sub => fold(builtin, args, |x, y| x - y),
            Mul => fold(builtin, args, |x, y| x * y),
            Div => fold(builtin, args, |x, y| x / y),
            // Floored remainder, the sign follows the divisor.
            Rem => fold(builtin, args, |x, y| x - y * (x / y).floor()),
            Pow => fold(builtin, args, f64::powf),
            Eq => fold(builtin, args, |x, y| from_bool(x == y)),
            Ne => fold(builtin, args, |x, y| from_bool(x != y)),
            Lt => fold(builtin, args, |x, y| from_bool(x < y)),
            Le => fold(builtin, args, |x, y| from_bool(x <= y)),
            Gt => fold(builtin, args, |x, y| from_bool(x > y)),
            Ge => fold(builtin, args, |x, y| from_bool(x >= y)),
            And => fold(builtin, args, |x, y| truth(x) * truth(y)),
            Or => fold(builtin, args, |x, y| truth(truth(x) + truth(y))),
            Where => self.select(args),
            Interp => self.interp(args),
            Abs => args.remove(0).map(builtin, f64::abs),
            Sqrt => args.remove(0).map(builtin, f64::sqrt),
            Exp => args.remove(0).map(builtin, f64::exp),
            Log => args.remove(0).map(builtin, f64::ln),
            Log10 => args.remove(0).map(builtin, f64::log10),
            Sin => args.remove(0).map(builtin, f64::sin),
            Cos => args.remove(0).map(builtin, f64::cos),
            Tan => args.remove(0).map(builtin, f64::tan),
            Floor => args.remove(0).map(builtin, f64::floor),
            Ceil => args.remove(0).map(builtin, f64::ceil),
            Min => fold(builtin, args, f64::min),
            Max => fold(builtin, args, f64::max),
            Mean => {
                let count = flatten(args.clone()).len() as f64;
                fold(builtin, args, |x, y| x + y)?.map(builtin, |sum| sum / count)
            }
            AsArray => Ok(Value::List(args)),
            Partial => {
                let function = args.remove(0);
                match function {
                    Value::Function(inner, mut bound) => {
                        bound.extend(args);
                        Ok(Value::Function(inner, bound))
                    }
                    other => Err(type_error(builtin, "function", &other)),
                }
            }
            Map => {
                let function = args.remove(0);
                self.map(function, args)
            }
        }
    }

    /// `where cond a b`: `a` where `cond` is true, `b` elsewhere.
    fn select(&self, args: Vec<Value>) -> Result<Value> {
        let args = args
            .into_iter()
            .map(|value| value.numeric(Builtin::Where))
            .collect::<Result<Vec<_>>>()?;
        let shapes: Vec<(usize, usize)> = args.iter().filter_map(Value::shape).unique().collect();
        let pick = |cond: f64, a: f64, b: f64| if truth(cond) == 1. { a } else { b };
        match shapes.as_slice() {
            [] => {
                let [cond, a, b] = [0, 1, 2].map(|idx| args[idx].scalar(Builtin::Where));
                Ok(Value::Scalar(pick(cond?, a?, b?)))
            }
            [shape] => {
                let at = |value: &Value, idx: (usize, usize)| match value {
                    Value::Array(array) => array[idx],
                    Value::Scalar(scalar) => *scalar,
                    _ => f64::NAN,
                };
                Ok(Value::Array(Array2::from_shape_fn(*shape, |idx| {
                    pick(at(&args[0], idx), at(&args[1], idx), at(&args[2], idx))
                })))
            }
            [lhs, rhs, ..] => Err(ExpressionError::ShapeMismatch {
                lhs: *lhs,
                rhs: *rhs,
            }),
        }
    }

    /// `interp x xp fp`, with `xp` increasing.
    fn interp(&self, mut args: Vec<Value>) -> Result<Value> {
        let fp = scalars(Builtin::Interp, &args.remove(2))?;
        let xp = scalars(Builtin::Interp, &args.remove(1))?;
        if xp.iter().any(|edge| edge.is_nan()) {
            return Err(ExpressionError::Type {
                function: Builtin::Interp.to_string(),
                expected: "xp without nan",
                found: "nan",
            });
        }
        if xp.is_empty() || xp.len() != fp.len() {
            return Err(ExpressionError::Type {
                function: Builtin::Interp.to_string(),
                expected: "xp and fp of equal, non zero length",
                found: "list",
            });
        }
        args.remove(0)
            .map(Builtin::Interp, |x| interpolate(x, &xp, &fp))
    }

    /// Apply `function` to every item, zipping when given several lists.
    fn map(&self, function: Value, args: Vec<Value>) -> Result<Value> {
        let all_lists = args.iter().all(|arg| matches!(arg, Value::List(_)));
        let rows: Vec<Vec<Value>> = if all_lists {
            let lists: Vec<Vec<Value>> = args
                .into_iter()
                .map(|arg| match arg {
                    Value::List(items) => items,
                    other => vec![other],
                })
                .collect();
            let len = lists.iter().map(Vec::len).min().unwrap_or(0);
            (0..len)
                .map(|idx| lists.iter().map(|list| list[idx].clone()).collect())
                .collect()
        } else {
            args.into_iter().map(|arg| vec![arg]).collect()
        };
        rows.into_iter()
            .map(|row| self.call(function.clone(), row))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::{fixture, rstest};

    #[fixture]
    fn context() -> Context {
        Context::from([
            ("red".to_string(), array![[1., 2.], [3., 4.]]),
            ("nir".to_string(), array![[3., 2.], [5., 12.]]),
        ])
    }

    fn eval(text: &str, context: &Context) -> Result<Array2<f64>> {
        Algebra::default().evaluate(text, context)
    }

    #[rstest]
    fn sum_is_elementwise(context: Context) {
        assert_eq!(
            eval("red + nir", &context).unwrap(),
            &context["red"] + &context["nir"]
        );
    }

    #[rstest]
    #[case("(nir - red) / (nir + red)")]
    #[case("(/ (- nir red) (+ nir red))")]
    fn normalized_difference(context: Context, #[case] text: &str) {
        assert_eq!(
            eval(text, &context).unwrap(),
            array![[0.5, 0.], [0.25, 0.5]]
        );
    }

    #[rstest]
    fn scalars_broadcast(context: Context) {
        assert_eq!(
            eval("(* 2 red -1)", &context).unwrap(),
            array![[-2., -4.], [-6., -8.]]
        );
    }

    #[rstest]
    fn conditional(context: Context) {
        assert_eq!(
            eval("(where (> nir 2.5) nir 0)", &context).unwrap(),
            array![[3., 0.], [5., 12.]]
        );
    }

    #[rstest]
    fn logical_operators(context: Context) {
        assert_eq!(
            eval("(red > 1) & (nir < 10) | (red == 1)", &context).unwrap(),
            array![[1., 1.], [1., 0.]]
        );
    }

    #[rstest]
    fn interpolation_clamps(context: Context) {
        assert_eq!(
            eval("(interp red (asarray 1.5 3.5) (asarray 0 100))", &context).unwrap(),
            array![[0., 25.], [75., 100.]]
        );
    }

    #[rstest]
    fn higher_order_functions(context: Context) {
        assert_eq!(
            eval("(mean (map sqrt red nir))", &context).unwrap(),
            (context["red"].mapv(f64::sqrt) + context["nir"].mapv(f64::sqrt)) / 2.
        );
        assert_eq!(
            eval("(+ (map (partial * 10) red nir))", &context).unwrap(),
            (&context["red"] + &context["nir"]) * 10.
        );
    }

    #[rstest]
    fn constant_expression_fills_block(context: Context) {
        assert_eq!(eval("(+ 1 2)", &context).unwrap(), Array2::from_elem((2, 2), 3.));
        assert_eq!(
            eval("(+ 1 2)", &Context::new()),
            Err(ExpressionError::NotAnArray("scalar"))
        );
    }

    #[rstest]
    fn division_by_zero_is_not_an_error() {
        let context = Context::from([("a".to_string(), array![[0., 1.]])]);
        let result = eval("a / 0", &context).unwrap();
        assert!(result[[0, 0]].is_nan());
        assert_eq!(result[[0, 1]], f64::INFINITY);
    }

    #[rstest]
    fn unknown_identifier(context: Context) {
        assert_eq!(
            eval("red + swir", &context),
            Err(ExpressionError::UnknownIdentifier("swir".into()))
        );
    }

    #[rstest]
    fn shape_mismatch(mut context: Context) {
        context.insert("blue".into(), Array2::zeros((3, 3)));
        assert_eq!(
            eval("red + blue", &context),
            Err(ExpressionError::ShapeMismatch {
                lhs: (2, 2),
                rhs: (3, 3)
            })
        );
    }

    #[rstest]
    fn list_result_is_rejected(context: Context) {
        assert_eq!(
            eval("(asarray red nir)", &context),
            Err(ExpressionError::NotAnArray("list"))
        );
    }

    #[rstest]
    #[case(0.5, 0.)]
    #[case(1., 0.)]
    #[case(1.5, 5.)]
    #[case(2., 10.)]
    #[case(3., 20.)]
    #[case(9., 20.)]
    fn piecewise_interpolation(#[case] x: f64, #[case] expected: f64) {
        assert_eq!(interpolate(x, &[1., 2., 3.], &[0., 10., 20.]), expected);
    }

    #[rstest]
    #[case("(interp red (asarray nan 1) (asarray 0 1))")]
    #[case("(interp red (asarray 0 nan 4) (asarray 0 1 2))")]
    fn nan_breakpoint_is_an_error(context: Context, #[case] text: &str) {
        assert!(matches!(
            eval(text, &context),
            Err(ExpressionError::Type { ref function, .. }) if function == "interp"
        ));
    }

    #[rstest]
    fn unsorted_breakpoints_do_not_panic() {
        let value = interpolate(1.5, &[0., 2., 1.], &[0., 10., 20.]);
        assert!(value.is_finite());
    }

    #[rstest]
    #[case("a % 2", -7., 1.)]
    #[case("a % -2", -7., -1.)]
    #[case("a % -2", 7., -1.)]
    #[case("(% a 3)", 7.5, 1.5)]
    fn remainder_takes_sign_of_divisor(#[case] text: &str, #[case] a: f64, #[case] expected: f64) {
        let context = Context::from([("a".to_string(), Array2::from_elem((1, 1), a))]);
        assert_eq!(eval(text, &context).unwrap()[[0, 0]], expected);
    }
}
