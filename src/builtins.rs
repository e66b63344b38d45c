//! Registers the base function table and command-word table (spec §3.3,
//! §4.1). Grounded in the shape of the teacher crate's builtin registry:
//! one table entry per name, each backed by a plain `fn` implementation,
//! rather than a single giant dispatch `match`.

use crate::array::{ElemKind, MultiArray};
use crate::env::{BaseFunction, Environment, LazyMask};
use crate::error::{EvalError, EvalResult};
use crate::eval::Evaluator;
use crate::numeric::Complex;
use crate::value::{ClassTag, Value};

pub fn register_all(env: &mut Environment) {
    register_mapper(env, "sin", native_sin);
    register_mapper(env, "cos", native_cos);
    register_mapper(env, "tan", native_tan);
    register_mapper(env, "sinh", native_sinh);
    register_mapper(env, "cosh", native_cosh);
    register_mapper(env, "tanh", native_tanh);
    register_mapper(env, "asin", native_asin);
    register_mapper(env, "acos", native_acos);
    register_mapper(env, "atan", native_atan);
    register_mapper(env, "asinh", native_asinh);
    register_mapper(env, "acosh", native_acosh);
    register_mapper(env, "atanh", native_atanh);
    register_mapper(env, "exp", native_exp);
    register_mapper(env, "log", native_log);
    register_mapper(env, "log10", native_log10);
    register_mapper(env, "sqrt", native_sqrt);
    register_mapper(env, "abs", native_abs);
    register_mapper(env, "arg", native_arg);
    register_mapper(env, "conj", native_conj);
    register_mapper(env, "real", native_real);
    register_mapper(env, "imag", native_imag);
    register_mapper(env, "floor", native_floor);
    register_mapper(env, "ceil", native_ceil);
    register_mapper(env, "round", native_round);
    register_mapper(env, "fix", native_fix);
    register_mapper(env, "sign", native_sign);
    register_mapper(env, "gamma", native_gamma);
    register_mapper(env, "factorial", native_factorial);
    set_mathml_override(env, "sqrt", |a| format!("<msqrt>{}</msqrt>", a[0]));
    set_mathml_override(env, "abs", |a| format!("<mrow><mo>|</mo>{}<mo>|</mo></mrow>", a[0]));
    set_mathml_override(env, "log", |a| format!("<mrow><mi>ln</mi><mo>(</mo>{}<mo>)</mo></mrow>", a[0]));
    set_mathml_override(env, "log10", |a| format!("<mrow><msub><mi>log</mi><mn>10</mn></msub><mo>(</mo>{}<mo>)</mo></mrow>", a[0]));
    set_mathml_override(env, "gamma", |a| format!("<mrow><mi>&#x393;</mi><mo>(</mo>{}<mo>)</mo></mrow>", a[0]));
    set_mathml_override(env, "factorial", |a| format!("<mrow>{}<mo>!</mo></mrow>", a[0]));
    env.register_function(BaseFunction {
        name: "mod".to_string(),
        mapper: true,
        lazy_mask: LazyMask::none(2),
        implementation: native_mod,
        mathml_override: None,
    });

    register_plain(env, "size", native_size);
    register_plain(env, "numel", native_numel);
    register_plain(env, "length", native_length);
    register_plain(env, "find", native_find);
    register_plain(env, "zeros", native_zeros);
    register_plain(env, "ones", native_ones);
    register_plain(env, "isreal", native_isreal);
    register_plain(env, "sum", native_sum);
    register_plain(env, "prod", native_prod);

    env.register_cmd_word("restart", native_restart);
}

fn register_mapper(env: &mut Environment, name: &str, implementation: crate::env::NativeFn) {
    env.register_function(BaseFunction {
        name: name.to_string(),
        mapper: true,
        lazy_mask: LazyMask::none(1),
        implementation,
        mathml_override: None,
    });
}

fn register_plain(env: &mut Environment, name: &str, implementation: crate::env::NativeFn) {
    env.register_function(BaseFunction {
        name: name.to_string(),
        mapper: false,
        lazy_mask: LazyMask::none(1),
        implementation,
        mathml_override: None,
    });
}

/// Registers a decorative MathML rendering for an already-registered
/// function (spec §4.6): absolute value bars, square root, subscript-base
/// logarithm, capital gamma, trailing-`!` factorial.
fn set_mathml_override(env: &mut Environment, name: &str, render: fn(&[String]) -> String) {
    env.functions.get_mut(name).expect("override registered after its function").mathml_override = Some(render);
}

fn expect_scalar(v: &Value) -> EvalResult<Complex> {
    match v {
        Value::Scalar(c, _) => Ok(c.clone()),
        _ => Err(EvalError::evaluation("expected a scalar argument")),
    }
}

/// Lifts a one-argument scalar math function into the `NativeFn` shape.
/// `call_mapper` is responsible for array lifting before this ever runs,
/// so by the time we get here `args[0]` is always a bare scalar.
macro_rules! unary_native {
    ($fname:ident, $method:ident) => {
        fn $fname(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
            let c = expect_scalar(&args[0])?;
            let ctx = ev.env.numeric;
            Ok(vec![Value::scalar(c.$method(&ctx))])
        }
    };
}

unary_native!(native_sin, sin);
unary_native!(native_cos, cos);
unary_native!(native_tan, tan);
unary_native!(native_sinh, sinh);
unary_native!(native_cosh, cosh);
unary_native!(native_tanh, tanh);
unary_native!(native_asin, asin);
unary_native!(native_acos, acos);
unary_native!(native_atan, atan);
unary_native!(native_asinh, asinh);
unary_native!(native_acosh, acosh);
unary_native!(native_atanh, atanh);
unary_native!(native_exp, exp);
unary_native!(native_log, ln);
unary_native!(native_log10, log10);
unary_native!(native_sqrt, sqrt);
unary_native!(native_gamma, gamma);

fn native_abs(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    let ctx = ev.env.numeric;
    Ok(vec![Value::scalar(Complex::real(c.abs(&ctx)))])
}

fn native_arg(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    let ctx = ev.env.numeric;
    Ok(vec![Value::scalar(Complex::real(c.arg(&ctx)))])
}

fn native_conj(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    Ok(vec![Value::scalar(c.conj())])
}

fn native_real(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    Ok(vec![Value::scalar(Complex::real(c.re))])
}

fn native_imag(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    Ok(vec![Value::scalar(Complex::real(c.im))])
}

fn native_floor(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::scalar(expect_scalar(&args[0])?.floor())])
}

fn native_ceil(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::scalar(expect_scalar(&args[0])?.ceil())])
}

fn native_round(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::scalar(expect_scalar(&args[0])?.round())])
}

fn native_fix(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::scalar(expect_scalar(&args[0])?.fix())])
}

fn native_sign(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    let ctx = ev.env.numeric;
    Ok(vec![Value::scalar(c.sign(&ctx))])
}

fn native_factorial(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let c = expect_scalar(&args[0])?;
    let ctx = ev.env.numeric;
    let result = c.factorial(&ctx).ok_or_else(|| EvalError::arithmetic("factorial is only defined for non-negative integers"))?;
    Ok(vec![Value::scalar(result)])
}

fn native_mod(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let (a, b) = (expect_scalar(&args[0])?, expect_scalar(&args[1])?);
    let ctx = ev.env.numeric;
    let q = a.re.div(&b.re, &ctx).floor();
    let result = a.re.sub(&q.mul(&b.re, &ctx), &ctx);
    Ok(vec![Value::scalar(Complex::real(result))])
}

fn native_size(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let dims = match &args[0] {
        Value::MultiArray(a) => a.dims.clone(),
        _ => vec![1, 1],
    };
    Ok(dims.into_iter().map(|d| Value::from_i64(d as i64)).collect())
}

fn native_numel(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let n = match &args[0] {
        Value::MultiArray(a) => a.linear_length(),
        _ => 1,
    };
    Ok(vec![Value::from_i64(n as i64)])
}

fn native_length(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let n = match &args[0] {
        Value::MultiArray(a) => a.dims.iter().copied().max().unwrap_or(0),
        Value::CharString(s) => s.len(),
        _ => 1,
    };
    Ok(vec![Value::from_i64(n as i64)])
}

fn native_find(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let ctx = ev.env.numeric;
    let a = match &args[0] {
        Value::MultiArray(a) => a.clone(),
        other => MultiArray::scalar(other.clone()),
    };
    let positions = a.find_nonzero(&a, &ctx)?;
    let n = positions.len();
    let values = positions.into_iter().map(|p| Value::from_i64(p as i64)).collect();
    Ok(vec![Value::MultiArray(MultiArray::new(vec![n, 1], ElemKind::Numeric(ClassTag::Decimal), false, values))])
}

fn native_zeros(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    build_filled(args, Value::from_i64(0))
}

fn native_ones(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    build_filled(args, Value::from_i64(1))
}

fn build_filled(args: &[Value], fill: Value) -> EvalResult<Vec<Value>> {
    let dims: Vec<usize> = if args.is_empty() {
        vec![1, 1]
    } else if args.len() == 1 {
        let n = dim_arg(&args[0])?;
        vec![n, n]
    } else {
        args.iter().map(dim_arg).collect::<EvalResult<Vec<_>>>()?
    };
    let total: usize = dims.iter().product();
    let data = vec![fill; total];
    Ok(vec![Value::MultiArray(MultiArray::new(dims, ElemKind::Numeric(ClassTag::Decimal), false, data))])
}

fn dim_arg(v: &Value) -> EvalResult<usize> {
    let c = expect_scalar(v)?;
    let n = c.re.to_f64();
    if n < 0.0 || n.fract() != 0.0 {
        return Err(EvalError::evaluation("dimension argument must be a non-negative integer"));
    }
    Ok(n as usize)
}

/// `sum`/`prod` over every element in linear order (spec §8 universal
/// property 4 names `prod(1:n)` directly; a bare scalar reduces to itself).
fn native_sum(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let ctx = ev.env.numeric;
    let result = match &args[0] {
        Value::MultiArray(a) => a.data.iter().try_fold(Complex::zero(), |acc, v| Ok::<_, EvalError>(acc.add(&expect_scalar(v)?, &ctx)))?,
        other => expect_scalar(other)?,
    };
    Ok(vec![Value::scalar(result)])
}

fn native_prod(ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let ctx = ev.env.numeric;
    let result = match &args[0] {
        Value::MultiArray(a) => a.data.iter().try_fold(Complex::from_i64(1), |acc, v| Ok::<_, EvalError>(acc.mul(&expect_scalar(v)?, &ctx)))?,
        other => expect_scalar(other)?,
    };
    Ok(vec![Value::scalar(result)])
}

fn native_isreal(_ev: &mut Evaluator, args: &[Value]) -> EvalResult<Vec<Value>> {
    let is_real = match &args[0] {
        Value::Scalar(c, _) => c.is_real(),
        Value::MultiArray(a) => a.data.iter().all(|v| matches!(v, Value::Scalar(c, _) if c.is_real())),
        _ => false,
    };
    Ok(vec![Value::logical(is_real)])
}

fn native_restart(ev: &mut Evaluator, _args: &[Value]) -> EvalResult<Vec<Value>> {
    tracing::info!("restart: resetting entire environment");
    ev.env.clear_all();
    Ok(vec![])
}
