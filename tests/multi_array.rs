//! Exercises `MultiArray` directly (spec §4.3): construction, the three
//! indexing modes, and mapper-lifting helpers.

use mlab_eval::{ClassTag, ElemKind, MultiArray, Value};

fn scalar(n: i64) -> Value {
    Value::from_i64(n)
}

fn row(values: &[i64]) -> MultiArray {
    MultiArray::from_row_vector(values.iter().map(|&n| scalar(n)).collect())
}

fn as_i64(v: &Value) -> i64 {
    match v {
        Value::Scalar(c, _) => c.re.to_f64().round() as i64,
        other => panic!("expected a scalar, got {other:?}"),
    }
}

#[test]
fn from_rows_rejects_mismatched_widths() {
    let rows = vec![vec![scalar(1), scalar(2)], vec![scalar(3)]];
    assert!(MultiArray::from_rows(rows, false).is_err());
}

#[test]
fn get_dimension_past_rank_is_one() {
    let a = row(&[1, 2, 3]);
    assert_eq!(a.get_dimension(0), 1);
    assert_eq!(a.get_dimension(1), 3);
    assert_eq!(a.get_dimension(5), 1);
}

#[test]
fn linear_indexing_walks_column_major_order() {
    // [1 2; 3 4] stored row-major is [1,2,3,4]; column-major linear order
    // must read 1,3,2,4.
    let a = MultiArray::from_rows(vec![vec![scalar(1), scalar(2)], vec![scalar(3), scalar(4)]], false).unwrap();
    let got: Vec<i64> = (1..=4).map(|i| as_i64(a.get_linear(i).unwrap())).collect();
    assert_eq!(got, vec![1, 3, 2, 4]);
}

#[test]
fn out_of_bounds_linear_read_is_an_error() {
    let a = row(&[1, 2, 3]);
    assert!(a.get_linear(0).is_err());
    assert!(a.get_linear(4).is_err());
}

#[test]
fn set_linear_extends_a_row_vector() {
    let mut a = row(&[1, 2, 3]);
    a.set_linear(5, scalar(9)).unwrap();
    assert_eq!(a.linear_length(), 5);
    assert_eq!(as_i64(a.get_linear(5).unwrap()), 9);
    // the gap at position 4 is filled with the default numeric zero
    assert_eq!(as_i64(a.get_linear(4).unwrap()), 0);
}

#[test]
fn set_linear_refuses_to_grow_a_genuine_matrix() {
    let mut a = MultiArray::from_rows(vec![vec![scalar(1), scalar(2)], vec![scalar(3), scalar(4)]], false).unwrap();
    assert!(a.set_linear(10, scalar(1)).is_err());
}

#[test]
fn subscripted_write_grows_every_dimension_to_fit() {
    let mut a = MultiArray::from_rows(vec![vec![scalar(1), scalar(2)]], false).unwrap();
    a.set_subscripted(&[vec![3], vec![3]], &[scalar(7)]).unwrap();
    assert_eq!(a.dims, vec![3, 3]);
    assert_eq!(as_i64(a.get_linear(1).unwrap()), 1);
}

#[test]
fn elementwise_broadcasts_a_scalar_operand() {
    let a = row(&[1, 2, 3]);
    let one = MultiArray::scalar(scalar(10));
    let out = a.elementwise(&one, |x, y| Ok(scalar(as_i64(x) + as_i64(y)))).unwrap();
    let vals: Vec<i64> = out.data.iter().map(as_i64).collect();
    assert_eq!(vals, vec![11, 12, 13]);
}

#[test]
fn elementwise_rejects_mismatched_shapes() {
    let a = row(&[1, 2, 3]);
    let b = row(&[1, 2]);
    assert!(a.elementwise(&b, |x, _| Ok(x.clone())).is_err());
}

#[test]
fn map_elements_preserves_shape_and_kind() {
    let a = row(&[1, 2, 3]);
    let out = a.map_elements(|v| Ok(scalar(as_i64(v) * 2))).unwrap();
    assert_eq!(out.dims, vec![1, 3]);
    assert_eq!(out.elem_kind, ElemKind::Numeric(ClassTag::Decimal));
}

#[test]
fn find_nonzero_reports_one_based_column_major_positions() {
    let a = row(&[0, 5, 0, 7]);
    let mask = row(&[0, 5, 0, 7]);
    let ctx = mlab_eval::NumericContext::default();
    let positions = a.find_nonzero(&mask, &ctx).unwrap();
    assert_eq!(positions, vec![2, 4]);
}
