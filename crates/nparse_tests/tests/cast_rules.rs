//! The full directed-cast and priority-cast grids over all six value
//! types, plus the operator coercions built on them.

use nparse_base::ErrorKind;
use nparse_core::{new_array, priority_tag, BinaryOp, Tag, Value};

fn samples() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Boolean(true),
        Value::Integer(7),
        Value::Real(2.5),
        Value::String("word".into()),
        new_array(),
    ]
}

fn tag_of_cast(value: &Value, target: Tag) -> Result<Tag, ErrorKind> {
    value
        .cast_to(target)
        .map(|v| v.tag())
        .map_err(|err| err.kind)
}

#[test]
fn directed_cast_to_null_is_total() {
    for value in &samples() {
        assert_eq!(tag_of_cast(value, Tag::Null), Ok(Tag::Null));
    }
}

#[test]
fn directed_cast_to_boolean() {
    assert_eq!(tag_of_cast(&Value::Null, Tag::Boolean), Ok(Tag::Boolean));
    assert_eq!(
        tag_of_cast(&Value::Boolean(false), Tag::Boolean),
        Ok(Tag::Boolean)
    );
    assert_eq!(
        tag_of_cast(&Value::Integer(0), Tag::Boolean),
        Ok(Tag::Boolean)
    );
    assert_eq!(
        tag_of_cast(&Value::Real(1.0), Tag::Boolean),
        Ok(Tag::Boolean)
    );
    assert_eq!(
        tag_of_cast(&Value::String("true".into()), Tag::Boolean),
        Ok(Tag::Boolean)
    );
    assert_eq!(
        tag_of_cast(&Value::String("word".into()), Tag::Boolean),
        Err(ErrorKind::BadCast)
    );
    assert_eq!(
        tag_of_cast(&new_array(), Tag::Boolean),
        Err(ErrorKind::BadCast)
    );
}

#[test]
fn directed_cast_to_integer() {
    assert_eq!(tag_of_cast(&Value::Null, Tag::Integer), Ok(Tag::Integer));
    assert_eq!(
        tag_of_cast(&Value::Boolean(true), Tag::Integer),
        Ok(Tag::Integer)
    );
    assert_eq!(tag_of_cast(&Value::Real(2.5), Tag::Integer), Ok(Tag::Integer));
    assert_eq!(
        tag_of_cast(&Value::String("42".into()), Tag::Integer),
        Ok(Tag::Integer)
    );
    assert_eq!(
        tag_of_cast(&Value::String("2.5".into()), Tag::Integer),
        Ok(Tag::Integer)
    );
    assert_eq!(
        tag_of_cast(&Value::String("word".into()), Tag::Integer),
        Err(ErrorKind::BadCast)
    );
    assert_eq!(
        tag_of_cast(&new_array(), Tag::Integer),
        Err(ErrorKind::BadCast)
    );
}

#[test]
fn directed_cast_to_real() {
    assert_eq!(tag_of_cast(&Value::Null, Tag::Real), Ok(Tag::Real));
    assert_eq!(tag_of_cast(&Value::Boolean(true), Tag::Real), Ok(Tag::Real));
    assert_eq!(tag_of_cast(&Value::Integer(3), Tag::Real), Ok(Tag::Real));
    assert_eq!(
        tag_of_cast(&Value::String("1.25".into()), Tag::Real),
        Ok(Tag::Real)
    );
    assert_eq!(
        tag_of_cast(&Value::String("word".into()), Tag::Real),
        Err(ErrorKind::BadCast)
    );
    assert_eq!(tag_of_cast(&new_array(), Tag::Real), Err(ErrorKind::BadCast));
}

#[test]
fn directed_cast_to_string_is_total() {
    for value in &samples() {
        assert_eq!(tag_of_cast(value, Tag::String), Ok(Tag::String));
    }
}

#[test]
fn directed_cast_to_array() {
    assert_eq!(tag_of_cast(&new_array(), Tag::Array), Ok(Tag::Array));
    for value in &samples() {
        if !value.is_array() {
            assert_eq!(tag_of_cast(value, Tag::Array), Err(ErrorKind::BadCast));
        }
    }
}

#[test]
fn priority_grid_is_the_rank_maximum() {
    let expected = [
        Tag::Null,
        Tag::Boolean,
        Tag::Integer,
        Tag::Real,
        Tag::String,
        Tag::Array,
    ];
    let values = samples();
    for (i, u) in values.iter().enumerate() {
        for (j, v) in values.iter().enumerate() {
            let winner = expected[i.max(j)];
            assert_eq!(priority_tag(u, v), winner);
            assert_eq!(priority_tag(v, u), winner);
        }
    }
}

#[test]
fn canonical_renderings() {
    assert_eq!(Value::Null.as_string(), "");
    assert_eq!(Value::Boolean(true).as_string(), "true");
    assert_eq!(Value::Integer(-3).as_string(), "-3");
    assert_eq!(Value::Real(0.5).as_string(), "0.5");
    assert_eq!(Value::String("abc".into()).as_string(), "abc");
    assert_eq!(new_array().as_string(), "array(0)");
}

#[test]
fn addition_is_overloaded_by_the_winner() {
    use nparse_core::dsel::apply_binary;
    // numeric
    assert_eq!(
        apply_binary(BinaryOp::Add, &Value::Integer(2), &Value::Boolean(true)).unwrap(),
        Value::Integer(3)
    );
    // widening
    assert_eq!(
        apply_binary(BinaryOp::Add, &Value::Integer(2), &Value::Real(0.25)).unwrap(),
        Value::Real(2.25)
    );
    // concatenation
    assert_eq!(
        apply_binary(
            BinaryOp::Add,
            &Value::String("a".into()),
            &Value::Integer(1)
        )
        .unwrap(),
        Value::String("a1".into())
    );
    // array union
    let merged = apply_binary(BinaryOp::Add, &new_array(), &new_array()).unwrap();
    assert!(merged.is_array());
    // array with scalar refuses
    assert_eq!(
        apply_binary(BinaryOp::Add, &new_array(), &Value::Integer(1))
            .unwrap_err()
            .kind,
        ErrorKind::BadCast
    );
}

#[test]
fn division_and_modulus_guard_zero() {
    use nparse_core::dsel::apply_binary;
    for op in [BinaryOp::Div, BinaryOp::Rem] {
        assert_eq!(
            apply_binary(op, &Value::Integer(5), &Value::Integer(0))
                .unwrap_err()
                .kind,
            ErrorKind::DivByZero
        );
        assert_eq!(
            apply_binary(op, &Value::Real(5.0), &Value::Null)
                .unwrap_err()
                .kind,
            ErrorKind::DivByZero
        );
    }
    assert_eq!(
        apply_binary(BinaryOp::Div, &Value::Integer(7), &Value::Integer(2)).unwrap(),
        Value::Integer(3)
    );
    assert_eq!(
        apply_binary(BinaryOp::Rem, &Value::Integer(7), &Value::Integer(2)).unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn equality_crosses_numeric_types() {
    use nparse_core::dsel::apply_binary;
    assert_eq!(
        apply_binary(BinaryOp::Eq, &Value::Integer(2), &Value::Real(2.0)).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        apply_binary(BinaryOp::Eq, &Value::Null, &Value::Null).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        apply_binary(
            BinaryOp::Ne,
            &Value::String("2".into()),
            &Value::Integer(2)
        )
        .unwrap(),
        Value::Boolean(false)
    );
}
