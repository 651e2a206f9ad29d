//! Conversion dispatcher tests on the CPU backend.

use approx::assert_abs_diff_eq;
use compositor_compute::{
    ComputeError, ConversionKernel, ConversionOperation, ExecutionContext, TypedResult,
    convert_if_needed,
};
use compositor_core::{Domain, Error, InputDescriptor, Value, ValueType};

fn convert_single(ctx: &ExecutionContext, value: Value, target: ValueType) -> Value {
    let input = TypedResult::single(value);
    let op = ConversionOperation::construct_if_needed(ctx, &input, &InputDescriptor::new(target))
        .expect("conversion should be needed");
    let output = op.execute(&input).unwrap();
    assert!(output.is_single_value());
    output.single_value().unwrap()
}

fn assert_channels(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-6, "channel {i}: {a} vs {e}");
    }
}

#[test]
fn test_construct_if_needed_pairs() {
    let ctx = ExecutionContext::cpu();
    for source in ValueType::ALL {
        let input = TypedResult::single(Value::zero(source));
        for target in ValueType::ALL {
            let op = ConversionOperation::construct_if_needed(
                &ctx,
                &input,
                &InputDescriptor::new(target),
            );
            if source == target {
                assert!(op.is_none(), "{source} -> {target} needs no conversion");
            } else {
                let op = op.unwrap();
                assert_eq!(op.source_type(), source);
                assert_eq!(op.target_type(), target);
            }
        }
    }
}

#[test]
fn test_skip_type_conversion() {
    let ctx = ExecutionContext::cpu();
    let input = TypedResult::single(Value::float(0.5));
    let descriptor = InputDescriptor::new(ValueType::Color).with_skip_type_conversion(true);
    assert!(ConversionOperation::construct_if_needed(&ctx, &input, &descriptor).is_none());

    let passed = convert_if_needed(&ctx, input, &descriptor).unwrap();
    assert_eq!(passed.value_type(), ValueType::Float);
    assert_eq!(passed.single_value(), Some(Value::float(0.5)));
}

#[test]
fn test_float_to_vector() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::float(0.5), ValueType::Vector);
    assert_eq!(out.value_type(), ValueType::Vector);
    assert_channels(out.channels(), &[0.5, 0.5, 0.5, 1.0]);
}

#[test]
fn test_float_to_color() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::float(0.2), ValueType::Color);
    assert_channels(out.channels(), &[0.2, 0.2, 0.2, 1.0]);
}

#[test]
fn test_color_to_float_ignores_alpha() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::color(0.3, 0.6, 0.9, 0.1), ValueType::Float);
    assert_abs_diff_eq!(out.as_float().unwrap(), 0.6, epsilon = 1e-6);
}

#[test]
fn test_color_to_vector_copies_all_channels() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::color(0.1, 0.2, 0.3, 0.4), ValueType::Vector);
    assert_eq!(out, Value::Vector([0.1, 0.2, 0.3, 0.4]));
}

#[test]
fn test_vector_to_float() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::vector(1.0, 2.0, 3.0), ValueType::Float);
    assert_abs_diff_eq!(out.as_float().unwrap(), 2.0, epsilon = 1e-6);
}

#[test]
fn test_vector_to_color_forces_alpha() {
    let ctx = ExecutionContext::cpu();
    let out = convert_single(&ctx, Value::Vector([0.4, 0.5, 0.6, 7.0]), ValueType::Color);
    assert_channels(out.channels(), &[0.4, 0.5, 0.6, 1.0]);
}

#[test]
fn test_float_color_float_roundtrip() {
    let ctx = ExecutionContext::cpu();
    let color = convert_single(&ctx, Value::float(0.5), ValueType::Color);
    let back = convert_single(&ctx, color, ValueType::Float);
    assert_eq!(back, Value::float(0.5));
}

#[test]
fn test_color_float_color_is_lossy() {
    let ctx = ExecutionContext::cpu();
    let original = Value::color(0.9, 0.1, 0.2, 0.5);
    let float = convert_single(&ctx, original, ValueType::Float);
    let back = convert_single(&ctx, float, ValueType::Color);

    assert_ne!(back, original);
    let c = back.channels();
    assert_abs_diff_eq!(c[0], 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(c[1], 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(c[2], 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(c[3], 1.0);
}

#[test]
fn test_single_matches_one_pixel_buffer() {
    let ctx = ExecutionContext::cpu();
    let inputs = [
        Value::float(0.75),
        Value::vector(0.25, -1.0, 3.5),
        Value::color(0.3, 0.6, 0.9, 0.1),
    ];

    for kernel in ConversionKernel::ALL {
        let value = inputs
            .iter()
            .copied()
            .find(|v| v.value_type() == kernel.source())
            .unwrap();
        let op = ConversionOperation::new(&ctx, kernel);

        let single = op.execute(&TypedResult::single(value)).unwrap();
        let buffer_in = ctx.upload_values(Domain::single(), &[value]).unwrap();
        assert!(!buffer_in.is_single_value());
        let buffer_out = op.execute(&buffer_in).unwrap();

        assert!(!buffer_out.is_single_value());
        assert_eq!(
            ctx.download(&single).unwrap(),
            ctx.download(&buffer_out).unwrap(),
            "{kernel}"
        );
    }
}

#[test]
fn test_buffer_conversion_per_element() {
    let ctx = ExecutionContext::cpu();
    let domain = Domain::new(3, 2).unwrap();
    let values: Vec<Value> = (0..6)
        .map(|i| {
            let f = i as f32 * 0.1;
            Value::color(f, f + 0.2, f + 0.4, 0.5)
        })
        .collect();
    let input = ctx.upload_values(domain, &values).unwrap();

    let op = ConversionOperation::new(&ctx, ConversionKernel::ColorToFloat);
    let output = op.execute(&input).unwrap();
    assert_eq!(output.value_type(), ValueType::Float);
    assert_eq!(output.domain(), domain);

    let floats = ctx.read_values(&output).unwrap();
    for (value, out) in values.iter().zip(&floats) {
        let expected = ConversionKernel::ColorToFloat.execute_single(value).unwrap();
        assert_eq!(*out, expected);
    }

    // input is untouched
    assert_eq!(ctx.read_values(&input).unwrap(), values);
}

#[test]
fn test_large_buffer_parallel_matches_sequential() {
    let domain = Domain::new(128, 64).unwrap();
    let data: Vec<f32> = (0..domain.pixel_count()).map(|i| (i % 97) as f32 / 97.0).collect();

    let parallel = ExecutionContext::cpu();
    let sequential = ExecutionContext::new(
        compositor_compute::ContextConfig::default()
            .with_backend(compositor_compute::Backend::Cpu)
            .with_parallel(false),
    )
    .unwrap();

    let run = |ctx: &ExecutionContext| {
        let input = ctx.upload(ValueType::Float, domain, &data).unwrap();
        let output = ConversionOperation::new(ctx, ConversionKernel::FloatToVector)
            .execute(&input)
            .unwrap();
        ctx.download(&output).unwrap()
    };

    let a = run(&parallel);
    let b = run(&sequential);
    assert_eq!(a.len(), domain.pixel_count() * 4);
    assert_eq!(a, b);
    assert_eq!(&a[4..8], &[data[1], data[1], data[1], 1.0]);
}

#[test]
fn test_execute_rejects_wrong_source_type() {
    let ctx = ExecutionContext::cpu();
    let op = ConversionOperation::new(&ctx, ConversionKernel::FloatToColor);
    let err = op.execute(&TypedResult::single(Value::vector(1.0, 1.0, 1.0))).unwrap_err();
    assert!(matches!(
        err,
        ComputeError::Core(Error::TypeMismatch {
            expected: ValueType::Float,
            actual: ValueType::Vector,
        })
    ));
}

#[test]
fn test_convert_if_needed() {
    let ctx = ExecutionContext::cpu();
    let domain = Domain::new(2, 2).unwrap();
    let input = ctx
        .upload(ValueType::Vector, domain, &[1.0, 2.0, 3.0, 0.0].repeat(4))
        .unwrap();

    let same = convert_if_needed(&ctx, input, &InputDescriptor::new(ValueType::Vector)).unwrap();
    assert_eq!(same.value_type(), ValueType::Vector);

    let float = convert_if_needed(&ctx, same, &InputDescriptor::new(ValueType::Float)).unwrap();
    assert_eq!(float.value_type(), ValueType::Float);
    assert_eq!(float.domain(), domain);
    for v in ctx.download(&float).unwrap() {
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-6);
    }
}
