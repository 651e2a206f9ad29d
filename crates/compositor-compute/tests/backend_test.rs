//! Backend selection and GPU/CPU consistency tests.
//!
//! GPU tests return early when no wgpu adapter is present.

use compositor_compute::{
    Backend, ContextConfig, ConversionKernel, ExecutionContext, describe_backends,
    select_best_backend,
};
use compositor_core::{Domain, ValueType};

#[test]
fn test_cpu_backend_available() {
    assert!(Backend::Cpu.is_available());
}

#[test]
fn test_describe_backends() {
    let desc = describe_backends();
    println!("{}", desc);
    assert!(desc.contains("CPU"));
}

#[test]
fn test_auto_context() {
    let ctx = ExecutionContext::new(ContextConfig::default()).unwrap();
    println!("Auto-selected backend: {}", ctx.backend_name());
    assert_ne!(ctx.backend(), Backend::Auto);
    if select_best_backend() == Backend::Cpu {
        assert_eq!(ctx.backend(), Backend::Cpu);
    }
}

#[test]
fn test_cpu_allocate_shape() {
    let ctx = ExecutionContext::cpu();
    let domain = Domain::new(4, 3).unwrap();
    let result = ctx.allocate(ValueType::Color, domain).unwrap();
    assert_eq!(result.domain(), domain);
    assert_eq!(ctx.download(&result).unwrap().len(), 4 * 3 * 4);
}

#[test]
fn test_kernel_table_covers_all_pairs() {
    let mut seen = 0;
    for source in ValueType::ALL {
        for target in ValueType::ALL {
            match ConversionKernel::for_types(source, target) {
                Some(kernel) => {
                    assert_ne!(source, target);
                    assert_eq!(kernel.source(), source);
                    assert_eq!(kernel.target(), target);
                    seen += 1;
                }
                None => assert_eq!(source, target),
            }
        }
    }
    assert_eq!(seen, ConversionKernel::ALL.len());
}

#[cfg(feature = "wgpu")]
mod gpu {
    use approx::assert_abs_diff_eq;
    use compositor_compute::{
        Backend, ComputeError, ConversionKernel, ConversionOperation, ExecutionContext,
        TypedResult,
    };
    use compositor_compute::backend::CpuImage;
    use compositor_core::{Domain, Value, ValueType};

    fn gpu_context() -> Option<ExecutionContext> {
        if !Backend::Wgpu.is_available() {
            println!("wgpu not available, skipping");
            return None;
        }
        match ExecutionContext::wgpu() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                println!("wgpu context failed ({e}), skipping");
                None
            }
        }
    }

    fn sample_input(ty: ValueType, domain: Domain) -> Vec<f32> {
        let channels = ty.channel_count();
        (0..domain.buffer_len(channels))
            .map(|i| ((i * 37) % 101) as f32 / 100.0 - 0.25)
            .collect()
    }

    #[test]
    fn test_gpu_matches_cpu_for_every_kernel() {
        let Some(gpu) = gpu_context() else { return };
        let cpu = ExecutionContext::cpu();
        let domain = Domain::new(37, 19).unwrap();

        for kernel in ConversionKernel::ALL {
            let data = sample_input(kernel.source(), domain);

            let on_gpu = {
                let input = gpu.upload(kernel.source(), domain, &data).unwrap();
                let output = ConversionOperation::new(&gpu, kernel).execute(&input).unwrap();
                assert_eq!(output.value_type(), kernel.target());
                assert_eq!(output.domain(), domain);
                gpu.download(&output).unwrap()
            };
            let on_cpu = {
                let input = cpu.upload(kernel.source(), domain, &data).unwrap();
                let output = ConversionOperation::new(&cpu, kernel).execute(&input).unwrap();
                cpu.download(&output).unwrap()
            };

            assert_eq!(on_gpu.len(), on_cpu.len(), "{kernel}");
            for (i, (g, c)) in on_gpu.iter().zip(&on_cpu).enumerate() {
                assert!((g - c).abs() < 1e-6, "{kernel} at {i}: gpu {g} vs cpu {c}");
            }
        }
    }

    #[test]
    fn test_gpu_single_value_stays_on_host() {
        let Some(gpu) = gpu_context() else { return };
        let input = TypedResult::single(Value::float(0.5));
        let output = ConversionOperation::new(&gpu, ConversionKernel::FloatToVector)
            .execute(&input)
            .unwrap();
        assert!(output.is_single_value());
        assert_eq!(output.single_value(), Some(Value::Vector([0.5, 0.5, 0.5, 1.0])));
    }

    #[test]
    fn test_gpu_one_pixel_matches_single() {
        let Some(gpu) = gpu_context() else { return };
        let value = Value::color(0.3, 0.6, 0.9, 0.1);
        let buffer = gpu.upload_values(Domain::single(), &[value]).unwrap();
        let output = ConversionOperation::new(&gpu, ConversionKernel::ColorToFloat)
            .execute(&buffer)
            .unwrap();
        let expected = ConversionKernel::ColorToFloat.execute_single(&value).unwrap();
        let got = gpu.read_values(&output).unwrap();
        assert_eq!(got.len(), 1);
        assert_abs_diff_eq!(got[0].as_float().unwrap(), expected.as_float().unwrap(), epsilon = 1e-6);
    }

    #[test]
    fn test_cpu_buffer_on_gpu_context_is_rejected() {
        let Some(gpu) = gpu_context() else { return };
        let image = CpuImage::zeroed(Domain::new(2, 2).unwrap(), 1);
        let input = TypedResult::from_cpu(ValueType::Float, image).unwrap();
        let err = ConversionOperation::new(&gpu, ConversionKernel::FloatToColor)
            .execute(&input)
            .unwrap_err();
        assert!(matches!(
            err,
            ComputeError::StorageMismatch { expected: "wgpu", actual: "cpu" }
        ));
    }

    #[test]
    fn test_gpu_buffer_on_cpu_context_is_rejected() {
        let Some(gpu) = gpu_context() else { return };
        let cpu = ExecutionContext::cpu();
        let input = gpu.upload(ValueType::Float, Domain::new(2, 2).unwrap(), &[0.0; 4]).unwrap();

        assert!(matches!(
            ConversionOperation::new(&cpu, ConversionKernel::FloatToColor).execute(&input),
            Err(ComputeError::StorageMismatch { expected: "cpu", actual: "wgpu" })
        ));
        assert!(cpu.download(&input).is_err());
    }

    #[test]
    fn test_gpu_oversized_buffer_is_an_error() {
        let Some(gpu) = gpu_context() else { return };
        // 64 GiB of color: beyond any adapter's buffer limit.
        let domain = Domain::new(65536, 65536).unwrap();
        assert!(matches!(
            gpu.allocate(ValueType::Color, domain),
            Err(ComputeError::ResourceExhausted { .. })
        ));

        // The context stays usable afterwards.
        let small = gpu.upload(ValueType::Float, Domain::new(2, 1).unwrap(), &[0.5, 1.0]).unwrap();
        let out = ConversionOperation::new(&gpu, ConversionKernel::FloatToColor)
            .execute(&small)
            .unwrap();
        assert_eq!(gpu.download(&out).unwrap().len(), 8);
    }
}
