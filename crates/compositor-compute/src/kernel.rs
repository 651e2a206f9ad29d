//! Conversion kernels between value types.
//!
//! Every ordered pair of distinct [`ValueType`]s has exactly one kernel.
//! A kernel is a tag into a static table holding its per-element function
//! and the WGSL source of its compute shader:
//!
//! | Kernel | Mapping |
//! |--------|---------|
//! | Float -> Vector | `(f, f, f, 1)` |
//! | Float -> Color | `(f, f, f, 1)` |
//! | Color -> Float | `(r + g + b) / 3` |
//! | Color -> Vector | `(r, g, b, a)` |
//! | Vector -> Float | `(x + y + z) / 3` |
//! | Vector -> Color | `(x, y, z, 1)` |
//!
//! The single-value form and the CPU loop call the same per-element
//! function, so they agree bit for bit. The shaders spell out the same
//! arithmetic in the same order.

use compositor_core::{Error, Result, Value, ValueType};
use rayon::prelude::*;

use crate::backend::{CpuImage, ImageHandle};
use crate::shaders;

/// Per-element conversion: reads one source element, writes one target element.
pub type ElementFn = fn(&[f32], &mut [f32]);

/// Conversion kernel tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKernel {
    FloatToVector = 0,
    FloatToColor = 1,
    ColorToFloat = 2,
    ColorToVector = 3,
    VectorToFloat = 4,
    VectorToColor = 5,
}

/// Static description of one kernel.
#[derive(Debug)]
pub struct KernelSpec {
    pub kernel: ConversionKernel,
    pub source: ValueType,
    pub target: ValueType,
    /// Label for logs and GPU debug markers.
    pub label: &'static str,
    pub convert: ElementFn,
    /// WGSL compute shader, entry point `main`.
    pub shader: &'static str,
}

static KERNELS: [KernelSpec; 6] = [
    KernelSpec {
        kernel: ConversionKernel::FloatToVector,
        source: ValueType::Float,
        target: ValueType::Vector,
        label: "float_to_vector",
        convert: float_to_vector,
        shader: shaders::FLOAT_TO_VECTOR,
    },
    KernelSpec {
        kernel: ConversionKernel::FloatToColor,
        source: ValueType::Float,
        target: ValueType::Color,
        label: "float_to_color",
        convert: float_to_color,
        shader: shaders::FLOAT_TO_COLOR,
    },
    KernelSpec {
        kernel: ConversionKernel::ColorToFloat,
        source: ValueType::Color,
        target: ValueType::Float,
        label: "color_to_float",
        convert: color_to_float,
        shader: shaders::COLOR_TO_FLOAT,
    },
    KernelSpec {
        kernel: ConversionKernel::ColorToVector,
        source: ValueType::Color,
        target: ValueType::Vector,
        label: "color_to_vector",
        convert: color_to_vector,
        shader: shaders::COLOR_TO_VECTOR,
    },
    KernelSpec {
        kernel: ConversionKernel::VectorToFloat,
        source: ValueType::Vector,
        target: ValueType::Float,
        label: "vector_to_float",
        convert: vector_to_float,
        shader: shaders::VECTOR_TO_FLOAT,
    },
    KernelSpec {
        kernel: ConversionKernel::VectorToColor,
        source: ValueType::Vector,
        target: ValueType::Color,
        label: "vector_to_color",
        convert: vector_to_color,
        shader: shaders::VECTOR_TO_COLOR,
    },
];

impl ConversionKernel {
    /// All kernels, in table order.
    pub const ALL: [ConversionKernel; 6] = [
        ConversionKernel::FloatToVector,
        ConversionKernel::FloatToColor,
        ConversionKernel::ColorToFloat,
        ConversionKernel::ColorToVector,
        ConversionKernel::VectorToFloat,
        ConversionKernel::VectorToColor,
    ];

    /// Kernel converting `source` into `target`, or `None` when the types
    /// are equal and nothing needs converting.
    pub const fn for_types(source: ValueType, target: ValueType) -> Option<Self> {
        use ValueType::*;
        match (source, target) {
            (Float, Float) | (Vector, Vector) | (Color, Color) => None,
            (Float, Vector) => Some(Self::FloatToVector),
            (Float, Color) => Some(Self::FloatToColor),
            (Color, Float) => Some(Self::ColorToFloat),
            (Color, Vector) => Some(Self::ColorToVector),
            (Vector, Float) => Some(Self::VectorToFloat),
            (Vector, Color) => Some(Self::VectorToColor),
        }
    }

    /// Position in [`ConversionKernel::ALL`] and the kernel table.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn spec(self) -> &'static KernelSpec {
        &KERNELS[self.index()]
    }

    #[inline]
    pub fn source(self) -> ValueType {
        self.spec().source
    }

    #[inline]
    pub fn target(self) -> ValueType {
        self.spec().target
    }

    #[inline]
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// WGSL source of the compute shader implementing this kernel.
    #[inline]
    pub fn conversion_shader(self) -> &'static str {
        self.spec().shader
    }

    /// Convert a single value.
    ///
    /// Always runs on the calling thread, whatever the active backend.
    pub fn execute_single(self, input: &Value) -> Result<Value> {
        self.ensure_source(input.value_type())?;
        let mut output = Value::zero(self.target());
        (self.spec().convert)(input.channels(), output.channels_mut());
        Ok(output)
    }

    /// Convert every element of `input` into the pre-allocated `output`.
    ///
    /// `output` must have the target channel count and the same domain as
    /// `input`. With `parallel` set the loop is split across the rayon pool;
    /// elements are independent so the result is identical either way.
    pub fn execute_cpu(self, input: &CpuImage, output: &mut CpuImage, parallel: bool) -> Result<()> {
        let spec = self.spec();
        input.ensure_layout(spec.source)?;
        output.ensure_layout(spec.target)?;
        input.domain().ensure_matches(&output.domain())?;

        let sc = spec.source.channel_count();
        let tc = spec.target.channel_count();
        let convert = spec.convert;

        if parallel {
            output
                .data_mut()
                .par_chunks_exact_mut(tc)
                .zip(input.data().par_chunks_exact(sc))
                .for_each(|(out, inp)| convert(inp, out));
        } else {
            output
                .data_mut()
                .chunks_exact_mut(tc)
                .zip(input.data().chunks_exact(sc))
                .for_each(|(out, inp)| convert(inp, out));
        }
        Ok(())
    }

    fn ensure_source(self, actual: ValueType) -> Result<()> {
        if actual != self.source() {
            return Err(Error::TypeMismatch {
                expected: self.source(),
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for ConversionKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Per-element functions
// =============================================================================

fn float_to_vector(inp: &[f32], out: &mut [f32]) {
    let f = inp[0];
    out[0] = f;
    out[1] = f;
    out[2] = f;
    out[3] = 1.0;
}

fn float_to_color(inp: &[f32], out: &mut [f32]) {
    let f = inp[0];
    out[0] = f;
    out[1] = f;
    out[2] = f;
    out[3] = 1.0;
}

fn color_to_float(inp: &[f32], out: &mut [f32]) {
    out[0] = (inp[0] + inp[1] + inp[2]) / 3.0;
}

fn color_to_vector(inp: &[f32], out: &mut [f32]) {
    out[..4].copy_from_slice(&inp[..4]);
}

fn vector_to_float(inp: &[f32], out: &mut [f32]) {
    out[0] = (inp[0] + inp[1] + inp[2]) / 3.0;
}

fn vector_to_color(inp: &[f32], out: &mut [f32]) {
    out[..3].copy_from_slice(&inp[..3]);
    out[3] = 1.0;
}
