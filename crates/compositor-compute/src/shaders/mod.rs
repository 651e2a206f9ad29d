//! WGSL shader sources for the conversion pipelines.
//!
//! All shaders share one binding layout:
//! - `0`: source buffer (`array<f32>`, read-only)
//! - `1`: destination buffer (`array<f32>`)
//! - `2`: dims uniform `[width, height, src channels, dst channels]`
//!
//! Large domains are dispatched as a 2D grid of workgroups, so the element
//! index folds `id.y` back in using `num_workgroups`.

/// Float -> Vector: `(f, f, f, 1)`.
pub const FLOAT_TO_VECTOR: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let f = src[px];
    let base = px * 4u;

    dst[base] = f;
    dst[base + 1u] = f;
    dst[base + 2u] = f;
    dst[base + 3u] = 1.0;
}
"#;

/// Float -> Color: `(f, f, f, 1)`.
pub const FLOAT_TO_COLOR: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let f = src[px];
    let base = px * 4u;

    dst[base] = f;
    dst[base + 1u] = f;
    dst[base + 2u] = f;
    dst[base + 3u] = 1.0;
}
"#;

/// Color -> Float: average of RGB, alpha ignored.
pub const COLOR_TO_FLOAT: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    dst[px] = (src[base] + src[base + 1u] + src[base + 2u]) / 3.0;
}
"#;

/// Color -> Vector: straight 4-channel copy.
pub const COLOR_TO_VECTOR: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    dst[base] = src[base];
    dst[base + 1u] = src[base + 1u];
    dst[base + 2u] = src[base + 2u];
    dst[base + 3u] = src[base + 3u];
}
"#;

/// Vector -> Float: average of XYZ.
pub const VECTOR_TO_FLOAT: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    dst[px] = (src[base] + src[base + 1u] + src[base + 2u]) / 3.0;
}
"#;

/// Vector -> Color: XYZ into RGB, alpha forced to 1.
pub const VECTOR_TO_COLOR: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let px = id.x + id.y * groups.x * 256u;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    dst[base] = src[base];
    dst[base + 1u] = src[base + 1u];
    dst[base + 2u] = src[base + 2u];
    dst[base + 3u] = 1.0;
}
"#;
