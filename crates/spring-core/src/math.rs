use glam::Vec3;

/// Hash float to [0,1] - port of GLSL hash11
pub fn hash11(p: f32) -> f32 {
    let mut p = (p * 0.1031).fract();
    p *= p + 33.33;
    p *= p + p;
    p.fract()
}

/// Hash vec2 to [0,1] - port of GLSL hash12
pub fn hash12(x: f32, y: f32) -> f32 {
    let p3x = (x * 0.1031).fract();
    let p3y = (x * 0.1031).fract(); // .xyx pattern: z = x
    let p3z = (y * 0.1031).fract();
    let dot_val = p3x * (p3y + 33.33) + p3y * (p3z + 33.33) + p3z * (p3x + 33.33);
    let p3x = p3x + dot_val;
    let p3y = p3y + dot_val;
    let p3z = p3z + dot_val;
    ((p3x + p3y) * p3z).fract()
}

/// Hash vec3 to [0,1] - port of GLSL hash13
pub fn hash13(p: Vec3) -> f32 {
    let mut p3 = (p * 0.1031).fract_gl();
    let d = p3.dot(Vec3::new(p3.z, p3.y, p3.x) + 31.32);
    p3 += d;
    ((p3.x + p3.y) * p3.z).fract()
}

/// Trilinear value noise in [0,1], smooth across lattice cells.
pub fn noise3(x: f32, y: f32, z: f32) -> f32 {
    let p = Vec3::new(x, y, z);
    let cell = p.floor();
    let f = p - cell;
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let corner = |dx: f32, dy: f32, dz: f32| hash13(cell + Vec3::new(dx, dy, dz));

    let x00 = mix(corner(0.0, 0.0, 0.0), corner(1.0, 0.0, 0.0), u.x);
    let x10 = mix(corner(0.0, 1.0, 0.0), corner(1.0, 1.0, 0.0), u.x);
    let x01 = mix(corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), u.x);
    let x11 = mix(corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), u.x);
    let y0 = mix(x00, x10, u.y);
    let y1 = mix(x01, x11, u.y);
    mix(y0, y1, u.z)
}

/// Signed variant of [`noise3`] in [-1,1].
pub fn snoise3(x: f32, y: f32, z: f32) -> f32 {
    noise3(x, y, z) * 2.0 - 1.0
}

/// Smooth interpolation - port of GLSL smoothstep
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL-style `mix(a, b, t)` for scalars.
#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
