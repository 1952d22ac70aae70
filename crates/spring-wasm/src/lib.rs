use spring_core::anchor::{AnchorBridge, BellSurface, OwnerId};
use spring_core::creature::{Creature, CreatureConfig};
use spring_core::{ParticipantHandle, Solver, SolverConfig, SolverError};
use wasm_bindgen::prelude::*;

mod console_log;

/// GPU-compatible spring record: 8 bytes, matches the WGSL `Spring` struct
/// read by the spring line visualizer.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuSpring {
    v0: u32,
    v1: u32,
}

fn to_js(err: SolverError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct CreatureWorld {
    solver: Solver,
    bridge: ParticipantHandle<AnchorBridge<BellSurface>>,
    creatures: Vec<Creature>,
    spring_buffer: Vec<GpuSpring>,
}

#[wasm_bindgen]
impl CreatureWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(creature_count: u32, seed: f32) -> Result<CreatureWorld, JsValue> {
        Self::build(
            creature_count,
            seed,
            SolverConfig::default(),
            CreatureConfig::default(),
        )
        .map_err(to_js)
    }

    /// Same as the constructor, with solver and creature settings given as
    /// JSON documents. Missing fields keep their defaults.
    #[wasm_bindgen]
    pub fn from_json(
        creature_count: u32,
        seed: f32,
        solver_config: &str,
        creature_config: &str,
    ) -> Result<CreatureWorld, JsValue> {
        let solver_config = SolverConfig::from_json_str(solver_config).map_err(to_js)?;
        let creature_config = CreatureConfig::from_json_str(creature_config).map_err(to_js)?;
        Self::build(creature_count, seed, solver_config, creature_config).map_err(to_js)
    }

    /// Advance by the frame's wall-clock delta in seconds. Returns the number
    /// of fixed steps that ran.
    #[wasm_bindgen]
    pub fn update(&mut self, delta: f32) -> Result<u32, JsValue> {
        let start = js_sys::Date::now();
        let steps = self.solver.update(delta).map_err(to_js)?;
        let elapsed = js_sys::Date::now() - start;
        log::trace!("{steps} physics steps in {elapsed:.2} ms");
        Ok(steps)
    }

    #[wasm_bindgen]
    pub fn set_pointer_ray(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) {
        self.solver.set_interaction_ray(
            glam::Vec3::new(ox, oy, oz),
            glam::Vec3::new(dx, dy, dz).normalize_or_zero(),
        );
    }

    #[wasm_bindgen]
    pub fn clear_pointer_ray(&mut self) {
        self.solver.clear_interaction_ray();
    }

    /// Pointer to the `vec4<f32>` position buffer, indexed by particle id.
    #[wasm_bindgen]
    pub fn position_buffer_ptr(&self) -> *const f32 {
        self.solver.system().positions_bytes().as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn position_buffer_byte_length(&self) -> usize {
        self.solver.system().positions_bytes().len()
    }

    #[wasm_bindgen]
    pub fn spring_endpoint_ptr(&self) -> *const u32 {
        self.spring_buffer.as_ptr() as *const u32
    }

    #[wasm_bindgen]
    pub fn spring_endpoint_byte_length(&self) -> usize {
        bytemuck::cast_slice::<GpuSpring, u8>(&self.spring_buffer).len()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.solver.particle_count()
    }

    #[wasm_bindgen]
    pub fn spring_count(&self) -> usize {
        self.solver.spring_count()
    }

    #[wasm_bindgen]
    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    /// Column-major 4x4 transform of a creature, for placing its bell mesh.
    /// Empty for unknown creatures.
    #[wasm_bindgen]
    pub fn owner_transform(&self, creature: u32) -> Vec<f32> {
        let Ok(bridge) = self.solver.participant(self.bridge) else {
            return Vec::new();
        };
        bridge
            .owner(OwnerId(creature))
            .map(|o| glam::Mat4::from(o.transform).to_cols_array().to_vec())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn owner_phase(&self, creature: u32) -> f32 {
        self.solver
            .participant(self.bridge)
            .ok()
            .and_then(|b| b.owner(OwnerId(creature)).map(|o| o.phase))
            .unwrap_or(0.0)
    }

    /// Pointer charge of a creature in `[0, 1]`, for tinting the bell.
    #[wasm_bindgen]
    pub fn owner_charge(&self, creature: u32) -> f32 {
        self.solver
            .participant(self.bridge)
            .ok()
            .and_then(|b| b.owner(OwnerId(creature)).map(|o| o.charge))
            .unwrap_or(0.0)
    }
}

/// Seed drawn from the platform RNG, for scenes that should differ per load.
#[wasm_bindgen]
pub fn random_seed() -> f32 {
    let mut bytes = [0u8; 4];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => (u32::from_le_bytes(bytes) % 100_000) as f32 / 1000.0,
        Err(e) => {
            log::warn!("platform RNG unavailable ({e}), using fixed seed");
            0.0
        }
    }
}

impl CreatureWorld {
    fn build(
        creature_count: u32,
        seed: f32,
        solver_config: SolverConfig,
        creature_config: CreatureConfig,
    ) -> spring_core::Result<CreatureWorld> {
        console_log::init();

        let mut solver = Solver::new(solver_config)?;
        let bridge = solver.add_participant(AnchorBridge::new(BellSurface::default()))?;

        let creatures = (0..creature_count)
            .map(|i| Creature::spawn(&mut solver, bridge, i, seed, &creature_config))
            .collect::<spring_core::Result<Vec<_>>>()?;

        solver.bake()?;

        let spring_buffer = solver
            .system()
            .spring_endpoints()
            .iter()
            .map(|&[v0, v1]| GpuSpring { v0, v1 })
            .collect();

        log::info!(
            "CreatureWorld created: {} creatures, {} particles, {} springs",
            creatures.len(),
            solver.particle_count(),
            solver.spring_count()
        );

        Ok(CreatureWorld {
            solver,
            bridge,
            creatures,
            spring_buffer,
        })
    }
}
