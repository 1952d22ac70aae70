use glam::Vec3;
use spring_core::anchor::{AnchorBridge, BellSurface, SurfaceFormula};
use spring_core::creature::{Creature, CreatureConfig};
use spring_core::rig::{BellMarginRig, OralArmRig, TentacleRig};
use spring_core::{ParticipantHandle, Solver, SolverError};

fn setup() -> (Solver, ParticipantHandle<AnchorBridge<BellSurface>>) {
    let mut solver = Solver::with_defaults();
    let bridge = solver
        .add_participant(AnchorBridge::new(BellSurface::default()))
        .unwrap();
    (solver, bridge)
}

#[test]
fn test_margin_counts() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let rig = BellMarginRig {
        width: 16,
        rows: 5,
        muscle_rows: 2,
        ..BellMarginRig::default()
    };
    let margin = rig.build(&mut solver, bridge, owner).unwrap();

    assert_eq!(margin.rows.len(), 5);
    assert!(margin.rows.iter().all(|r| r.len() == 16));
    assert_eq!(margin.muscles.len(), 16 * 2);
    assert!(margin.rows[0].iter().all(|p| p.fixed), "rim row must be pinned");
    assert!(margin.rows[1..].iter().flatten().all(|p| !p.fixed));
    assert!(margin.muscles.iter().all(|p| p.fixed));

    assert_eq!(solver.particle_count(), 16 * 5 + 16 * 2);
    assert_eq!(solver.spring_count(), 4 * 16 * 4 + 16 * 2);
}

#[test]
fn test_rim_follows_bell() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let rig = BellMarginRig::default();
    let margin = rig.build(&mut solver, bridge, owner).unwrap();
    solver.bake().unwrap();

    let bell = BellSurface::default();
    for (x, p) in margin.rows[0].iter().enumerate() {
        let anchor = margin.anchors[0][x];
        let expected = bell.position(0.0, anchor.zenith, anchor.azimuth, 0.0);
        let got = solver.position(p.id).unwrap();
        assert!(got.distance(expected) < 1e-5, "rim particle {x}: {got:?} vs {expected:?}");
    }
}

#[test]
fn test_margin_too_small() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let rig = BellMarginRig {
        width: 1,
        ..BellMarginRig::default()
    };
    assert!(matches!(
        rig.build(&mut solver, bridge, owner),
        Err(SolverError::InvalidConfig(_))
    ));
}

#[test]
fn test_tentacle_chains() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let margin = BellMarginRig::default().build(&mut solver, bridge, owner).unwrap();
    let particles_before = solver.particle_count();
    let springs_before = solver.spring_count();

    let rig = TentacleRig {
        count: 4,
        length: 10,
        ..TentacleRig::default()
    };
    let tentacles = rig.build(&mut solver, bridge, owner, &margin, 1.5).unwrap();

    assert_eq!(tentacles.len(), 4);
    for chain in &tentacles {
        assert_eq!(chain.len(), 10);
        assert!(chain.iter().all(|p| !p.fixed));
    }
    assert_eq!(solver.particle_count() - particles_before, 4 * 7);
    assert_eq!(solver.spring_count() - springs_before, 4 * 7 * 2);

    solver.bake().unwrap();
    for chain in &tentacles {
        let ys: Vec<f32> = chain[3..]
            .iter()
            .map(|p| solver.position(p.id).unwrap().y)
            .collect();
        assert!(ys.windows(2).all(|w| w[1] < w[0]), "tentacle not hanging down: {ys:?}");
    }
}

#[test]
fn test_oral_arm_counts() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let arms = OralArmRig::default().build(&mut solver, bridge, owner, 0.3).unwrap();

    assert_eq!(arms.arms.len(), 4);
    for arm in &arms.arms {
        assert_eq!(arm.len(), 35);
        assert!(arm.iter().all(|row| row.len() == 5));
        assert!(arm[0].iter().all(|p| p.fixed), "root row must be pinned");
        assert!(arm[1..].iter().flatten().all(|p| !p.fixed));
    }
    assert_eq!(solver.particle_count(), 4 * 35 * 5);

    // rows 8, 13, .., 33 contract, five springs each
    assert_eq!(arms.contracting.len(), 4 * 6 * 5);
    let per_arm = 34 * (5 + 4 + 3) + 33 * 5 + 6 * 5;
    assert_eq!(solver.spring_count(), 4 * per_arm);
}

#[test]
fn test_oral_arm_contracting_rest_lengths() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let arms = OralArmRig::default().build(&mut solver, bridge, owner, 1.9).unwrap();
    solver.bake().unwrap();

    let system = solver.system();
    for &spring in &arms.contracting {
        let [v0, v1] = system.spring_endpoints()[spring.index()];
        let a = solver.position(spring_core::ParticleId(v0)).unwrap();
        let b = solver.position(spring_core::ParticleId(v1)).unwrap();
        let ratio = system.rest_length(spring).unwrap() / a.distance(b);
        assert!((0.3 - 1e-5..0.5 + 1e-5).contains(&ratio), "spring {spring:?} rest ratio {ratio}");
    }
}

#[test]
fn test_oral_arms_hang_from_underside() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let arms = OralArmRig::default().build(&mut solver, bridge, owner, 0.7).unwrap();
    solver.bake().unwrap();

    let b = solver.participant(bridge).unwrap();
    let bell = BellSurface::default();
    for arm in &arms.arms {
        for p in arm.iter().flatten() {
            let record = b.anchors().iter().find(|r| r.particle == p.id).unwrap();
            assert!(record.anchor.bottom, "particle {:?} not on the underside", p.id);
        }
        for p in &arm[0] {
            let a = b.anchors().iter().find(|r| r.particle == p.id).unwrap().anchor;
            let under = bell.position(0.0, a.zenith, a.azimuth, 1.0) + a.offset;
            let over = bell.position(0.0, a.zenith, a.azimuth, 0.0) + a.offset;
            let got = solver.position(p.id).unwrap();
            assert!(got.distance(under) < 1e-5, "root {got:?} vs underside {under:?}");
            assert!(got.distance(over) > 1e-2, "root {got:?} sits on the top surface");
        }
        // rows hang downwards
        let first = solver.position(arm[1][2].id).unwrap();
        let last = solver.position(arm[34][2].id).unwrap();
        assert!(last.y < first.y, "arm not hanging: {first:?} -> {last:?}");
    }
}

#[test]
fn test_oral_arm_too_narrow() {
    let (mut solver, bridge) = setup();
    let owner = solver.participant_mut(bridge).unwrap().register_owner().unwrap();
    let rig = OralArmRig {
        width: 1,
        ..OralArmRig::default()
    };
    assert!(matches!(
        rig.build(&mut solver, bridge, owner, 0.0),
        Err(SolverError::InvalidConfig(_))
    ));
    assert_eq!(solver.particle_count(), 0);

    let none = OralArmRig {
        count: 0,
        width: 1,
        ..OralArmRig::default()
    };
    assert!(none.build(&mut solver, bridge, owner, 0.0).unwrap().arms.is_empty());
}

#[test]
fn test_pointer_charges_creature() {
    let (mut solver, bridge) = setup();
    let config = CreatureConfig::default();
    let aimed = Creature::spawn(&mut solver, bridge, 0, 0.42, &config).unwrap();
    solver.bake().unwrap();

    for _ in 0..30 {
        let b = solver.participant(bridge).unwrap();
        let target: Vec3 = b.owner(aimed.owner).unwrap().transform.translation.into();
        solver.set_interaction_ray(target + Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        solver.update(1.0 / 60.0).unwrap();
    }

    let charged = solver.participant(bridge).unwrap().owner(aimed.owner).unwrap().charge;
    assert!(charged > 0.5, "aimed creature charge {charged}");

    solver.clear_interaction_ray();
    for _ in 0..30 {
        solver.update(1.0 / 60.0).unwrap();
    }
    let faded = solver.participant(bridge).unwrap().owner(aimed.owner).unwrap().charge;
    assert!(faded < charged * 0.5, "charge {charged} only faded to {faded}");
}

#[test]
fn test_creatures_swim_without_nan() {
    let (mut solver, bridge) = setup();
    let config = CreatureConfig::default();
    let creatures: Vec<Creature> = (0..3)
        .map(|i| Creature::spawn(&mut solver, bridge, i, 0.42, &config).unwrap())
        .collect();
    solver.bake().unwrap();

    let start: Vec<Vec3> = creatures
        .iter()
        .map(|c| {
            let b = solver.participant(bridge).unwrap();
            b.owner(c.owner).unwrap().transform.translation.into()
        })
        .collect();

    for _ in 0..120 {
        solver.update(1.0 / 60.0).unwrap();
    }

    for (i, p) in solver.positions().iter().enumerate() {
        assert!(p.is_finite(), "particle {i} non-finite: {p:?}");
    }
    let b = solver.participant(bridge).unwrap();
    for (c, s) in creatures.iter().zip(&start) {
        let now: Vec3 = b.owner(c.owner).unwrap().transform.translation.into();
        assert_ne!(now, *s, "creature {:?} did not move", c.owner);
    }

    // rim particles stay glued to their owner
    for c in &creatures {
        let owner = b.owner(c.owner).unwrap();
        let rim = c.margin.rows[0][0];
        let anchor = c.margin.anchors[0][0];
        let local = b.surface().position(owner.phase, anchor.zenith, anchor.azimuth, 0.0);
        let expected = owner.transform.transform_point3(local);
        let got = solver.position(rim.id).unwrap();
        assert!(got.distance(expected) < 1e-3, "rim drifted: {got:?} vs {expected:?}");
    }
}
