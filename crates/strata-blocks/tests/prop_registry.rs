use proptest::prelude::*;
use strata_blocks::{BlockRegistry, Emission, FaceTextures};

#[test]
fn toml_roundtrip_fixed() {
    let reg = BlockRegistry::from_toml_str(
        r#"
        [[blocks]]
        name = "stone"
        all = [0.0, 0.0, 0.25, 0.25]

        [[blocks]]
        name = "grass"
        top = [0.25, 0.0, 0.5, 0.25]
        bottom = [0.5, 0.0, 0.75, 0.25]
        side = [0.75, 0.0, 1.0, 0.25]

        [[blocks]]
        name = "torch"
        all = [0.0, 0.25, 0.25, 0.5]
        emission = [15, 11, 6]
    "#,
    )
    .expect("registry");
    assert_eq!(reg.id_by_name("air"), Some(0));
    assert_eq!(reg.id_by_name("stone"), Some(1));
    assert_eq!(reg.id_by_name("grass"), Some(2));
    let torch = reg.get(reg.id_by_name("torch").unwrap());
    assert!(torch.light_emitter);
    assert_eq!(torch.emission, Emission::new(15, 11, 6));
    let grass = reg.get(2);
    assert_ne!(grass.textures.top, grass.textures.side);
}

#[test]
fn out_of_range_emission_rejected() {
    let err = BlockRegistry::from_toml_str(
        r#"
        [[blocks]]
        name = "nova"
        emission = [16, 0, 0]
    "#,
    );
    assert!(err.is_err());
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}".prop_filter("air is reserved", |s| s != "air")
}

proptest! {
    // Ids are dense, stable, and resolvable by name
    #[test]
    fn ids_dense_and_resolvable(names in prop::collection::hash_set(name_strategy(), 1..20)) {
        let mut reg = BlockRegistry::new();
        let mut ids = Vec::new();
        for name in &names {
            let id = reg.register(name, FaceTextures::default(), Emission::NONE).unwrap();
            ids.push((name.clone(), id));
        }
        prop_assert_eq!(reg.len(), names.len() + 1);
        for (name, id) in ids {
            prop_assert_eq!(reg.id_by_name(&name), Some(id));
            prop_assert_eq!(reg.get(id).name.as_str(), name.as_str());
        }
    }

    // Emitter flag mirrors the emission channels
    #[test]
    fn emitter_flag_tracks_emission(r in 0u8..=15, g in 0u8..=15, b in 0u8..=15) {
        let mut reg = BlockRegistry::new();
        let id = reg.register("probe", FaceTextures::default(), Emission::new(r, g, b)).unwrap();
        prop_assert_eq!(reg.is_emitter(id), r != 0 || g != 0 || b != 0);
    }
}
