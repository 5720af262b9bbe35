//! Object selection and physics-settled placement.

use crate::{
    backend::{ObjectHandle, RenderBackend, RigidBodyKind},
    common::*,
    config::PhysicsConfig,
    random::sample_range,
};

/// Drop positions are sampled on a [-2, 2] x [-2, 2] patch above the plane.
const DROP_PATCH_HALF: f64 = 2.0;
const DROP_HEIGHT_RANGE: (f64, f64) = (0.5, 2.0);
const OBJECT_MASS: f64 = 1.0;

/// Ordered set of discovered class names. The index of a name is its class
/// ID; appends are append-if-absent, so IDs are stable once assigned.
///
/// Classes are registered in discovery order over random model selection,
/// which makes the list seed-dependent unless every class is seeded up
/// front via the config's `class_names`.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    names: IndexSet<String>,
}

impl ClassRegistry {
    pub fn new<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            names: seed.into_iter().collect(),
        }
    }

    /// Return the class ID for a name, appending it when unseen.
    pub fn get_or_insert(&mut self, name: &str) -> usize {
        match self.names.get_index_of(name) {
            Some(index) => index,
            None => {
                let (index, _) = self.names.insert_full(name.to_owned());
                debug!("added new class: {}", name);
                index
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the newline-delimited class list, index order preserved.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text: String = self.names.iter().map(|name| format!("{}\n", name)).collect();
        fs::write(path, text)
            .with_context(|| format!("failed to write class list '{}'", path.display()))?;
        Ok(())
    }
}

/// An object standing in the scene after physics settling.
#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub handle: ObjectHandle,
    pub class_id: usize,
    pub model_path: PathBuf,
}

/// Places a random selection of models into the scene and settles them with
/// the rigid-body simulation.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    max_objects_per_scene: usize,
    object_scale_range: (R64, R64),
    physics: PhysicsConfig,
}

impl PlacementEngine {
    pub fn new(
        max_objects_per_scene: usize,
        object_scale_range: (R64, R64),
        physics: PhysicsConfig,
    ) -> Self {
        Self {
            max_objects_per_scene,
            object_scale_range,
            physics,
        }
    }

    /// Drop between 1 and `max_objects_per_scene` objects and run the
    /// simulation to rest. Unloadable assets are skipped without counting
    /// toward the placed total; the returned list may be empty.
    pub fn place_objects<B>(
        &self,
        backend: &mut B,
        models: &[PathBuf],
        classes: &mut ClassRegistry,
        rng: &mut StdRng,
    ) -> Vec<PlacedObject>
    where
        B: RenderBackend,
    {
        let num_objects = rng.gen_range(1..=self.max_objects_per_scene);
        let mut placed = vec![];

        for _ in 0..num_objects {
            let model_path = &models[rng.gen_range(0..models.len())];
            // register before the load attempt; a failing asset still claims
            // its class slot, keeping IDs stable across repeated runs
            let class_id = classes.get_or_insert(&class_name_of(model_path));

            let scale = sample_range(rng, self.object_scale_range);
            let x = rng.gen_range(-DROP_PATCH_HALF..=DROP_PATCH_HALF);
            let y = rng.gen_range(-DROP_PATCH_HALF..=DROP_PATCH_HALF);
            let height = rng.gen_range(DROP_HEIGHT_RANGE.0..=DROP_HEIGHT_RANGE.1);

            let handle = match backend.load_model(model_path, scale, DVec3::new(x, y, height)) {
                Some(handle) => handle,
                None => {
                    warn!("skipping unloadable model '{}'", model_path.display());
                    continue;
                }
            };
            backend.apply_rigid_body(
                handle,
                RigidBodyKind::Active,
                OBJECT_MASS,
                self.physics.friction.raw(),
                self.physics.restitution.raw(),
            );

            placed.push(PlacedObject {
                handle,
                class_id,
                model_path: model_path.clone(),
            });
        }

        backend.step_physics(1, 1 + self.physics.simulation_steps);
        placed
    }
}

/// Class name of a model file, taken from its containing directory.
fn class_name_of(path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use std::io::Write as _;

    fn write_model(dir: &Path, class: &str, name: &str) -> Result<PathBuf> {
        let class_dir = dir.join(class);
        fs::create_dir_all(&class_dir)?;
        let path = class_dir.join(name);
        writeln!(fs::File::create(&path)?, "proxy")?;
        Ok(path)
    }

    #[test]
    fn registry_appends_if_absent() {
        let mut registry = ClassRegistry::default();
        assert_eq!(registry.get_or_insert("ulus"), 0);
        assert_eq!(registry.get_or_insert("harpoons"), 1);
        assert_eq!(registry.get_or_insert("ulus"), 0);
        assert_eq!(registry.to_vec(), vec!["ulus", "harpoons"]);
    }

    #[test]
    fn seeded_names_pin_their_ids() {
        let mut registry = ClassRegistry::new(["masks".to_owned(), "ulus".to_owned()]);
        assert_eq!(registry.get_or_insert("ulus"), 1);
        assert_eq!(registry.get_or_insert("dolls"), 2);
    }

    #[test]
    fn places_between_one_and_max_objects() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let models = vec![
            write_model(dir.path(), "ulus", "a.glb")?,
            write_model(dir.path(), "harpoons", "b.glb")?,
        ];

        let engine = PlacementEngine::new(3, (r64(0.8), r64(1.2)), PhysicsConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut registry = ClassRegistry::default();

        for _ in 0..16 {
            let mut backend = HeadlessBackend::new();
            backend.add_plane(10.0, DVec3::ZERO);
            let placed = engine.place_objects(&mut backend, &models, &mut registry, &mut rng);
            assert!((1..=3).contains(&placed.len()));
            for obj in &placed {
                assert!(obj.class_id < registry.len());
            }
        }
        Ok(())
    }

    #[test]
    fn unloadable_assets_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let class_dir = dir.path().join("broken");
        fs::create_dir_all(&class_dir)?;
        let path = class_dir.join("corrupt.glb");
        fs::File::create(&path)?;

        let engine = PlacementEngine::new(3, (r64(0.8), r64(1.2)), PhysicsConfig::default());
        let mut rng = StdRng::seed_from_u64(2);
        let mut registry = ClassRegistry::default();
        let mut backend = HeadlessBackend::new();

        let placed = engine.place_objects(&mut backend, &[path], &mut registry, &mut rng);
        assert!(placed.is_empty());
        // the failing asset still registered its class
        assert_eq!(registry.to_vec(), vec!["broken"]);
        Ok(())
    }

    #[test]
    fn identical_seeds_place_identical_scenes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let models = vec![
            write_model(dir.path(), "ulus", "a.glb")?,
            write_model(dir.path(), "harpoons", "b.glb")?,
            write_model(dir.path(), "masks", "c.glb")?,
        ];
        let engine = PlacementEngine::new(3, (r64(0.8), r64(1.2)), PhysicsConfig::default());

        let run = || -> (Vec<usize>, Vec<String>) {
            let mut rng = StdRng::seed_from_u64(99);
            let mut registry = ClassRegistry::default();
            let counts: Vec<usize> = (0..8)
                .map(|_| {
                    let mut backend = HeadlessBackend::new();
                    backend.add_plane(10.0, DVec3::ZERO);
                    engine
                        .place_objects(&mut backend, &models, &mut registry, &mut rng)
                        .len()
                })
                .collect();
            (counts, registry.to_vec())
        };

        assert_eq!(run(), run());
        Ok(())
    }
}
