use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::BlocksConfig;
use crate::types::{BlockDef, BlockId, Emission, FaceTextures, AIR};

/// Maps block ids to definitions and names to ids.
///
/// Id 0 is air and exists in every registry; all other ids are assigned
/// densely in registration order.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<BlockDef>,
    by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        let air = BlockDef::air();
        let mut by_name = HashMap::new();
        by_name.insert(air.name.clone(), AIR);
        Self {
            blocks: vec![air],
            by_name,
        }
    }

    /// Registers a block and returns its id. Re-registering an existing name
    /// replaces the definition in place and keeps its id stable.
    pub fn register(
        &mut self,
        name: &str,
        textures: FaceTextures,
        emission: Emission,
    ) -> Result<BlockId, Box<dyn Error>> {
        if name == "air" {
            return Err("block id 0 is reserved for air and cannot be redefined".into());
        }
        if emission.r > 15 || emission.g > 15 || emission.b > 15 {
            return Err(format!(
                "emission out of range for block '{}': channels must be 0..=15",
                name
            )
            .into());
        }
        let light_emitter = !emission.is_dark();
        if let Some(&id) = self.by_name.get(name) {
            self.blocks[id as usize] = BlockDef {
                id,
                name: name.to_string(),
                textures,
                light_emitter,
                emission,
            };
            return Ok(id);
        }
        let id = self.blocks.len() as BlockId;
        self.blocks.push(BlockDef {
            id,
            name: name.to_string(),
            textures,
            light_emitter,
            emission,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up a definition by id. An unknown id is a programmer error: the
    /// store never writes ids that were not registered.
    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockDef {
        match self.blocks.get(id as usize) {
            Some(def) => def,
            None => panic!("invalid block id {} (registry has {})", id, self.blocks.len()),
        }
    }

    #[inline]
    pub fn try_get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id as usize)
    }

    #[inline]
    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn is_emitter(&self, id: BlockId) -> bool {
        self.get(id).light_emitter
    }

    /// Number of definitions including air.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = Self::new();
        for entry in cfg.blocks {
            let textures = entry.textures();
            let emission = entry.emission();
            reg.register(&entry.name, textures, emission)?;
        }
        Ok(reg)
    }
}
