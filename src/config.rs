//! Tiling configuration.
//!
//! A [`TilingConfig`] is an immutable value threaded through
//! [`SpatialTree::build`](crate::tree::SpatialTree::build) and
//! [`TileExporter`](crate::export::TileExporter). It can be written by hand
//! or loaded from JSON; missing keys take their defaults:
//!
//! ```json
//! { "tileLevelCount": 4, "minBucketSize": 8, "paddingPolicy": "elide" }
//! ```

use crate::errors::TileError;
use crate::float_types::Real;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What depth-padding wrappers export.
///
/// A tree that bottoms out early is wrapped in single-child parents until it
/// reaches the configured level count. Those wrappers own no meshes of
/// their own; this decides whether they still get a tile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaddingPolicy {
    /// Wrappers export their descendants' geometry, decimated for their own level.
    #[default]
    Reexport,
    /// Wrappers get a descriptor entry with bounds and children but no content.
    Elide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TilingConfig {
    /// Number of LOD levels; the finalized tree has depth `tile_level_count - 1`.
    pub tile_level_count: usize,
    /// Hard cap on bisection depth.
    pub max_tree_depth: usize,
    /// Nodes holding fewer meshes than this are not split further.
    pub min_bucket_size: usize,
    /// Meshes with fewer faces than this are never decimated.
    pub min_face_num_for_decimation: usize,
    /// Face-count ratio per level, root first. `None` halves per level
    /// above the finest one.
    pub level_ratios: Option<Vec<Real>>,
    pub padding_policy: PaddingPolicy,
}

impl Default for TilingConfig {
    fn default() -> Self {
        TilingConfig {
            tile_level_count: 3,
            max_tree_depth: 10,
            min_bucket_size: 4,
            min_face_num_for_decimation: 10,
            level_ratios: None,
            padding_policy: PaddingPolicy::Reexport,
        }
    }
}

impl TilingConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TileError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, TileError> {
        let config: TilingConfig = serde_json::from_str(text)
            .map_err(|e| TileError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TileError> {
        if self.tile_level_count == 0 {
            return Err(TileError::InvalidConfig(
                "tileLevelCount must be at least 1".into(),
            ));
        }
        if self.min_bucket_size < 2 {
            return Err(TileError::InvalidConfig(format!(
                "minBucketSize must be at least 2, got {}",
                self.min_bucket_size
            )));
        }
        if let Some(ratios) = &self.level_ratios {
            LevelMap::from_ratios(ratios.clone(), self.tile_level_count)?;
        }
        Ok(())
    }

    /// Bisection stops at this depth.
    ///
    /// Never deeper than `tile_level_count - 1`, so depth padding alone
    /// brings every tree to exactly the configured level count.
    pub fn effective_max_depth(&self) -> usize {
        self.max_tree_depth
            .min(self.tile_level_count.saturating_sub(1))
    }

    pub fn level_map(&self) -> Result<LevelMap, TileError> {
        match &self.level_ratios {
            Some(ratios) => LevelMap::from_ratios(ratios.clone(), self.tile_level_count),
            None => Ok(LevelMap::halving(self.tile_level_count)),
        }
    }
}

/// Tree depth → fraction of faces kept. Root (level 0) is the coarsest.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMap {
    ratios: Vec<Real>,
}

impl LevelMap {
    /// The finest level keeps everything, each shallower level half as much.
    pub fn halving(level_count: usize) -> Self {
        let level_count = level_count.max(1);
        let ratios = (0..level_count)
            .map(|level| (0.5 as Real).powi((level_count - 1 - level) as i32))
            .collect();
        LevelMap { ratios }
    }

    /// Explicit ratios, one per level. Each must be in `(0, 1]` and they
    /// must not decrease with depth.
    pub fn from_ratios(ratios: Vec<Real>, level_count: usize) -> Result<Self, TileError> {
        if ratios.len() != level_count {
            return Err(TileError::InvalidConfig(format!(
                "{} level ratios for {} levels",
                ratios.len(),
                level_count
            )));
        }
        if let Some(bad) = ratios.iter().find(|r| !(**r > 0.0 && **r <= 1.0)) {
            return Err(TileError::InvalidConfig(format!(
                "level ratio {bad} is outside (0, 1]"
            )));
        }
        if ratios.windows(2).any(|w| w[0] > w[1]) {
            return Err(TileError::InvalidConfig(
                "level ratios must not decrease from root to leaves".into(),
            ));
        }
        Ok(LevelMap { ratios })
    }

    /// Ratio for `level`; levels past the last reuse the finest ratio.
    pub fn ratio(&self, level: usize) -> Real {
        self.ratios[level.min(self.ratios.len() - 1)]
    }

    pub fn level_count(&self) -> usize {
        self.ratios.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halving_map_is_coarsest_at_root() {
        let map = LevelMap::halving(3);
        assert_eq!(map.ratio(0), 0.25);
        assert_eq!(map.ratio(1), 0.5);
        assert_eq!(map.ratio(2), 1.0);
        assert_eq!(map.ratio(7), 1.0);
    }

    #[test]
    fn effective_depth_is_capped_by_level_count() {
        let config = TilingConfig {
            tile_level_count: 3,
            max_tree_depth: 10,
            ..Default::default()
        };
        assert_eq!(config.effective_max_depth(), 2);

        let config = TilingConfig {
            tile_level_count: 8,
            max_tree_depth: 4,
            ..Default::default()
        };
        assert_eq!(config.effective_max_depth(), 4);
    }

    #[test]
    fn json_defaults_fill_missing_keys() {
        let config =
            TilingConfig::from_json_str(r#"{ "tileLevelCount": 5, "paddingPolicy": "elide" }"#)
                .unwrap();
        assert_eq!(config.tile_level_count, 5);
        assert_eq!(config.padding_policy, PaddingPolicy::Elide);
        assert_eq!(config.min_bucket_size, TilingConfig::default().min_bucket_size);
    }

    #[test]
    fn rejects_decreasing_ratios() {
        let err = TilingConfig::from_json_str(
            r#"{ "tileLevelCount": 3, "levelRatios": [0.5, 0.25, 1.0] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TileError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_levels_and_tiny_buckets() {
        let zero = TilingConfig {
            tile_level_count: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let tiny = TilingConfig {
            min_bucket_size: 1,
            ..Default::default()
        };
        assert!(tiny.validate().is_err());
    }
}
