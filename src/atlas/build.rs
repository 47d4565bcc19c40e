//! Atlas build pass over a data directory's `textures/` index.

use super::builder::{AtlasPacker, PackedAtlas, PackerConfig, TextureSource};
use super::canvas;
use super::json::AtlasesJson;
use crate::assets::loader::DataDir;
use crate::error::Result;
use crate::store::LATEST;
use image::RgbaImage;
use std::path::Path;

const TEXTURES_KEY: &str = "textures/";

/// A group of textures sharing one atlas pair, selected by path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasFamily {
    /// Output file stem, e.g. `blocks` for `blocksAtlases.json`.
    pub name: String,
    /// Texture key prefixes, stripped from atlas names. The first match wins.
    pub prefixes: Vec<String>,
}

impl AtlasFamily {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefixes: vec![prefix.into()],
        }
    }

    /// Also accept keys under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn blocks() -> Self {
        Self::new("blocks", "blocks/")
    }

    /// Item textures live under `items/` before 1.13 and `item/` after.
    pub fn items() -> Self {
        Self::new("items", "items/").with_prefix("item/")
    }

    pub fn particles() -> Self {
        Self::new("particles", "particle/")
    }

    /// Atlas name of a texture key, if the key belongs to this family.
    fn name_of<'a>(&self, key: &'a str) -> Option<&'a str> {
        if !key.ends_with(".png") {
            return None;
        }
        self.prefixes
            .iter()
            .find_map(|prefix| key.strip_prefix(prefix.as_str()))
    }
}

/// Output of one family's build pass.
#[derive(Debug, Clone)]
pub struct BuiltAtlases {
    pub json: AtlasesJson,
    pub latest_image: RgbaImage,
    pub legacy_image: Option<RgbaImage>,
}

impl BuiltAtlases {
    /// Write `<name>Atlases.json`, `<name>AtlasLatest.png` and, when
    /// present, `<name>AtlasLegacy.png` into `out_dir`.
    pub fn write<P: AsRef<Path>>(&self, out_dir: P, name: &str) -> Result<()> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;
        std::fs::write(
            out_dir.join(format!("{}Atlases.json", name)),
            serde_json::to_string_pretty(&self.json)?,
        )?;
        std::fs::write(
            out_dir.join(format!("{}AtlasLatest.png", name)),
            canvas::encode_png(&self.latest_image)?,
        )?;
        if let Some(legacy) = &self.legacy_image {
            std::fs::write(
                out_dir.join(format!("{}AtlasLegacy.png", name)),
                canvas::encode_png(legacy)?,
            )?;
        }
        Ok(())
    }
}

fn pack_files<'a>(
    dir: &DataDir,
    config: &PackerConfig,
    files: impl IntoIterator<Item = (String, &'a String)>,
) -> Result<PackedAtlas> {
    let mut packer = AtlasPacker::new(config.clone());
    for (name, path) in files {
        packer.add_texture(name, TextureSource::from_bytes(dir.read_bytes(path)?));
    }
    packer.pack()
}

/// Pack the latest textures of `family` and every older version's changed
/// textures, the latter keyed `"<version>/<name>"`.
pub fn build_atlases(dir: &DataDir, family: &AtlasFamily, config: &PackerConfig) -> Result<BuiltAtlases> {
    let latest_files: Vec<(String, &String)> = dir
        .files(LATEST, TEXTURES_KEY)
        .into_iter()
        .flatten()
        .filter_map(|(key, path)| family.name_of(key).map(|name| (name.to_string(), path)))
        .collect();

    let mut legacy_files: Vec<(String, &String)> = Vec::new();
    for version in dir.paths().keys().filter(|v| v.as_str() != LATEST) {
        let Some(files) = dir.files(version, TEXTURES_KEY) else {
            continue;
        };
        for (key, path) in files {
            if let Some(name) = family.name_of(key) {
                legacy_files.push((format!("{}/{}", version, name), path));
            }
        }
    }

    log::info!(
        "Packing {} atlas: {} latest, {} legacy textures",
        family.name,
        latest_files.len(),
        legacy_files.len()
    );

    let latest = pack_files(dir, config, latest_files)?;
    let legacy = if legacy_files.is_empty() {
        None
    } else {
        Some(pack_files(dir, config, legacy_files)?)
    };

    Ok(BuiltAtlases {
        json: AtlasesJson {
            latest: latest.json,
            legacy: legacy.as_ref().map(|l| l.json.clone()),
        },
        latest_image: latest.image,
        legacy_image: legacy.map(|l| l.image),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasParser, ImageType};
    use image::Rgba;
    use std::fs;

    fn write_png(root: &Path, relative: &str, color: [u8; 4]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let image = RgbaImage::from_pixel(16, 16, Rgba(color));
        fs::write(path, canvas::encode_png(&image).unwrap()).unwrap();
    }

    #[test]
    fn test_build_blocks_atlases() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("data-paths.json"),
            r#"{
                "1.13": { "textures/": { "blocks/stone.png": "1.13/stone.png" } },
                "latest": { "textures/": {
                    "blocks/stone.png": "latest/stone.png",
                    "blocks/dirt.png": "latest/dirt.png",
                    "blocks/dirt.png.mcmeta": "latest/dirt.png.mcmeta",
                    "particle/flame.png": "latest/flame.png"
                } }
            }"#,
        )
        .unwrap();
        write_png(root, "1.13/stone.png", [0, 0, 255, 255]);
        write_png(root, "latest/stone.png", [255, 0, 0, 255]);
        write_png(root, "latest/dirt.png", [0, 255, 0, 255]);

        let data = DataDir::open(root).unwrap();
        let built = build_atlases(&data, &AtlasFamily::blocks(), &PackerConfig::default()).unwrap();

        let names: Vec<&str> = built.json.latest.textures.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["stone", "dirt"]);
        let legacy = built.json.legacy.as_ref().unwrap();
        assert!(legacy.textures.contains_key("1.13/stone"));

        let out = tempfile::tempdir().unwrap();
        built.write(out.path(), "blocks").unwrap();
        assert!(out.path().join("blocksAtlases.json").exists());
        assert!(out.path().join("blocksAtlasLegacy.png").exists());

        let parser = AtlasParser::load(
            out.path().join("blocksAtlases.json"),
            out.path().join("blocksAtlasLatest.png"),
            Some(out.path().join("blocksAtlasLegacy.png")),
        )
        .unwrap();
        let info = parser.get_texture_info("stone", "1.12").unwrap();
        assert_eq!(info.image_type, ImageType::Legacy);
        assert_eq!(
            parser.texture_image("stone", "1.12").unwrap().get_pixel(0, 0),
            &Rgba([0, 0, 255, 255])
        );
    }

    #[test]
    fn test_build_items_atlases_accepts_both_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("data-paths.json"),
            r#"{
                "1.12": { "textures/": { "items/stick.png": "1.12/stick.png" } },
                "latest": { "textures/": {
                    "item/stick.png": "latest/stick.png",
                    "items/apple.png": "latest/apple.png",
                    "itemframe/back.png": "latest/back.png",
                    "blocks/stone.png": "latest/stone.png"
                } }
            }"#,
        )
        .unwrap();
        write_png(root, "1.12/stick.png", [0, 0, 255, 255]);
        write_png(root, "latest/stick.png", [255, 0, 0, 255]);
        write_png(root, "latest/apple.png", [0, 255, 0, 255]);

        let data = DataDir::open(root).unwrap();
        let built = build_atlases(&data, &AtlasFamily::items(), &PackerConfig::default()).unwrap();

        let names: Vec<&str> = built.json.latest.textures.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["stick", "apple"]);
        let legacy = built.json.legacy.as_ref().unwrap();
        assert!(legacy.textures.contains_key("1.12/stick"));
    }

    #[test]
    fn test_family_prefixes() {
        let items = AtlasFamily::items();
        assert_eq!(items.name_of("item/bow.png"), Some("bow.png"));
        assert_eq!(items.name_of("items/bow.png"), Some("bow.png"));
        assert_eq!(items.name_of("item/bow.png.mcmeta"), None);
        assert_eq!(AtlasFamily::blocks().name_of("item/bow.png"), None);
    }
}
