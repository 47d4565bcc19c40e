//! CLI for building asset artifacts and querying them.

use clap::{Parser, Subcommand, ValueEnum};
use mc_assets::assets::loader::{build_blockstates_models, build_item_definitions, BuildOptions, DataDir};
use mc_assets::atlas::{
    build_atlases, clean_name, AtlasFamily, AtlasOrder, AtlasPacker, AtlasParser, CustomImage, ImageType,
    MakeAtlasOptions, PackerConfig, TextureSource,
};
use mc_assets::items::{ItemPropertyValue, ItemSelector};
use mc_assets::{get_item_definition, load_asset_stores, load_item_definitions, QueriedBlock, WorldBlockProvider};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mc-assets")]
#[command(author, version, about = "Build and query versioned Minecraft assets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build blockStatesModels.json, itemDefinitions.json and atlases from a data directory
    BuildAssets {
        /// Data directory containing data-paths.json
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "dist")]
        output: PathBuf,

        /// Oldest version to include
        #[arg(long, default_value = "1.13")]
        version_clip: String,

        /// Skip the atlas pass
        #[arg(long)]
        no_atlases: bool,
    },

    /// Pack a directory of PNG files into one atlas
    Pack {
        /// Directory of textures (searched recursively)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file stem; writes <stem>.json and <stem>.png
        #[arg(short, long)]
        output: PathBuf,

        /// Tile size in pixels
        #[arg(long, default_value_t = 16)]
        tile_size: u32,
    },

    /// Resolve the models of a block state
    Block {
        /// Block name (e.g., "oak_stairs" or "minecraft:oak_stairs")
        #[arg(short, long)]
        block: String,

        /// Block properties (e.g., "facing=east")
        #[arg(short, long, value_parser = parse_property)]
        property: Vec<(String, String)>,

        /// Game version
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Path to blockStatesModels.json
        #[arg(long, default_value = "dist/blockStatesModels.json")]
        models: PathBuf,

        /// Map faces into this atlas (path to <name>Atlases.json)
        #[arg(long)]
        atlas: Option<PathBuf>,

        /// Use the first variant when no state matches
        #[arg(long)]
        fallback: bool,
    },

    /// Evaluate an item definition
    Item {
        /// Item name (e.g., "bow")
        #[arg(short, long)]
        item: String,

        /// Item properties (e.g., "minecraft:using_item=true")
        #[arg(short, long, value_parser = parse_property)]
        property: Vec<(String, String)>,

        /// Game version
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Path to itemDefinitions.json
        #[arg(long, default_value = "dist/itemDefinitions.json")]
        definitions: PathBuf,
    },

    /// Look up a texture in an atlas
    Texture {
        /// Texture name (e.g., "stone")
        #[arg(short, long)]
        name: String,

        /// Game version
        #[arg(short, long, default_value = "latest")]
        version: String,

        /// Path to <name>Atlases.json
        #[arg(short, long)]
        atlas: PathBuf,
    },

    /// Repack the textures of one version into a new atlas
    VersionAtlas {
        /// Path to <name>Atlases.json
        #[arg(short, long)]
        atlas: PathBuf,

        /// Game version
        #[arg(short, long)]
        version: String,

        /// Output file stem; writes <stem>.json and <stem>.png
        #[arg(short, long)]
        output: PathBuf,

        /// Texture order
        #[arg(long, value_enum, default_value_t = OrderArg::Latest)]
        order: OrderArg,

        /// Tile size of the new atlas
        #[arg(long)]
        tile_size: Option<u32>,
    },

    /// Render an atlas with every entry outlined
    DebugAtlas {
        /// Path to <name>Atlases.json
        #[arg(short, long)]
        atlas: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Draw the legacy atlas instead of the latest one
        #[arg(long)]
        legacy: bool,

        /// Scale factor
        #[arg(long, default_value_t = 4)]
        scale: u32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Latest atlas order
    Latest,
    /// Sorted by name
    Sorted,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid property format: '{}'. Use key=value", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildAssets {
            data,
            output,
            version_clip,
            no_atlases,
        } => build(&data, &output, version_clip, !no_atlases)?,
        Commands::Pack {
            input,
            output,
            tile_size,
        } => pack_directory(&input, &output, tile_size)?,
        Commands::Block {
            block,
            property,
            version,
            models,
            atlas,
            fallback,
        } => resolve_block(&block, property, &version, &models, atlas.as_deref(), fallback)?,
        Commands::Item {
            item,
            property,
            version,
            definitions,
        } => resolve_item(&item, property, &version, &definitions)?,
        Commands::Texture { name, version, atlas } => {
            let parser = load_atlas(&atlas)?;
            match parser.get_texture_info(&name, &version) {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => println!("Texture {} not found for version {}", name, version),
            }
        }
        Commands::VersionAtlas {
            atlas,
            version,
            output,
            order,
            tile_size,
        } => {
            let parser = load_atlas(&atlas)?;
            let options = MakeAtlasOptions {
                tile_size,
                order: match order {
                    OrderArg::Latest => AtlasOrder::Latest,
                    OrderArg::Sorted => AtlasOrder::Sorted,
                },
                extra_names: Vec::new(),
            };
            let new_atlas = parser.make_new_atlas(&version, |_| CustomImage::Default, &options)?;
            write_atlas(&output, &serde_json::to_string_pretty(&new_atlas.atlas)?, &new_atlas.to_png()?)?;
        }
        Commands::DebugAtlas {
            atlas,
            output,
            legacy,
            scale,
        } => {
            let parser = load_atlas(&atlas)?;
            let image_type = if legacy { ImageType::Legacy } else { ImageType::Latest };
            let Some(image) = parser.debug_image(image_type, scale) else {
                return Err(format!("{:?} has no {:?} atlas image", atlas, image_type).into());
            };
            image.save(&output)?;
            println!("Wrote {:?}", output);
        }
    }

    Ok(())
}

fn build(data: &Path, output: &Path, version_clip: String, atlases: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = DataDir::open(data)?;
    fs::create_dir_all(output)?;

    let models = build_blockstates_models(&dir, &BuildOptions { version_clip })?;
    fs::write(output.join("blockStatesModels.json"), models.to_json_string()?)?;
    println!("Wrote blockStatesModels.json ({} versions)", models.blockstates.len());

    let items = build_item_definitions(&dir)?;
    fs::write(output.join("itemDefinitions.json"), serde_json::to_string_pretty(&items)?)?;
    println!("Wrote itemDefinitions.json ({} versions)", items.len());

    if atlases {
        for family in [AtlasFamily::blocks(), AtlasFamily::items(), AtlasFamily::particles()] {
            let built = build_atlases(&dir, &family, &PackerConfig::default())?;
            built.write(output, &family.name)?;
            println!(
                "Wrote {} atlas: {} latest, {} legacy textures",
                family.name,
                built.json.latest.textures.len(),
                built.json.legacy.as_ref().map_or(0, |legacy| legacy.textures.len())
            );
        }
    }
    Ok(())
}

fn collect_pngs(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> std::io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|entry| entry.path());
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_pngs(root, &path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "png") {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let name = relative.to_string_lossy().replace('\\', "/");
            out.push((clean_name(&name).to_string(), path));
        }
    }
    Ok(())
}

fn pack_directory(input: &Path, output: &Path, tile_size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    collect_pngs(input, input, &mut files)?;
    println!("Packing {} textures from {:?}...", files.len(), input);

    let mut packer = AtlasPacker::new(PackerConfig::default().with_tile_size(tile_size));
    for (name, path) in files {
        packer.add_texture(name, TextureSource::from_bytes(fs::read(path)?));
    }
    let packed = packer.pack()?;
    println!("  Atlas: {}x{}", packed.json.width, packed.json.height);
    write_atlas(output, &serde_json::to_string_pretty(&packed.json)?, &packed.to_png()?)
}

fn write_atlas(stem: &Path, json: &str, png: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let json_path = stem.with_extension("json");
    let png_path = stem.with_extension("png");
    fs::write(&json_path, json)?;
    fs::write(&png_path, png)?;
    println!("Wrote {:?} and {:?}", json_path, png_path);
    Ok(())
}

/// Load `<name>Atlases.json` with the `<name>AtlasLatest.png` and
/// `<name>AtlasLegacy.png` images next to it, when present.
fn load_atlas(json: &Path) -> Result<AtlasParser, Box<dyn std::error::Error>> {
    let file_name = json.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = file_name.strip_suffix("Atlases.json").unwrap_or(file_name);
    let latest = json.with_file_name(format!("{}AtlasLatest.png", stem));
    let legacy = json.with_file_name(format!("{}AtlasLegacy.png", stem));

    if !latest.exists() {
        let atlases = mc_assets::AtlasesJson::from_json_str(&fs::read_to_string(json)?)?;
        return Ok(AtlasParser::new(atlases));
    }
    let legacy = legacy.exists().then_some(legacy);
    Ok(AtlasParser::load(json.to_path_buf(), latest, legacy)?)
}

fn resolve_block(
    block_name: &str,
    properties: Vec<(String, String)>,
    version: &str,
    models: &Path,
    atlas: Option<&Path>,
    fallback: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = load_asset_stores(models)?;

    let mut block = QueriedBlock::new(block_name);
    for (key, value) in properties {
        block = block.with_property(key, value);
    }

    match atlas {
        Some(atlas) => {
            let parser = load_atlas(atlas)?;
            let mut provider = WorldBlockProvider::new(version, &stores, &parser);
            let models = provider.get_all_resolved_models(&block, fallback)?;
            println!("{}", serde_json::to_string_pretty(&models)?);
            for issue in provider.issues() {
                eprintln!("warning: {}", issue);
            }
        }
        None => {
            let mut resolver = mc_assets::BlockResolver::new(version, &stores);
            let models = resolver.all_resolved_models(&block, fallback);
            println!("{}", serde_json::to_string_pretty(&models)?);
            for issue in resolver.issues() {
                eprintln!("warning: {}", issue);
            }
        }
    }
    Ok(())
}

/// `true`, `3` and `2024-12-25` parse as typed values, anything else as text.
fn parse_item_value(value: &str) -> ItemPropertyValue {
    serde_json::from_str(value)
        .or_else(|_| serde_json::from_value(serde_json::Value::String(value.to_string())))
        .unwrap_or_else(|_| ItemPropertyValue::from(value))
}

fn resolve_item(
    item: &str,
    properties: Vec<(String, String)>,
    version: &str,
    definitions: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_item_definitions(definitions)?;
    let mut selector = ItemSelector::new(version, item);
    for (key, value) in properties {
        selector = selector.with_property(key, parse_item_value(&value));
    }

    match get_item_definition(&store, &selector) {
        Some(resolved) => println!("{}", serde_json::to_string_pretty(&resolved)?),
        None => println!("No item definition for {} in version {}", item, version),
    }
    Ok(())
}
