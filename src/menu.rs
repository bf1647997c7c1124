use argp::FromArgs;

/// Top-level command.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(description = "Synthesizes labeled, deterministic firmware images for ISA-detection ML training.")]
pub struct FirmwareGen {
    #[argp(option, short = 'v', global, default = "0")]
    #[argp(
        description = "Logging level (0 = Off, 1 = Error, 2 = Warn, 3 = Info, 4 = Debug, 5 = Trace)"
    )]
    pub verbose: usize,

    #[argp(subcommand)]
    pub nested: Command,
}

/// The four phases of the pipeline, each separately invocable.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand)]
#[non_exhaustive]
pub enum Command {
    Generate(GenerateOptions),
    Extract(ExtractOptions),
    Layout(LayoutOptions),
    DryRun(DryRunOptions),
}

/// Runs the full pipeline: extract blobs, build the index, generate layouts, assemble images.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "generate")]
#[argp(description = "Run the full extract + index + layout + assemble pipeline")]
pub struct GenerateOptions {
    #[argp(option, default = "42")]
    #[argp(description = "Master seed for deterministic generation")]
    pub seed: u64,

    #[argp(option, short = 'n', default = "1000")]
    #[argp(description = "Number of firmware images to generate")]
    pub count: u64,

    #[argp(option, default = "4096")]
    #[argp(description = "Minimum image size in bytes")]
    pub min_size: u64,

    #[argp(option, default = "16_777_216")]
    #[argp(description = "Maximum image size in bytes")]
    pub max_size: u64,

    #[argp(option, default = "0.15")]
    #[argp(description = "Probability that an image embeds more than one ISA family")]
    pub multi_isa_probability: f64,

    #[argp(option)]
    #[argp(description = "Restrict generation to these ISA families (repeatable, default: all)")]
    pub families: Vec<String>,

    #[argp(option, default = "20")]
    #[argp(description = "Minimum images per ISA combination")]
    pub images_per_combo: usize,

    #[argp(option, short = 'j', default = "8")]
    #[argp(description = "Number of worker threads for extraction and assembly")]
    pub jobs: usize,

    #[argp(option, default = "String::from(\"oracle/output\")")]
    #[argp(description = "Directory of compiled oracle objects (*.o files)")]
    pub oracle_output: String,

    #[argp(option, default = "String::from(\"objects\")")]
    #[argp(description = "Directory of extracted raw code blobs")]
    pub objects_dir: String,

    #[argp(option, default = "String::from(\"firmware\")")]
    #[argp(description = "Directory to write generated firmware images into")]
    pub firmware_dir: String,
}

/// Extracts raw code blobs from compiled oracle objects without generating any images.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "extract")]
#[argp(description = "Extract raw code blobs from oracle objects")]
pub struct ExtractOptions {
    #[argp(option, default = "String::from(\"oracle/output\")")]
    #[argp(description = "Directory of compiled oracle objects (*.o files)")]
    pub oracle_output: String,

    #[argp(option, default = "String::from(\"objects\")")]
    #[argp(description = "Directory to write extracted raw code blobs into")]
    pub objects_dir: String,

    #[argp(option, short = 'j', default = "8")]
    #[argp(description = "Number of worker threads")]
    pub jobs: usize,

    #[argp(switch)]
    #[argp(description = "Re-extract even if a cached blob is newer than its source object")]
    pub force: bool,
}

/// Generates layouts and assembles images from an existing blob cache, skipping extraction.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "layout")]
#[argp(description = "Generate and assemble images from an existing blob cache")]
pub struct LayoutOptions {
    #[argp(option, default = "42")]
    #[argp(description = "Master seed for deterministic generation")]
    pub seed: u64,

    #[argp(option, short = 'n', default = "1000")]
    #[argp(description = "Number of firmware images to generate")]
    pub count: u64,

    #[argp(option, default = "4096")]
    #[argp(description = "Minimum image size in bytes")]
    pub min_size: u64,

    #[argp(option, default = "16_777_216")]
    #[argp(description = "Maximum image size in bytes")]
    pub max_size: u64,

    #[argp(option, default = "0.15")]
    #[argp(description = "Probability that an image embeds more than one ISA family")]
    pub multi_isa_probability: f64,

    #[argp(option)]
    #[argp(description = "Restrict generation to these ISA families (repeatable, default: all)")]
    pub families: Vec<String>,

    #[argp(option, default = "20")]
    #[argp(description = "Minimum images per ISA combination")]
    pub images_per_combo: usize,

    #[argp(option, short = 'j', default = "8")]
    #[argp(description = "Number of worker threads for assembly")]
    pub jobs: usize,

    #[argp(option, default = "String::from(\"objects\")")]
    #[argp(description = "Directory of extracted raw code blobs")]
    pub objects_dir: String,

    #[argp(option, default = "String::from(\"firmware\")")]
    #[argp(description = "Directory to write generated firmware images into")]
    pub firmware_dir: String,
}

/// Builds layouts and prints their statistics without writing any image to disk.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "dry-run")]
#[argp(description = "Print layout statistics without assembling any images")]
pub struct DryRunOptions {
    #[argp(option, default = "42")]
    #[argp(description = "Master seed for deterministic generation")]
    pub seed: u64,

    #[argp(option, short = 'n', default = "1000")]
    #[argp(description = "Number of firmware images to generate")]
    pub count: u64,

    #[argp(option, default = "4096")]
    #[argp(description = "Minimum image size in bytes")]
    pub min_size: u64,

    #[argp(option, default = "16_777_216")]
    #[argp(description = "Maximum image size in bytes")]
    pub max_size: u64,

    #[argp(option, default = "0.15")]
    #[argp(description = "Probability that an image embeds more than one ISA family")]
    pub multi_isa_probability: f64,

    #[argp(option)]
    #[argp(description = "Restrict generation to these ISA families (repeatable, default: all)")]
    pub families: Vec<String>,

    #[argp(option, default = "20")]
    #[argp(description = "Minimum images per ISA combination")]
    pub images_per_combo: usize,

    #[argp(option, default = "String::from(\"objects\")")]
    #[argp(description = "Directory of extracted raw code blobs")]
    pub objects_dir: String,
}
