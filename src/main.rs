use std::path::PathBuf;

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use slotscope::config::{self, Config};
use slotscope::domain::storage::{
    decode_fields, parse_word, ArrayDescriptor, FieldKind, FieldLayout, LayoutRegistry,
    StorageReader, StorageSlot,
};
use slotscope::infrastructure::ethereum::{
    create_reader, normalize_http_endpoint, Keccak256Hasher, MemoryStorage, ProviderConfig,
};
use slotscope::modules::export::{self, OutputFormat};
use slotscope::modules::inspect::{Inspector, DEFAULT_CONCURRENCY, DEFAULT_MAX_ELEMENTS};
use slotscope::modules::toolkit::{hash, slot};

#[derive(Debug, Parser)]
#[command(
    name = "slotscope",
    version,
    about = "slotscope: decode packed EVM contract storage by declarative layout"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long, global = true)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long, global = true)]
    ipc: Option<PathBuf>,

    /// Config file (defaults to $SLOTSCOPE_CONFIG or ~/.config/slotscope/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute array element or mapping entry slots
    Slot {
        #[command(subcommand)]
        kind: SlotCommand,
    },
    /// Keccak256 of hex bytes or text
    Hash { data: String },
    /// Decode storage words you already have against a layout
    Decode {
        #[arg(long)]
        layout: String,
        /// One 32-byte word per struct slot, in slot order
        #[arg(required = true)]
        words: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Read and decode every element of a dynamic array
    Read(ReadArgs),
    /// Read and decode one struct stored at a fixed slot
    Struct(StructArgs),
    /// List known layouts
    Layouts,
}

#[derive(Debug, Subcommand)]
enum SlotCommand {
    /// keccak256(slot) + index * stride
    Array {
        slot: String,
        #[arg(allow_negative_numbers = true)]
        index: Option<String>,
        #[arg(long, default_value_t = 1)]
        stride: u64,
    },
    /// keccak256(key ++ slot)
    Mapping { slot: String, key: String },
}

#[derive(Debug, ClapArgs)]
struct SourceArgs {
    /// Pin all reads to this block (defaults to the latest block)
    #[arg(long)]
    block: Option<u64>,

    /// Read from a JSON snapshot of slot -> word instead of an RPC endpoint
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write to this file, or a timestamped file if it is a directory
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
struct ReadArgs {
    /// Named array from the config file
    #[arg(long, conflicts_with_all = ["address", "slot"])]
    array: Option<String>,

    /// Contract address
    #[arg(long)]
    address: Option<String>,

    /// Slot holding the array length
    #[arg(long)]
    slot: Option<String>,

    /// Element layout name
    #[arg(long)]
    layout: Option<String>,

    /// Slots per element (defaults to the layout's slot count)
    #[arg(long)]
    stride: Option<u64>,

    /// Refuse arrays longer than this
    #[arg(long, default_value_t = DEFAULT_MAX_ELEMENTS)]
    max_elements: u64,

    /// Elements fetched in parallel
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, ClapArgs)]
struct StructArgs {
    #[arg(long)]
    address: String,

    /// First slot of the struct
    #[arg(long)]
    slot: String,

    #[arg(long)]
    layout: String,

    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config::load(args.config.as_deref());

    let mut registry = LayoutRegistry::with_builtins();
    registry.load_config(&config.layouts);

    let hasher = Keccak256Hasher;

    match &args.command {
        Command::Slot { kind } => {
            let result = match kind {
                SlotCommand::Array {
                    slot: slot_str,
                    index,
                    stride,
                } => slot::array_slot(slot_str, index.as_deref(), *stride, &hasher)?,
                SlotCommand::Mapping { slot: slot_str, key } => {
                    slot::mapping_slot(slot_str, key, &hasher)?
                }
            };
            print!("{result}");
        }
        Command::Hash { data } => {
            print!("{}", hash::keccak(data, &hasher)?);
        }
        Command::Decode {
            layout,
            words,
            format,
        } => {
            let layout = lookup_layout(&registry, layout)?;
            let words = words
                .iter()
                .map(|w| parse_word(w))
                .collect::<Result<Vec<_>, _>>()?;
            let fields = decode_fields(&words, layout)?;
            export::render_decoded(std::io::stdout().lock(), layout.name(), &fields, *format)?;
        }
        Command::Read(read) => run_read(&args, &config, &registry, read, &hasher).await?,
        Command::Struct(target) => run_struct(&args, &config, &registry, target, &hasher).await?,
        Command::Layouts => print_layouts(&registry),
    }

    Ok(())
}

async fn run_read(
    args: &Args,
    config: &Config,
    registry: &LayoutRegistry,
    read: &ReadArgs,
    hasher: &Keccak256Hasher,
) -> Result<()> {
    let named = match read.array.as_deref() {
        Some(name) => Some(
            config
                .array(name)
                .ok_or_else(|| anyhow!("array `{}` is not defined in config", name))?,
        ),
        None => None,
    };

    let address_str = match (named, read.address.as_deref()) {
        (Some(entry), _) => entry.address.as_str(),
        (None, Some(address)) => address,
        (None, None) => return Err(anyhow!("--address or --array is required")),
    };
    let address = parse_address(address_str)?;

    let declared_slot: StorageSlot = match (named, read.slot.as_deref()) {
        (Some(entry), _) => entry.slot,
        (None, Some(slot)) => slot.parse()?,
        (None, None) => return Err(anyhow!("--slot is required: give the slot holding the array length")),
    };

    let layout_name = read
        .layout
        .as_deref()
        .or(named.map(|entry| entry.layout.as_str()))
        .ok_or_else(|| anyhow!("--layout is required"))?;
    let layout = lookup_layout(registry, layout_name)?;

    let stride = read.stride.or(named.and_then(|entry| entry.stride));
    let descriptor = match stride {
        Some(stride) => ArrayDescriptor::with_stride(declared_slot, stride, layout)?,
        None => ArrayDescriptor::new(declared_slot, layout),
    };

    let reader = open_reader(args, config, &read.source).await?;
    let snapshot = Inspector::new(reader.as_ref(), hasher)
        .max_elements(read.max_elements)
        .concurrency(read.concurrency)
        .read_array(address, &descriptor, layout, read.source.block)
        .await?;

    export::export_array(&snapshot, read.output.format, read.output.out.as_deref())?;
    Ok(())
}

async fn run_struct(
    args: &Args,
    config: &Config,
    registry: &LayoutRegistry,
    target: &StructArgs,
    hasher: &Keccak256Hasher,
) -> Result<()> {
    let address = parse_address(&target.address)?;
    let slot: StorageSlot = target.slot.parse()?;
    let layout = lookup_layout(registry, &target.layout)?;

    let reader = open_reader(args, config, &target.source).await?;
    let snapshot = Inspector::new(reader.as_ref(), hasher)
        .read_struct(address, slot, layout, target.source.block)
        .await?;

    export::export_struct(&snapshot, target.output.format, target.output.out.as_deref())?;
    Ok(())
}

async fn open_reader(args: &Args, config: &Config, source: &SourceArgs) -> Result<Box<dyn StorageReader>> {
    if let Some(path) = &source.snapshot {
        return Ok(Box::new(MemoryStorage::load(path)?));
    }
    let endpoint = endpoint_from_args_and_config(args, config)?;
    tracing::info!(endpoint = %endpoint.display(), "connecting");
    Ok(Box::new(create_reader(endpoint).await?))
}

fn lookup_layout<'r>(registry: &'r LayoutRegistry, name: &str) -> Result<&'r FieldLayout> {
    registry.get(name).ok_or_else(|| {
        let known = registry.names().collect::<Vec<_>>().join(", ");
        anyhow!("unknown layout `{}` (known: {})", name, known)
    })
}

fn parse_address(raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .with_context(|| format!("invalid address `{}`", raw))
}

fn print_layouts(registry: &LayoutRegistry) {
    for layout in registry.layouts() {
        println!("{} ({} slot(s))", layout.name(), layout.slot_count());
        for field in layout.fields() {
            let kind = match field.kind {
                FieldKind::Address => "address".to_string(),
                FieldKind::Bool => "bool".to_string(),
                FieldKind::Uint => format!("uint{}", field.byte_length * 8),
            };
            let range = field.byte_range();
            println!(
                "  {:<16} slot {:<3} bytes [{:>2},{:>2})  {}",
                field.name, field.slot_offset, range.start, range.end, kind
            );
        }
    }
    for error in &registry.errors {
        println!("invalid: {}", error);
    }
}

/// First endpoint by precedence: CLI flags, then config entries, then localhost
fn endpoint_from_args_and_config(args: &Args, config: &Config) -> Result<ProviderConfig> {
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            return Ok(ProviderConfig::Ipc(ipc));
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow!("IPC is not supported on this platform"));
        }
    }
    if let Some(ws) = args.ws.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(ProviderConfig::WebSocket(ws.to_string()));
    }
    if let Some(rpc) = args.rpc.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(ProviderConfig::Http(normalize_http_endpoint(rpc)));
    }

    for entry in &config.endpoints {
        if let Some(rpc) = entry.rpc.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(ProviderConfig::Http(normalize_http_endpoint(rpc)));
        }
        if let Some(ws) = entry.ws.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(ProviderConfig::WebSocket(ws.to_string()));
        }
        #[cfg(unix)]
        if let Some(ipc) = entry.ipc.as_deref().and_then(config::expand_path) {
            return Ok(ProviderConfig::Ipc(ipc));
        }
    }

    Ok(ProviderConfig::Http(normalize_http_endpoint("localhost:8545")))
}
