//! Command-line driver for grfscope scenarios.
//!
//! Builds the world and content described by a JSON scenario, then resolves
//! graphs or renders inspectors against it.
//! Run with: `grfscope <SCENARIO> <command>`

mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use grfscope_core::inspect::surface::SurfaceHost;
use grfscope_core::{FeatureKind, GraphKey, InspectTarget, Session};

use crate::scenario::Scenario;

/// Resolve and inspect content-driven entity attributes
#[derive(Parser)]
#[command(name = "grfscope")]
#[command(about = "Resolve and inspect content-driven entity attributes", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every inspectable entity with its caption
    List,

    /// Resolve a graph for one entity
    Resolve(ResolveArgs),

    /// Render the inspector of one entity
    Inspect(InspectArgs),
}

#[derive(Args)]
struct EntityArgs {
    /// Feature name (e.g. canals, trains) or hex tag (e.g. 0x05)
    #[arg(short, long, value_parser = parse_feature)]
    feature: FeatureKind,

    /// Entity index: vehicle id, tile index or industry id
    #[arg(short, long)]
    index: u32,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    entity: EntityArgs,

    /// Graph slot; the canal sub-feature number for canals
    #[arg(long, default_value_t = 0)]
    slot: u8,

    /// Run this callback (hex) instead of a sprite query
    #[arg(long, value_parser = parse_hex_u16)]
    callback: Option<u16>,

    /// First callback parameter
    #[arg(long, default_value_t = 0)]
    param1: u32,

    /// Second callback parameter
    #[arg(long, default_value_t = 0)]
    param2: u32,

    /// Fire these random triggers (bit mask) before resolving
    #[arg(long)]
    trigger: Option<u32>,
}

#[derive(Args)]
struct InspectArgs {
    #[command(flatten)]
    entity: EntityArgs,

    /// Variable parameter as ID=VALUE in hex (e.g. 61=01); repeatable
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(u8, u8)>,

    /// Also render the parent entity
    #[arg(long)]
    parent: bool,
}

fn parse_feature(text: &str) -> Result<FeatureKind, String> {
    if let Some(hex) = text.strip_prefix("0x") {
        let tag = u8::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
        return FeatureKind::try_from(tag).map_err(|e| e.to_string());
    }
    let wanted = text.replace(['-', '_'], "");
    FeatureKind::ALL
        .into_iter()
        .find(|kind| kind.to_string().eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| format!("unknown feature '{text}'"))
}

fn parse_hex_u16(text: &str) -> Result<u16, String> {
    u16::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_param(text: &str) -> Result<(u8, u8), String> {
    let (id, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{text}'"))?;
    let id = u8::from_str_radix(id, 16).map_err(|e| e.to_string())?;
    let value = u8::from_str_radix(value, 16).map_err(|e| e.to_string())?;
    Ok((id, value))
}

/// Logs when an inspected entity's dependent displays should refresh.
struct LandInfoLog;

impl SurfaceHost for LandInfoLog {
    fn surface_closed(&mut self, target: InspectTarget) {
        tracing::debug!(%target, "land info invalidated");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = std::fs::read_to_string(&cli.scenario)
        .with_context(|| format!("reading {}", cli.scenario.display()))?;
    let scenario = Scenario::from_json(&json)
        .with_context(|| format!("parsing {}", cli.scenario.display()))?;
    let (world, content) = scenario.build()?;
    let mut session = Session::new(world, content);
    session.set_surface_host(Box::new(LandInfoLog));
    tracing::info!(graphs = session.content().len(), "scenario loaded");

    match cli.command {
        Command::List => list(&session),
        Command::Resolve(args) => resolve(&mut session, &args),
        Command::Inspect(args) => inspect(&mut session, &args),
    }
}

fn list(session: &Session) -> Result<()> {
    let world = session.world();
    let tiles = u32::try_from(world.config().tile_count()).unwrap_or(u32::MAX);
    let vehicles = u32::try_from(world.vehicle_count()).unwrap_or(u32::MAX);
    let industries = u32::try_from(world.industry_count()).unwrap_or(u32::MAX);

    for kind in session.registry().kinds() {
        let count = match kind {
            FeatureKind::Canals | FeatureKind::IndustryTiles => tiles,
            FeatureKind::Industries => industries,
            _ if kind.is_vehicle() => vehicles,
            _ => 0,
        };
        for index in (0..count).filter(|&index| session.is_inspectable(kind, index)) {
            let target = InspectTarget::new(kind, index)?;
            if let Some(caption) = session.caption(target) {
                println!("{kind} {index}: {caption}");
            }
        }
    }
    Ok(())
}

fn resolve(session: &mut Session, args: &ResolveArgs) -> Result<()> {
    let EntityArgs { feature, index } = args.entity;
    let key = GraphKey {
        kind: feature,
        slot: args.slot,
    };
    if session.content().graph(key).is_none() {
        tracing::warn!(feature = %feature, slot = args.slot, "no graph loaded for this slot");
    }
    if let Some(trigger) = args.trigger {
        let reseed = session.trigger(key, index, trigger);
        println!("reseed: {reseed:08x}");
    }
    match args.callback {
        Some(callback) => match session.callback(key, index, callback, args.param1, args.param2) {
            Some(result) => println!("callback {callback:03x}: {result:04x}"),
            None => println!("callback {callback:03x}: failed"),
        },
        None => println!("{}", session.resolve(key, index)),
    }
    Ok(())
}

fn inspect(session: &mut Session, args: &InspectArgs) -> Result<()> {
    let EntityArgs { feature, index } = args.entity;
    for &(id, value) in &args.params {
        if !session.inspectors_mut().params_mut().set(id, value) {
            bail!("variable {id:02x} takes no parameter");
        }
    }

    let target = session.open_inspector(feature, index)?;
    print_inspector(session, target)?;
    if args.parent {
        if let Some(parent) = session.open_parent(target)? {
            println!();
            print_inspector(session, parent)?;
            session.close_inspector(parent.kind(), parent.index());
        }
    }
    session.close_inspector(feature, index);
    Ok(())
}

fn print_inspector(session: &mut Session, target: InspectTarget) -> Result<()> {
    if let Some(caption) = session.caption(target) {
        println!("{caption}");
    }
    for line in session.render_inspector(target)? {
        println!("{line}");
    }
    Ok(())
}
