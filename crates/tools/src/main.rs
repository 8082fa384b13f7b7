use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use formats::{FeatureCollection, Topology, TripCities, WorldAtlas, build_trip_routes};
use foundation::math::LonLat;
use navigator::{NavigatorConfig, country_focus, rotation_target, trip_focus};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "trips" => cmd_trips(args),
        "focus" => cmd_focus(args),
        "decode" => cmd_decode(args),
        _ => Err(usage()),
    }
}

fn cmd_trips(args: Vec<String>) -> Result<(), String> {
    // iglobe trips <trips.json> <cities.geojson> [--out FILE]
    let (positional, out) = split_out_flag(args)?;
    let [trips_path, cities_path] = positional.as_slice() else {
        return Err(usage());
    };

    let trips = read(Path::new(trips_path))?;
    let cities = read(Path::new(cities_path))?;
    let payload = trips_geojson(&trips, &cities)?;
    emit(out.as_deref(), &payload)
}

fn cmd_focus(args: Vec<String>) -> Result<(), String> {
    // iglobe focus <world.json> country|trip <id> [--config FILE]
    let mut positional: Vec<String> = Vec::new();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a value".to_string());
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    let [world_path, kind, id] = positional.as_slice() else {
        return Err(usage());
    };

    let config = match config_path {
        Some(p) => NavigatorConfig::from_json_str(&read(&p)?).map_err(|e| format!("{p:?}: {e}"))?,
        None => NavigatorConfig::default(),
    };
    let world = read(Path::new(world_path))?;
    let target = focus_target(&world, kind, id, &config)?;
    println!("[{}, {}]", target.lon, target.lat);
    Ok(())
}

fn cmd_decode(args: Vec<String>) -> Result<(), String> {
    // iglobe decode <world.json> <object> [--out FILE]
    let (positional, out) = split_out_flag(args)?;
    let [world_path, object] = positional.as_slice() else {
        return Err(usage());
    };

    let world = read(Path::new(world_path))?;
    let payload = decode_object(&world, object)?;
    emit(out.as_deref(), &payload)
}

/// Route features for every trip, as pretty GeoJSON.
fn trips_geojson(trips_json: &str, cities_json: &str) -> Result<String, String> {
    let trips = TripCities::from_json_str(trips_json).map_err(|e| e.to_string())?;
    let cities = FeatureCollection::from_geojson_str(cities_json).map_err(|e| format!("cities: {e}"))?;
    let routes = build_trip_routes(&trips, &cities);
    tracing::info!(routes = routes.len(), cities = cities.len(), "built trip routes");
    routes.to_geojson_string_pretty().map_err(|e| format!("json: {e}"))
}

/// Rotation a `country` or `trip` view would fly to.
fn focus_target(world_json: &str, kind: &str, id: &str, config: &NavigatorConfig) -> Result<LonLat, String> {
    let atlas = WorldAtlas::from_topojson_str(world_json).map_err(|e| format!("world: {e}"))?;
    let focus = match kind {
        "country" => country_focus(&atlas, id, config),
        "trip" => trip_focus(&atlas, id),
        other => return Err(format!("unknown view kind: {other} (expected country or trip)")),
    };
    focus
        .map(rotation_target)
        .ok_or_else(|| format!("no focus for {kind} {id:?}"))
}

fn decode_object(world_json: &str, object: &str) -> Result<String, String> {
    let topology = Topology::from_json_str(world_json).map_err(|e| format!("world: {e}"))?;
    let features = topology.features(object).map_err(|e| {
        let known: Vec<&str> = topology.object_names().collect();
        format!("{e} (objects: {})", known.join(", "))
    })?;
    features.to_geojson_string_pretty().map_err(|e| format!("json: {e}"))
}

fn split_out_flag(args: Vec<String>) -> Result<(Vec<String>, Option<PathBuf>), String> {
    let mut positional = Vec::new();
    let mut out = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                let value = iter.next().ok_or_else(|| "--out requires a value".to_string())?;
                out = Some(PathBuf::from(value));
            }
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            _ => positional.push(arg),
        }
    }
    Ok((positional, out))
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn emit(out: Option<&Path>, payload: &str) -> Result<(), String> {
    match out {
        Some(path) => {
            fs::write(path, payload).map_err(|e| format!("write {path:?}: {e}"))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "iglobe".to_string());
    format!(
        "Usage:\n  {exe} trips <trips.json> <cities.geojson> [--out FILE]\n  {exe} focus <world.json> country|trip <id> [--config FILE]\n  {exe} decode <world.json> <object> [--out FILE]\n\nNotes:\n- `trips` joins each trip's city names against the city points; unknown cities are skipped with a warning.\n- `focus` prints the [lambda, phi] rotation the globe would animate to.\n- Logs go to stderr at info level; override with RUST_LOG.\n"
    )
}
