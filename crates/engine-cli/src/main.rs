use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use contracts::{ChoiceSide, GameConfig};
use engine_api::{serve, GameApi};
use engine_core::daily;

fn print_usage() {
    println!("engine-cli <command>");
    println!("commands:");
    println!("  new [seed]");
    println!("    creates a game and prints the first drawn card");
    println!("  autoplay <seed> [turns] [sqlite_path]");
    println!("    plays a full deterministic reign and prints the settlement");
    println!("  daily <YYYY-MM-DD>");
    println!("    prints the shared daily challenge for a date");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
}

fn parse_seed(value: Option<&String>) -> Result<u64, String> {
    let raw = value.ok_or_else(|| "missing seed".to_string())?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid seed: {raw}"))
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_date(value: Option<&String>) -> Result<(u32, u32, u32), String> {
    let raw = value.ok_or_else(|| "missing date".to_string())?;
    let parts: Vec<&str> = raw.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(format!("invalid date: {raw}"));
    };
    let year = year.parse::<u32>().map_err(|_| format!("invalid date: {raw}"))?;
    let month = month.parse::<u32>().map_err(|_| format!("invalid date: {raw}"))?;
    let day = day.parse::<u32>().map_err(|_| format!("invalid date: {raw}"))?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(format!("invalid date: {raw}"));
    }
    Ok((year, month, day))
}

fn new_game(args: &[String]) -> Result<(), String> {
    let config = match args.get(2) {
        Some(_) => GameConfig {
            seed: parse_seed(args.get(2))?,
            ..GameConfig::default()
        },
        None => GameConfig::default(),
    };

    let mut api = GameApi::from_config(config);
    let pending = api
        .draw_event()
        .map_err(|err| format!("failed to draw first card: {err}"))?;
    let left = api
        .preview(ChoiceSide::Left)
        .map_err(|err| format!("preview failed: {err}"))?;
    let right = api
        .preview(ChoiceSide::Right)
        .map_err(|err| format!("preview failed: {err}"))?;

    println!("game_id={} {}", api.game_id(), api.snapshot());
    println!("card {} [{:?} tier]", pending.event.event_id, pending.tier);
    println!("  left:  {} {:?}", pending.event.left.text, left);
    println!("  right: {} {:?}", pending.event.right.text, right);
    Ok(())
}

fn run_autoplay(args: &[String]) -> Result<(), String> {
    let seed = parse_seed(args.get(2))?;
    let max_turns = args
        .get(3)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| format!("invalid turns: {value}"))
        })
        .transpose()?
        .unwrap_or(300);
    let sqlite_path = args.get(4).filter(|path| !path.trim().is_empty());

    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    let mut api = GameApi::from_config(config);
    if let Some(path) = sqlite_path {
        api.attach_sqlite_store(PathBuf::from(path))
            .map_err(|err| format!("failed to attach sqlite store: {err}"))?;
    }

    let summary = api
        .autoplay(max_turns)
        .map_err(|err| format!("autoplay failed: {err}"))?;

    if let Some(error) = api.last_persistence_error() {
        return Err(format!("persistence error after autoplay: {error}"));
    }

    println!("game_id={} seed={} {}", api.game_id(), seed, api.snapshot());
    println!(
        "ending={:?} legacy={:?} prestige={} turns={}",
        summary.ending, summary.legacy, summary.prestige, summary.turns_survived
    );
    Ok(())
}

fn show_daily(args: &[String]) -> Result<(), String> {
    let (year, month, day) = parse_date(args.get(2))?;
    let challenge = daily::challenge_for_date(year, month, day);
    println!(
        "daily {} seed={} era={:?} modifier={:?} gold={} happiness={} military={} faith={}",
        challenge.date_key,
        challenge.seed,
        challenge.era,
        challenge.modifier,
        challenge.starting_resources.gold,
        challenge.starting_resources.happiness,
        challenge.starting_resources.military,
        challenge.starting_resources.faith,
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("new") => {
            if let Err(err) = new_game(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("autoplay") => {
            if let Err(err) = run_autoplay(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("daily") => {
            if let Err(err) = show_daily(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving api on http://{addr}");
                if let Err(err) = serve(addr).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        _ => {
            print_usage();
        }
    }
}
