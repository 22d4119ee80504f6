use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use contracts::WorldConfig;
use world_api::{serve, spawn_runtime, RuntimeExit};

fn print_usage() {
    println!("world-cli <command>");
    println!("commands:");
    println!("  serve [addr] [config.json]");
    println!("    default addr: 127.0.0.1:8080");
    println!("    default config: built-in 10x10 empty world");
    println!("  check-config <config.json>");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn load_config(path: Option<&String>) -> Result<WorldConfig, String> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let raw = fs::read_to_string(Path::new(path))
        .map_err(|err| format!("cannot read {path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid config {path}: {err}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => {
            let addr = match parse_socket_addr(args.get(2)) {
                Ok(addr) => addr,
                Err(err) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            };
            let config = match load_config(args.get(3)) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(2);
                }
            };

            let (handle, scheduler) = match spawn_runtime(config) {
                Ok(spawned) => spawned,
                Err(err) => {
                    eprintln!("error: world failed to initialize: {err}");
                    std::process::exit(2);
                }
            };

            println!("serving world api on http://{addr}");
            tokio::select! {
                served = serve(addr, handle) => {
                    if let Err(err) = served {
                        eprintln!("server error: {err}");
                        std::process::exit(1);
                    }
                }
                exited = scheduler => {
                    match exited {
                        Ok(RuntimeExit::Shutdown) => println!("world runtime shut down"),
                        Ok(RuntimeExit::Fatal) => {
                            eprintln!("world runtime aborted on an invariant violation");
                            std::process::exit(1);
                        }
                        Err(err) => {
                            eprintln!("world runtime panicked: {err}");
                            std::process::exit(1);
                        }
                    }
                }
            }
        }
        Some("check-config") => match args.get(2) {
            Some(path) => match load_config(Some(path)) {
                Ok(config) => {
                    println!(
                        "ok: {}x{} grid, tick {}ms (deadline {}ms), {} entities, {} objects",
                        config.grid.width,
                        config.grid.height,
                        config.tick.duration_ms,
                        config.tick.deadline_ms,
                        config.initial.entities.len(),
                        config.initial.objects.len(),
                    );
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(2);
                }
            },
            None => {
                eprintln!("error: missing config path");
                print_usage();
                std::process::exit(2);
            }
        },
        _ => {
            print_usage();
        }
    }
}
