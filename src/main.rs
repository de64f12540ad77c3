use foldertune::config::ConfigStore;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    config_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let store = match args.config_dir {
        Some(dir) => ConfigStore::new(dir),
        None => ConfigStore::from_env()?,
    };

    let _log_guard = match foldertune::logging::init_logging(&store.root().join("logs")) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("logging disabled: {err:#}");
            None
        }
    };

    foldertune::app::run(&store)
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--config-dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--config-dir requires a path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--config-dir cannot be empty");
                }
                out.config_dir = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("foldertune: play music folder by folder");
    println!("  --config-dir PATH   Directory holding config.json and seen_songs.json");
    println!("  -h, --help          Show this help");
    println!();
    println!("Environment:");
    println!("  FOLDERTUNE_CONFIG_DIR   Default for --config-dir");
    println!("  RUST_LOG                Log filter (logs go to <config dir>/logs)");
}
