use envfield::{define_config, Registry};
use std::{collections::BTreeMap, io, time::Duration};
use tracing_subscriber::EnvFilter;

define_config! {
    #[derive(Debug)]
    pub struct DemoConfig {
        /// Port the demo server listens on
        #[field(env = "DEMO_PORT", default = 8080, required)]
        pub port: i64,

        #[field(env = "DEMO_MODE", default = "dev".to_string(), allowed = ["dev", "prod"])]
        pub mode: String,

        #[field(env = "DEMO_TIMEOUT", default = Duration::from_secs(30))]
        pub timeout: Duration,

        #[field(env = "DEMO_HOSTS", default = vec!["localhost".to_string()])]
        pub hosts: Vec<String>,

        #[field(env = "DEMO_LABELS", default = BTreeMap::new())]
        pub labels: BTreeMap<String, String>,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    dotenvy::from_filename("./test.env").ok();
    let mut registry = Registry::new();
    let config = DemoConfig::declare(&mut registry);

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(arg) => match arg.as_str() {
            "print" => print(&registry, args.next().as_deref().unwrap_or("short-bash")),
            "get" => show_values(&config),
            "validate" => validate(&registry),
            _ => println!(
                "unknown arg: {}. Available: print [format], get, validate",
                arg
            ),
        },
        None => {
            println!("Usage: util-cli [command]");
            println!("Commands:");
            println!("  print [format] - Print fields as short-bash, long-bash, short-dockerfile or long-dockerfile");
            println!("  get            - Show resolved values");
            println!("  validate       - Check every field and report errors");
        }
    };
}

fn print(registry: &Registry, format: &str) {
    if let Err(e) = registry.print_named(&mut io::stdout().lock(), format) {
        eprintln!("✗ {}", e);
        std::process::exit(2);
    }
}

fn show_values(config: &DemoConfig) {
    println!("  port: {}", config.port.get_or_default());
    println!("  mode: {}", config.mode.get_or_default());
    println!("  timeout: {:?}", config.timeout.get_or_default());
    println!("  hosts: {:?}", config.hosts.get_or_default());
    println!("  labels: {:?}", config.labels.get_or_default());
}

fn validate(registry: &Registry) {
    match registry.validate() {
        Ok(()) => println!("✓ Configuration is valid"),
        Err(errors) => {
            eprintln!("Failed to load config:");
            for error in errors {
                eprintln!("\t- {}", error);
            }
            std::process::exit(1);
        }
    }
}
