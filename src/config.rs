use crate::path::RootPath;
use crate::types::Config;
use anyhow::Result;
use std::path::Path;

const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "config.json",
    "config.yaml",
    "/etc/endpoint-pages/config.toml",
    "/etc/endpoint-pages/config.json",
    "/etc/endpoint-pages/config.yaml",
];

pub struct ConfigManager;

impl ConfigManager {
    pub fn load() -> Result<Config> {
        for path in CONFIG_PATHS {
            if Path::new(path).exists() {
                log::info!("Loading config from {}", path);
                return Self::load_from_file(path);
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    pub fn load_from_file(path: &str) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    fn parse(path: &str, content: &str) -> Result<Config> {
        if path.ends_with(".toml") {
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))
        } else if path.ends_with(".json") {
            serde_json::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse JSON: {}", e))
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse YAML: {}", e))
        } else {
            Err(anyhow::anyhow!("Unsupported config file format"))
        }
    }

    pub fn save_example_config() -> Result<()> {
        let example_config = r#"# Endpoint pages configuration

server_port = 8080

# Prefix the whole application is mounted under
root_path = "/"

# dev and test show error details and stacks, prod shows only the error id
launch_mode = "dev"

# template_dir = "./templates"   # Optional: overrides pages/*.html.jinja2
# static_dir = "./static"        # Optional: files listed as static resources

additional_endpoints = ["/q/health"]

[failure]
# handler = "my_handler"         # Optional: disables the default handler
"#;

        std::fs::write("config.example.toml", example_config)?;
        println!("Example configuration saved to config.example.toml");
        Ok(())
    }
}

// Environment variable support
impl Config {
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server_port = port;
            }
        }

        if let Some(root_path) = var("ROOT_PATH") {
            match RootPath::new(root_path) {
                Ok(root_path) => self.root_path = root_path,
                Err(e) => log::warn!("Ignoring ROOT_PATH: {}", e),
            }
        }

        if let Some(mode) = var("LAUNCH_MODE") {
            match mode.parse() {
                Ok(mode) => self.launch_mode = mode,
                Err(e) => log::warn!("Ignoring LAUNCH_MODE: {}", e),
            }
        }

        if let Some(handler) = var("FAILURE_HANDLER") {
            if !handler.is_empty() {
                self.failure.handler = Some(handler);
            }
        }
    }
}
