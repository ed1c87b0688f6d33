use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "stickgen.toml";

/// Contents of a `stickgen.toml` file. Every key is optional; command-line
/// flags take precedence.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Template root directory.
    #[serde(default)]
    pub templates: Option<PathBuf>,

    /// Output file. `-` writes to stdout.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Crate path generated code imports as `stick`.
    #[serde(default)]
    pub runtime_crate: Option<String>,

    /// Templates to compile.
    #[serde(default)]
    pub names: Vec<String>,
}

impl Config {
    pub fn parse(content: &str) -> Result<Config, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Read the config at `path`, or `stickgen.toml` in the working
    /// directory when no path is given and that file exists. Relative
    /// paths inside the file are resolved against its directory.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let config =
            Config::parse(&content).map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    fn relative_to(mut self, base: &Path) -> Config {
        self.templates = self.templates.map(|dir| base.join(dir));
        self.output = self
            .output
            .map(|file| if file == Path::new("-") { file } else { base.join(file) });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
templates = "templates"
output = "src/templates.rs"
runtime_crate = "crate::runtime"
names = ["index.twig", "about.twig"]
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                templates: Some(PathBuf::from("templates")),
                output: Some(PathBuf::from("src/templates.rs")),
                runtime_crate: Some("crate::runtime".to_string()),
                names: vec!["index.twig".to_string(), "about.twig".to_string()],
            }
        );
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse("template = \"x\"").unwrap_err();
        assert!(err.contains("unknown field"), "{}", err);
    }

    #[test]
    fn load_resolves_paths_against_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stickgen.toml");
        std::fs::write(&path, "templates = \"views\"\noutput = \"-\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.templates, Some(dir.path().join("views")));
        assert_eq!(config.output, Some(PathBuf::from("-")));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.starts_with("cannot read"), "{}", err);
    }
}
