use std::path::PathBuf;

/// Flag images on disk, keyed by uppercased ISO country code.
///
/// A missing image is not an error; presentation falls back to text.
#[derive(Debug, Clone)]
pub struct FlagCatalog {
    dir: PathBuf,
}

impl FlagCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the flag image for `country_code`, if one exists.
    pub fn flag_image(&self, country_code: &str) -> Option<PathBuf> {
        let code = country_code.trim();
        if code.is_empty() {
            return None;
        }
        let path = self.dir.join(format!("{}.png", code.to_uppercase()));
        path.is_file().then_some(path)
    }
}
