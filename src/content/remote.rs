use std::fs;
use std::path::PathBuf;

/// Cache for downloaded question banks, keyed by file name under the data dir.
pub struct BankCache {
    base_dir: PathBuf,
}

impl BankCache {
    pub fn new() -> Option<Self> {
        let base = dirs::data_dir()?.join("phrasedr").join("banks");
        fs::create_dir_all(&base).ok()?;
        Some(Self { base_dir: base })
    }

    #[cfg(test)]
    fn with_base_dir(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let path = self.base_dir.join(Self::sanitize_name(name));
        fs::read_to_string(path).ok()
    }

    pub fn put(&self, name: &str, content: &str) -> bool {
        let path = self.base_dir.join(Self::sanitize_name(name));
        fs::write(path, content).is_ok()
    }

    fn sanitize_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Fetch a bank JSON, preferring the disk cache and falling back to the
/// network. Returns None on any failure; callers fall back to bundled assets.
pub fn fetch_bank_json(base_url: &str, bank_file: &str) -> Option<String> {
    let cache = BankCache::new();
    if let Some(ref cache) = cache
        && let Some(cached) = cache.get(bank_file)
    {
        return Some(cached);
    }

    let url = format!("{}/{}", base_url.trim_end_matches('/'), bank_file);
    let body = fetch_url(&url)?;
    if let Some(ref cache) = cache {
        cache.put(bank_file, &body);
    }
    Some(body)
}

#[cfg(feature = "network")]
fn fetch_url(url: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .ok()?;
    let response = client.get(url).send().ok()?;
    if response.status().is_success() {
        response.text().ok()
    } else {
        None
    }
}

#[cfg(not(feature = "network"))]
fn fetch_url(_url: &str) -> Option<String> {
    None
}
