//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent, `Err(raw)` when the value is not a
    /// recognised flag.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(raw) => parse_bool(&raw).map(Some).ok_or(raw),
        }
    }

    /// Comma separated value, trimmed and lower-cased, empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
