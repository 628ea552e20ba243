use std::path::Path;
use uuid::Uuid;

/// Build a fresh file key `<id>/<file name>` for an upload without an explicit key.
///
/// The id is a hyphen-free v4 UUID, whose hex characters spread evenly across shards.
pub fn generate_key(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", Uuid::new_v4().simple(), name)
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_uses_file_name() {
        let key = generate_key(Path::new("/tmp/uploads/report.pdf"));
        let (id, name) = key.split_once('/').unwrap();
        assert_eq!(name, "report.pdf");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_keys_differ() {
        let path = Path::new("a.txt");
        assert_ne!(generate_key(path), generate_key(path));
    }
}
