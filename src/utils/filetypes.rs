//! Text-eligibility gate for the pattern detector.

use std::io::Read;
use std::path::Path;

/// Extensions that are always scannable without sniffing content.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "yaml", "yml", "env", "ini", "cfg", "conf", "py", "js", "ts", "tsx",
    "jsx", "sh", "ps1", "html", "css", "xml", "java", "c", "cpp", "h", "go", "rs", "php", "rb",
];

/// Classify a path as text-eligible.
///
/// Whitelisted extensions pass outright; everything else is sniffed: a zero
/// byte in the first 1024 bytes marks the file binary. Unreadable files are
/// not eligible.
pub fn is_text_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }

    let mut chunk = [0u8; 1024];
    match std::fs::File::open(path) {
        Ok(mut f) => match f.read(&mut chunk) {
            Ok(n) => !chunk[..n].contains(&0),
            Err(_) => false,
        },
        Err(_) => false,
    }
}
