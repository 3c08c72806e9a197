/*!
 * File type labelling and binary detection
 */

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;

/// Label used when neither the name nor the extension is known
pub const UNKNOWN_TYPE: &str = "unknown";

/// Number of leading bytes inspected by the content sniff
pub const SNIFF_LEN: usize = 512;

/// Extension to type label
static FILE_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Programming languages
        ("ts", "typescript"),
        ("tsx", "typescript"),
        ("js", "javascript"),
        ("jsx", "javascript"),
        ("py", "python"),
        ("rb", "ruby"),
        ("php", "php"),
        ("java", "java"),
        ("kt", "kotlin"),
        ("go", "go"),
        ("rs", "rust"),
        ("c", "c"),
        ("cpp", "cpp"),
        ("cs", "csharp"),
        ("swift", "swift"),
        ("scala", "scala"),
        // Web
        ("html", "html"),
        ("htm", "html"),
        ("css", "css"),
        ("scss", "scss"),
        ("sass", "sass"),
        ("less", "less"),
        ("json", "json"),
        ("xml", "xml"),
        ("svg", "svg"),
        // Documentation
        ("md", "markdown"),
        ("mdx", "markdown"),
        ("txt", "text"),
        ("rst", "restructuredtext"),
        ("pdf", "pdf"),
        ("doc", "word"),
        ("docx", "word"),
        // Configuration
        ("yml", "yaml"),
        ("yaml", "yaml"),
        ("toml", "toml"),
        ("ini", "ini"),
        ("env", "env"),
        // Shell
        ("sh", "shell"),
        ("bash", "shell"),
        ("zsh", "shell"),
        ("fish", "shell"),
        // Data
        ("csv", "csv"),
        ("tsv", "tsv"),
        ("sql", "sql"),
        ("db", "database"),
        ("sqlite", "database"),
        // Other
        ("lock", "lock"),
        ("log", "log"),
        ("conf", "config"),
        ("cfg", "config"),
    ])
});

/// Extensions that are treated as binary without looking at content
static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        // Images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff",
        // Audio
        "mp3", "wav", "ogg", "flac", "m4a",
        // Video
        "mp4", "webm", "avi", "mov", "wmv",
        // Archives
        "zip", "tar", "gz", "7z", "rar",
        // Fonts
        "ttf", "otf", "woff", "woff2", "eot",
        // Documents
        "pdf", "doc", "docx", "xls", "xlsx",
        // Executables
        "exe", "dll", "so", "dylib",
        // Other
        "bin", "dat", "db", "sqlite",
    ])
});

/// Lowercased extension of the last path component, if any
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Type label for a path: special basenames first, then the extension table
pub fn file_type(path: &Path) -> &'static str {
    let basename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();

    match basename.as_str() {
        "dockerfile" => return "dockerfile",
        "makefile" => return "makefile",
        ".gitignore" => return "gitignore",
        ".env" => return "env",
        "license" | "licence" => return "license",
        _ => {}
    }

    extension(path)
        .and_then(|ext| FILE_TYPES.get(ext.as_str()).copied())
        .unwrap_or(UNKNOWN_TYPE)
}

/// True when the extension is one of the known binary extensions
pub fn has_binary_extension(path: &Path) -> bool {
    extension(path).is_some_and(|ext| BINARY_EXTENSIONS.contains(ext.as_str()))
}

/// Heuristic content sniff over the first [`SNIFF_LEN`] bytes.
///
/// A NUL byte or any byte in `0x80..=0x9F` marks the content as binary. This
/// is a guess, not a guarantee: UTF-8 text whose multi-byte sequences carry
/// continuation bytes in that range is reported as binary too.
pub fn is_binary_content(content: &[u8]) -> bool {
    content
        .iter()
        .take(SNIFF_LEN)
        .any(|&b| b == 0x00 || (0x80..=0x9F).contains(&b))
}

/// True when every character is allowed by the XML 1.0 `Char` production.
///
/// C0 controls other than tab, newline and carriage return, plus U+FFFE and
/// U+FFFF, cannot appear in a well-formed document, not even inside CDATA.
pub fn is_xml_safe(text: &str) -> bool {
    text.chars().all(|c| match c {
        '\t' | '\n' | '\r' => true,
        '\u{FFFE}' | '\u{FFFF}' => false,
        c => c >= '\u{20}',
    })
}

/// Binary check by extension, then by content when it is available.
/// Defaults to text when neither is conclusive.
pub fn is_binary(path: &Path, content: Option<&[u8]>) -> bool {
    if has_binary_extension(path) {
        return true;
    }

    content.is_some_and(is_binary_content)
}
