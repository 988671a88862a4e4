//! Extension to MIME type mapping with a pluggable external database.
//!
//! Resolution consults the database first, then falls back to the
//! static table below. The table is ordered and first-match-wins; the
//! handful of deliberate early entries (including the duplicate `txt`)
//! must stay where they are, since later duplicates are never reached.

use file_type::FileType;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// The MIME type this application registers for its exported settings
/// files.
pub const SETTINGS_MIME_TYPE: &str = "application/x-wrenmail-settings";

/// Ordered (extension, mime type) pairs. First match wins.
static MIME_TYPE_BY_EXTENSION: &[(&str, &str)] = &[
    // Deliberate early entries: a missing extension resolves to the
    // generic default, the settings extension resolves to our own type
    // before anything else can claim it, and txt must map to
    // text/plain regardless of what follows.
    ("", DEFAULT_MIME_TYPE),
    ("wrenmail", SETTINGS_MIME_TYPE),
    ("txt", "text/plain"),
    ("123", "application/vnd.lotus-1-2-3"),
    ("323", "text/h323"),
    ("3g2", "video/3gpp2"),
    ("3gp", "video/3gpp"),
    ("7z", "application/x-7z-compressed"),
    ("aab", "application/x-authorware-bin"),
    ("aac", "audio/aac"),
    ("abw", "application/x-abiword"),
    ("ai", "application/postscript"),
    ("aif", "audio/x-aiff"),
    ("aifc", "audio/x-aiff"),
    ("aiff", "audio/x-aiff"),
    ("apk", "application/vnd.android.package-archive"),
    ("asc", "text/plain"),
    ("asf", "video/x-ms-asf"),
    ("asx", "video/x-ms-asf"),
    ("atom", "application/atom+xml"),
    ("au", "audio/basic"),
    ("avi", "video/x-msvideo"),
    ("bcpio", "application/x-bcpio"),
    ("bin", "application/octet-stream"),
    ("bmp", "image/bmp"),
    ("bz2", "application/x-bzip2"),
    ("c", "text/x-csrc"),
    ("cc", "text/x-c++src"),
    ("cdf", "application/x-netcdf"),
    ("chm", "application/vnd.ms-htmlhelp"),
    ("class", "application/java-vm"),
    ("cpio", "application/x-cpio"),
    ("cpp", "text/x-c++src"),
    ("crt", "application/x-x509-ca-cert"),
    ("csh", "application/x-csh"),
    ("css", "text/css"),
    ("csv", "text/comma-separated-values"),
    ("dcr", "application/x-director"),
    ("deb", "application/x-debian-package"),
    ("der", "application/x-x509-ca-cert"),
    ("diff", "text/plain"),
    ("djv", "image/vnd.djvu"),
    ("djvu", "image/vnd.djvu"),
    ("dll", "application/x-msdownload"),
    ("dmg", "application/x-apple-diskimage"),
    ("doc", "application/msword"),
    ("docm", "application/vnd.ms-word.document.macroenabled.12"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("dot", "application/msword"),
    (
        "dotx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
    ),
    ("dtd", "application/xml-dtd"),
    ("dvi", "application/x-dvi"),
    ("ear", "application/java-archive"),
    ("eml", "message/rfc822"),
    ("eps", "application/postscript"),
    ("epub", "application/epub+zip"),
    ("etx", "text/x-setext"),
    ("exe", "application/x-msdownload"),
    ("flac", "audio/flac"),
    ("flv", "video/x-flv"),
    ("gif", "image/gif"),
    ("gtar", "application/x-gtar"),
    ("gz", "application/gzip"),
    ("h", "text/x-chdr"),
    ("hqx", "application/mac-binhex40"),
    ("htc", "text/x-component"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ical", "text/calendar"),
    ("ico", "image/x-icon"),
    ("ics", "text/calendar"),
    ("ief", "image/ief"),
    ("jad", "text/vnd.sun.j2me.app-descriptor"),
    ("jar", "application/java-archive"),
    ("java", "text/x-java-source"),
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("kml", "application/vnd.google-earth.kml+xml"),
    ("kmz", "application/vnd.google-earth.kmz"),
    ("latex", "application/x-latex"),
    ("log", "text/plain"),
    ("m3u", "audio/x-mpegurl"),
    ("m4a", "audio/mp4"),
    ("m4v", "video/x-m4v"),
    ("man", "application/x-troff-man"),
    ("md", "text/markdown"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("mka", "audio/x-matroska"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpe", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mpga", "audio/mpeg"),
    ("nc", "application/x-netcdf"),
    ("odb", "application/vnd.oasis.opendocument.database"),
    ("odc", "application/vnd.oasis.opendocument.chart"),
    ("odf", "application/vnd.oasis.opendocument.formula"),
    ("odg", "application/vnd.oasis.opendocument.graphics"),
    ("odi", "application/vnd.oasis.opendocument.image"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("ogx", "application/ogg"),
    ("opus", "audio/opus"),
    ("otf", "font/otf"),
    ("p12", "application/x-pkcs12"),
    ("pbm", "image/x-portable-bitmap"),
    ("pdf", "application/pdf"),
    ("pem", "application/x-pem-file"),
    ("pgm", "image/x-portable-graymap"),
    ("pgp", "application/pgp-encrypted"),
    ("png", "image/png"),
    ("pnm", "image/x-portable-anymap"),
    ("pot", "application/vnd.ms-powerpoint"),
    ("ppm", "image/x-portable-pixmap"),
    ("pps", "application/vnd.ms-powerpoint"),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("ps", "application/postscript"),
    ("psd", "image/vnd.adobe.photoshop"),
    ("py", "text/x-python"),
    ("qt", "video/quicktime"),
    ("ra", "audio/x-pn-realaudio"),
    ("ram", "audio/x-pn-realaudio"),
    ("rar", "application/x-rar-compressed"),
    ("ras", "image/x-cmu-raster"),
    ("rb", "text/x-ruby"),
    ("rdf", "application/rdf+xml"),
    ("rgb", "image/x-rgb"),
    ("rpm", "application/x-redhat-package-manager"),
    ("rss", "application/rss+xml"),
    ("rtf", "application/rtf"),
    ("rtx", "text/richtext"),
    ("sgm", "text/sgml"),
    ("sgml", "text/sgml"),
    ("sh", "application/x-sh"),
    ("sig", "application/pgp-signature"),
    ("sit", "application/x-stuffit"),
    ("snd", "audio/basic"),
    ("svg", "image/svg+xml"),
    ("svgz", "image/svg+xml"),
    ("swf", "application/x-shockwave-flash"),
    ("tar", "application/x-tar"),
    ("tcl", "application/x-tcl"),
    ("tex", "application/x-tex"),
    ("texi", "application/x-texinfo"),
    ("texinfo", "application/x-texinfo"),
    ("text", "text/plain"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("torrent", "application/x-bittorrent"),
    ("tsv", "text/tab-separated-values"),
    ("ttf", "font/ttf"),
    // Unreachable duplicate kept for parity with legacy tables
    ("txt", "text/plain"),
    ("vcf", "text/x-vcard"),
    ("vcs", "text/x-vcalendar"),
    ("wav", "audio/x-wav"),
    ("wbmp", "image/vnd.wap.wbmp"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("wma", "audio/x-ms-wma"),
    ("wml", "text/vnd.wap.wml"),
    ("wmv", "video/x-ms-wmv"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xbm", "image/x-xbitmap"),
    ("xhtml", "application/xhtml+xml"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xml", "application/xml"),
    ("xpm", "image/x-xpixmap"),
    ("xsl", "application/xml"),
    ("xslt", "application/xslt+xml"),
    ("xwd", "image/x-xwindowdump"),
    ("xz", "application/x-xz"),
    ("zip", "application/zip"),
];

/// An external extension database consulted before the static table.
pub trait MimeDatabase {
    /// The type for `extension` (already lower-cased, no leading dot),
    /// or None when the database has no opinion.
    fn lookup(&self, extension: &str) -> Option<String>;
}

/// Database backed by the `file_type` crate's bundled registry.
#[derive(Debug, Default)]
pub struct FileTypeDb;

impl MimeDatabase for FileTypeDb {
    fn lookup(&self, extension: &str) -> Option<String> {
        FileType::from_extension(extension)
            .iter()
            .flat_map(|ft| ft.media_types())
            .next()
            .map(|mt| mt.to_string())
    }
}

/// A database with no entries; resolution falls through to the static
/// table.
#[derive(Debug, Default)]
pub struct NoDatabase;

impl MimeDatabase for NoDatabase {
    fn lookup(&self, _extension: &str) -> Option<String> {
        None
    }
}

pub struct TypeRegistry {
    db: Box<dyn MimeDatabase + Send + Sync>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(FileTypeDb)
    }
}

impl TypeRegistry {
    pub fn new<D: MimeDatabase + Send + Sync + 'static>(db: D) -> Self {
        Self { db: Box::new(db) }
    }

    /// Resolve `file_name` to a MIME type via its extension. The
    /// database answers first; a miss or a generic answer falls back to
    /// the static table, and an overall miss yields the generic
    /// default.
    pub fn mime_type_by_extension(&self, file_name: &str) -> String {
        let extension = extension_of(file_name);
        match self.db.lookup(&extension) {
            Some(answer) if !answer.eq_ignore_ascii_case(DEFAULT_MIME_TYPE) => answer,
            _ => table_lookup(&extension)
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string(),
        }
    }

    /// Reverse lookup against the static table only; first match wins.
    pub fn extension_by_mime_type(&self, mime_type: &str) -> Option<&'static str> {
        MIME_TYPE_BY_EXTENSION
            .iter()
            .find(|(_, mt)| mt.eq_ignore_ascii_case(mime_type))
            .map(|(ext, _)| *ext)
    }
}

fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

fn table_lookup(extension: &str) -> Option<&'static str> {
    MIME_TYPE_BY_EXTENSION
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mt)| *mt)
}

/// Resolve with the default registry.
pub fn mime_type_by_extension(file_name: &str) -> String {
    TypeRegistry::default().mime_type_by_extension(file_name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn early_table_entries_take_precedence() {
        let registry = TypeRegistry::default();
        k9::assert_equal!(
            registry.mime_type_by_extension("file.wrenmail"),
            SETTINGS_MIME_TYPE
        );
        k9::assert_equal!(registry.mime_type_by_extension("file.txt"), "text/plain");
        k9::assert_equal!(registry.mime_type_by_extension("FILE.TXT"), "text/plain");
    }

    #[test]
    fn missing_extension_is_generic() {
        let registry = TypeRegistry::new(NoDatabase);
        assert_eq!(registry.mime_type_by_extension("README"), DEFAULT_MIME_TYPE);
        assert_eq!(
            registry.mime_type_by_extension("no-such-ext.zzyzx"),
            DEFAULT_MIME_TYPE
        );
    }

    #[test]
    fn table_answers_when_the_database_is_empty() {
        let registry = TypeRegistry::new(NoDatabase);
        assert_eq!(registry.mime_type_by_extension("photo.jpeg"), "image/jpeg");
        assert_eq!(
            registry.mime_type_by_extension("archive.tar"),
            "application/x-tar"
        );
    }

    #[test]
    fn database_answers_win_for_ordinary_extensions() {
        struct Opinionated;
        impl MimeDatabase for Opinionated {
            fn lookup(&self, extension: &str) -> Option<String> {
                (extension == "xml").then(|| "text/xml".to_string())
            }
        }
        let registry = TypeRegistry::new(Opinionated);
        assert_eq!(registry.mime_type_by_extension("feed.xml"), "text/xml");
        // but never for the reserved early entries
        assert_eq!(
            registry.mime_type_by_extension("export.wrenmail"),
            SETTINGS_MIME_TYPE
        );
    }

    #[test]
    fn reverse_lookup_is_first_match() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.extension_by_mime_type("text/plain"), Some("txt"));
        assert_eq!(registry.extension_by_mime_type("IMAGE/JPEG"), Some("jpe"));
        assert_eq!(registry.extension_by_mime_type("no/such"), None);
    }

    #[test]
    fn generic_default_is_reachable_by_reverse_lookup() {
        let registry = TypeRegistry::default();
        // the empty-extension entry is the first match for the default
        assert_eq!(
            registry.extension_by_mime_type(DEFAULT_MIME_TYPE),
            Some("")
        );
    }
}
