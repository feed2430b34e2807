//! XBRL filing parser
//!
//! This crate turns XBRL and Inline-XBRL filings into the object graph
//! defined by `xbrl-graph-core`. It resolves the full taxonomy closure of a
//! filing (schemas, linkbases, cross-file concept references) through a
//! shared `xbrl-graph-cache`, then parses the instance document itself.
//!
//! # Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use xbrl_graph_cache::HttpCache;
//! use xbrl_graph_parser::XbrlParser;
//!
//! # async fn example() -> xbrl_graph_core::Result<()> {
//! let mut cache = HttpCache::new("./cache");
//! cache.set_headers(std::collections::HashMap::from([(
//!     "User-Agent".to_string(),
//!     "Example Co admin@example.com".to_string(),
//! )]));
//! let parser = XbrlParser::new(Arc::new(cache));
//!
//! let instance = parser
//!     .parse_instance("https://www.sec.gov/Archives/edgar/data/320193/aapl-20200926.htm")
//!     .await?;
//! println!("parsed {} facts", instance.facts.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio_util::sync::CancellationToken;

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::{DocumentKind, Instance, Linkbase, LinkbaseType, Result, Taxonomy};

pub mod inline;
pub mod instance;
pub mod linkbase;
pub mod resolver;
pub mod schema;
pub mod transforms;
pub mod xml;

pub use resolver::TaxonomyResolver;
pub use xml::{FetchXml, XmlDocument};

/// Parser knobs; `Default` matches regulator-filing expectations.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Degrade iXBRL value-construction errors to per-fact warnings.
    pub lenient: bool,
    /// Language for the final label-lookup fallback.
    pub reporting_lang: String,
    /// Checked between parsing batches and before network requests.
    pub cancellation: CancellationToken,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lenient: false,
            reporting_lang: "en-US".to_string(),
            cancellation: CancellationToken::new(),
        }
    }
}

/// Entry point for parsing filings against a shared cache.
pub struct XbrlParser {
    cache: Arc<HttpCache>,
    config: ParserConfig,
}

impl XbrlParser {
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self::with_config(cache, ParserConfig::default())
    }

    pub fn with_config(cache: Arc<HttpCache>, config: ParserConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &HttpCache {
        &self.cache
    }

    /// Parse an instance document from a URL or local path, autodetecting
    /// classic XBRL vs Inline XBRL from the leading bytes.
    pub async fn parse_instance(&self, location: &str) -> Result<Instance> {
        let (text, url) = self.read_document(location).await?;
        match detect_document_kind(text.as_bytes()) {
            DocumentKind::Xbrl => {
                let document = XmlDocument::parse(&text, &url)?;
                instance::parse_xbrl_instance(&document, &self.cache, &self.config).await
            }
            DocumentKind::InlineXbrl => {
                let decoded = inline::decode_html_entities(&text);
                let document = XmlDocument::parse(&decoded, &url)?;
                inline::parse_inline_instance(&document, &self.cache, &self.config).await
            }
        }
    }

    /// Parse an instance from a local file; relative schema references
    /// resolve against the file's directory, so a pre-warmed cache (or a
    /// fully local filing directory) needs no network at all.
    pub async fn parse_instance_locally(&self, path: &str) -> Result<Instance> {
        self.parse_instance(path).await
    }

    /// Resolve a taxonomy from its entry-point schema URL.
    pub async fn parse_taxonomy(&self, url: &str) -> Result<Taxonomy> {
        let entry_points = vec![url.to_string()];
        TaxonomyResolver::new(&self.cache, &self.config)
            .resolve(&entry_points)
            .await
    }

    /// Parse a single linkbase file with a caller-supplied type hint.
    pub async fn parse_linkbase(
        &self,
        url: &str,
        linkbase_type: LinkbaseType,
    ) -> Result<Linkbase> {
        let (text, resolved) = self.read_document(url).await?;
        let document = XmlDocument::parse(&text, &resolved)?;
        linkbase::parse_linkbase(&document, linkbase_type)
    }

    async fn read_document(&self, location: &str) -> Result<(String, String)> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let (bytes, _path) = self.cache.get(location).await?;
            Ok((
                String::from_utf8_lossy(&bytes).into_owned(),
                location.to_string(),
            ))
        } else {
            let text = tokio::fs::read_to_string(location).await?;
            Ok((text, location.to_string()))
        }
    }
}

/// Sniff the document flavor from its first markup: an `html` root (or an
/// HTML doctype) means Inline XBRL, anything else is a classic instance.
pub fn detect_document_kind(bytes: &[u8]) -> DocumentKind {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref event)) | Ok(Event::Empty(ref event)) => {
                let name = event.name();
                return if name.local_name().as_ref().eq_ignore_ascii_case(b"html") {
                    DocumentKind::InlineXbrl
                } else {
                    DocumentKind::Xbrl
                };
            }
            Ok(Event::DocType(ref doctype)) => {
                if doctype
                    .as_ref()
                    .to_ascii_lowercase()
                    .starts_with(b"html")
                {
                    return DocumentKind::InlineXbrl;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
        buf.clear();
    }

    // Malformed head: fall back to a substring sniff.
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(2048)]).to_lowercase();
    if head.contains("<html") || head.contains("xmlns:ix") {
        DocumentKind::InlineXbrl
    } else {
        DocumentKind::Xbrl
    }
}
