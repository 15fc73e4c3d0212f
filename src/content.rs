//! Loading the content of an asset and working out its media type
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use log::{debug, warn};
use reqwest::{Client, Url};

use crate::error::{LinkedInError, Result};

/// Where the bytes of an asset come from
#[derive(Clone, Debug)]
pub enum ContentSource {
    /// A remote file that is downloaded before it is uploaded
    Url(String),
    /// A local file
    Path(PathBuf),
    /// Content that is already in memory
    Bytes {
        data: Bytes,
        filename: Option<String>,
    },
}

/// Strings that look like http(s) URLs are remote sources, anything else is a local path
impl From<&str> for ContentSource {
    fn from(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ContentSource::Url(value.to_string())
        } else {
            ContentSource::Path(PathBuf::from(value))
        }
    }
}

impl From<String> for ContentSource {
    fn from(value: String) -> Self {
        ContentSource::from(value.as_str())
    }
}

impl From<PathBuf> for ContentSource {
    fn from(value: PathBuf) -> Self {
        ContentSource::Path(value)
    }
}

/// Content that has been read completely and is ready to be sent
#[derive(Clone, Debug)]
pub struct LoadedContent {
    pub data: Bytes,
    pub filename: Option<String>,
    pub content_type: String,
}

impl LoadedContent {
    /// Wraps bytes, resolving the content type from `filename` or the bytes themselves
    pub fn new(data: Bytes, filename: Option<String>) -> Self {
        let content_type = resolve_content_type(filename.as_deref(), &data);
        Self {
            data,
            filename,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ContentSource {
    /// The file name implied by the source, if there is one
    pub fn filename(&self) -> Option<String> {
        match self {
            ContentSource::Url(url) => Url::parse(url).ok().and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
                    .filter(|name| !name.is_empty())
            }),
            ContentSource::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ContentSource::Bytes { filename, .. } => filename.clone(),
        }
    }

    /// Reads the whole source into memory.
    ///
    /// The upload endpoint insists on an exact content length so the content is
    /// never streamed with an unknown size.  `disposition_filename` replaces the
    /// name derived from the source when resolving the content type.
    pub(crate) async fn load(
        &self,
        http_client: &Client,
        timeout: Duration,
        disposition_filename: Option<&str>,
    ) -> Result<LoadedContent> {
        let data = match self {
            ContentSource::Url(url) => fetch_remote(http_client, url, timeout).await?,
            ContentSource::Path(path) => read_local(path).await?,
            ContentSource::Bytes { data, .. } => data.clone(),
        };

        if data.is_empty() {
            return Err(LinkedInError::InvalidInput("content is empty".to_string()));
        }

        let filename = disposition_filename
            .map(str::to_string)
            .or_else(|| self.filename());
        let content = LoadedContent::new(data, filename);
        debug!(
            "loaded {} bytes of {} ({:?})",
            content.len(),
            content.content_type,
            content.filename
        );
        Ok(content)
    }
}

async fn fetch_remote(http_client: &Client, url: &str, timeout: Duration) -> Result<Bytes> {
    let unavailable = |err: reqwest::Error| {
        if err.is_timeout() {
            LinkedInError::UploadTimeout { last_status: None }
        } else {
            LinkedInError::SourceUnavailable(format!("{url}: {err}"))
        }
    };
    let response = http_client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(unavailable)?;

    if !response.status().is_success() {
        return Err(LinkedInError::SourceUnavailable(format!(
            "{url}: HTTP {}",
            response.status().as_u16()
        )));
    }

    response.bytes().await.map_err(unavailable)
}

async fn read_local(path: &Path) -> Result<Bytes> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|err| LinkedInError::SourceUnavailable(format!("{}: {err}", path.display())))
}

/// Resolves a MIME type from the file extension, sniffing the bytes when the
/// extension is missing or unknown.  Always returns a usable type.
pub fn resolve_content_type(filename: Option<&str>, data: &[u8]) -> String {
    if let Some(guess) = filename.and_then(|name| mime_guess::from_path(name).first()) {
        return guess.essence_str().to_string();
    }
    let sniffed = sniff_content_type(data);
    warn!(
        "no media type known for {:?}, sniffed {} from the content",
        filename, sniffed
    );
    sniffed.to_string()
}

/// Signature prefixes, checked in order
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"II*\x00", "image/tiff"),
    (b"MM\x00*", "image/tiff"),
    (b"%PDF-", "application/pdf"),
    (b"\x1a\x45\xdf\xa3", "video/webm"),
    (b"BM", "image/bmp"),
];

/// Guesses a MIME type by looking at the leading bytes of the content
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return *mime;
    }

    // RIFF containers carry their kind at offset 8
    if data.len() >= 12 && &data[..4] == b"RIFF" {
        match &data[8..12] {
            b"WEBP" => return "image/webp",
            b"AVI " => return "video/x-msvideo",
            _ => {}
        }
    }

    // ISO base media files start with a box size followed by `ftyp`
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"qt  " => "video/quicktime",
            b"heic" | b"heix" => "image/heic",
            _ => "video/mp4",
        };
    }

    if std::str::from_utf8(data).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}
