use std::collections::HashMap;
use std::fs;
use std::path::Path;

use actix_multipart::{Field, Multipart};
use bytes::BytesMut;
use chrono::Utc;
use futures_util::TryStreamExt;
use rand::{thread_rng, Rng};

use crate::error::Error;

const GENERAL_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "xls", "xlsx", "webp", "svg", "ico", "json",
    "txt", "csv", "xml", "mp3", "mp4", "wav", "ogg", "webm", "avi", "mov", "mkv", "mpeg", "mpg",
    "m4a", "aac",
];

const DOCUMENT_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "pdf"];

pub const GENERAL: UploadPolicy = UploadPolicy {
    extensions: GENERAL_EXTENSIONS,
    max_bytes: 15 * 1024 * 1024,
    rejection: "Only images, PDFs, DOC, DOCX, XLS, and XLSX files are allowed!",
};

pub const DOCUMENTS: UploadPolicy = UploadPolicy {
    extensions: DOCUMENT_EXTENSIONS,
    max_bytes: 1024 * 1024,
    rejection: "Only images (JPG, PNG) and PDF files are allowed",
};

const TEXT_VALUE_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub extensions: &'static [&'static str],
    pub max_bytes: usize,
    pub rejection: &'static str,
}

impl UploadPolicy {
    pub fn permits(&self, filename: &str, mime: &str) -> bool {
        let ext = match extension(filename) {
            Some(ext) => ext,
            None => return false,
        };
        self.extensions.iter().any(|t| *t == ext) && self.extensions.iter().any(|t| mime.contains(t))
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub max_count: usize,
    pub subdir: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum FileNaming {
    Compact,
    Timestamped,
}

impl FileNaming {
    fn render(&self, field: &str, original: &str) -> String {
        let ext = extension(original).map(|e| format!(".{}", e)).unwrap_or_default();
        // field names come straight off the wire and end up on the
        // filesystem, keep them to alphanumerics
        let field: String = field.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let mut rng = thread_rng();
        match self {
            FileNaming::Compact => {
                let millis = Utc::now().timestamp_millis().to_string();
                let stamp = &millis[millis.len().saturating_sub(6)..];
                format!("{}-{}{}{}", field, stamp, rng.gen_range(0..1000), ext)
            }
            FileNaming::Timestamped => format!(
                "{}-{}-{}{}",
                field,
                Utc::now().timestamp_millis(),
                rng.gen_range(0..1_000_000_000u32),
                ext
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadSpec {
    pub category: &'static str,
    pub policy: UploadPolicy,
    pub fields: &'static [FieldRule],
    // accept file fields that have no rule instead of rejecting them
    pub open: bool,
    pub default_subdir: &'static str,
    pub naming: FileNaming,
}

impl UploadSpec {
    fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == field)
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

#[derive(Debug, Default)]
pub struct SubmittedForm {
    texts: HashMap<String, String>,
    files: HashMap<String, Vec<StoredFile>>,
}

impl SubmittedForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    // empty values count as absent
    pub fn value(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|value| !value.is_empty())
    }

    pub fn first_file(&self, name: &str) -> Option<&StoredFile> {
        self.files.get(name).and_then(|files| files.first())
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.texts.insert(name.into(), value.into());
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: StoredFile) {
        self.files.entry(name.into()).or_default().push(file);
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: String,
}

impl UploadStore {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_owned(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    // accepted files are already on disk by the time the caller sees the form
    pub async fn receive(&self, spec: &UploadSpec, payload: &mut Multipart) -> Result<SubmittedForm, Error> {
        let mut form = SubmittedForm::default();
        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().to_owned();
            let filename = field.content_disposition().get_filename().map(str::to_owned);
            match filename {
                Some(original) => {
                    let rule = spec.rule(&name);
                    // open specs admit unknown fields and repeats, the first
                    // file wins downstream
                    if !spec.open {
                        let rule = rule.ok_or_else(|| Error::UploadError("Unexpected field".into()))?;
                        let stored = form.files.get(&name).map_or(0, Vec::len);
                        if stored >= rule.max_count {
                            return Err(Error::UploadError(format!("Too many files for field {}", name)));
                        }
                    }
                    let mime = field.content_type().map(|m| m.to_string()).unwrap_or_default();
                    if !spec.policy.permits(&original, &mime) {
                        return Err(Error::UploadError(spec.policy.rejection.into()));
                    }
                    let content = read_capped(&mut field, spec.policy.max_bytes, "File too large").await?;
                    let subdir = rule.map_or(spec.default_subdir, |r| r.subdir);
                    let file = self.save(spec, &name, subdir, &original, &mime, &content)?;
                    form.push_file(name, file);
                }
                None => {
                    let content = read_capped(&mut field, TEXT_VALUE_LIMIT, "Field value too long").await?;
                    form.push_text(name, String::from_utf8_lossy(&content).into_owned());
                }
            }
        }
        Ok(form)
    }

    fn save(
        &self,
        spec: &UploadSpec,
        field: &str,
        subdir: &str,
        original: &str,
        mime: &str,
        content: &[u8],
    ) -> Result<StoredFile, Error> {
        let mut dir = format!("{}/{}", self.root, spec.category);
        if !subdir.is_empty() {
            dir = format!("{}/{}", dir, subdir);
        }
        fs::create_dir_all(&dir)?;
        let stored_path = format!("{}/{}", dir, spec.naming.render(field, original));
        fs::write(&stored_path, content)?;
        Ok(StoredFile {
            original_name: original.to_owned(),
            stored_path,
            mime_type: mime.to_owned(),
            size_bytes: content.len(),
        })
    }
}

async fn read_capped(field: &mut Field, limit: usize, message: &str) -> Result<BytesMut, Error> {
    let mut content = BytesMut::new();
    while let Some(chunk) = field.try_next().await? {
        if content.len() + chunk.len() > limit {
            return Err(Error::UploadError(message.into()));
        }
        content.extend_from_slice(&chunk);
    }
    Ok(content)
}
