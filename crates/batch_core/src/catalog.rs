//! Static catalog of conversion categories and their target operations.

/// Output format that denotes text extraction rather than a downloadable artifact.
pub const TEXT_EXTRACTION_FORMAT: &str = "txt";

/// One selectable entry of a fixed-list category, e.g. `{ value: "png", label: "PNG" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub value: String,
    pub label: String,
}

/// A named operation bound to exactly one output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubOperation {
    pub id: String,
    pub label: String,
    pub target_format: String,
}

/// The two shapes a category's operation list can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSet {
    Formats(Vec<FormatOption>),
    SubOperations(Vec<SubOperation>),
}

/// Normalized operation: what the user picked and the format it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOperation {
    pub id: String,
    pub label: String,
    pub output_format: String,
}

impl TargetOperation {
    pub fn is_text_extraction(&self) -> bool {
        self.output_format == TEXT_EXTRACTION_FORMAT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub accept: AcceptFilter,
    pub operations: OperationSet,
}

impl Category {
    pub fn target_operations(&self) -> Vec<TargetOperation> {
        match &self.operations {
            OperationSet::Formats(formats) => formats
                .iter()
                .map(|option| TargetOperation {
                    id: option.value.clone(),
                    label: option.label.clone(),
                    output_format: option.value.clone(),
                })
                .collect(),
            OperationSet::SubOperations(ops) => ops
                .iter()
                .map(|op| TargetOperation {
                    id: op.id.clone(),
                    label: op.label.clone(),
                    output_format: op.target_format.clone(),
                })
                .collect(),
        }
    }

    /// Resolve an operation id (sub-operation categories) or a literal format
    /// (fixed-list categories) into a target operation.
    pub fn resolve(&self, choice: &str) -> Option<TargetOperation> {
        let choice = choice.trim();
        if choice.is_empty() {
            return None;
        }
        let operations = self.target_operations();
        match &self.operations {
            OperationSet::Formats(_) => operations
                .into_iter()
                .find(|op| op.output_format.eq_ignore_ascii_case(choice)),
            OperationSet::SubOperations(_) => {
                let by_id = operations.iter().position(|op| op.id == choice);
                let index = by_id.or_else(|| {
                    operations
                        .iter()
                        .position(|op| op.output_format.eq_ignore_ascii_case(choice))
                })?;
                operations.into_iter().nth(index)
            }
        }
    }
}

/// Ordered, immutable lookup table of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The catalog shipped with the client.
    pub fn builtin() -> Self {
        Self::new(vec![
            Category {
                id: "image".into(),
                label: "Image Converter".into(),
                accept: AcceptFilter::parse("image/*"),
                operations: OperationSet::Formats(formats(&[
                    ("png", "PNG"),
                    ("jpg", "JPG"),
                    ("pdf", "PDF (From Image)"),
                    ("gif", "GIF"),
                    ("webp", "WebP"),
                ])),
            },
            Category {
                id: "video".into(),
                label: "Video/Audio Converter".into(),
                accept: AcceptFilter::parse("video/*,audio/*"),
                operations: OperationSet::Formats(formats(&[
                    ("mp4", "MP4"),
                    ("mp3", "MP3 (Convert to Audio)"),
                ])),
            },
            Category {
                id: "ocr".into(),
                label: "Extract Text (OCR)".into(),
                accept: AcceptFilter::parse("image/*,.pdf"),
                operations: OperationSet::Formats(formats(&[(
                    TEXT_EXTRACTION_FORMAT,
                    "Text (OCR)",
                )])),
            },
            Category {
                id: "pdf".into(),
                label: "PDF Tools".into(),
                accept: AcceptFilter::parse(".pdf"),
                operations: OperationSet::SubOperations(vec![SubOperation {
                    id: "pdf-to-docx".into(),
                    label: "Convert PDF to Word (DOCX)".into(),
                    target_format: "docx".into(),
                }]),
            },
        ])
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn first(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn accepted_input_kind(&self, id: &str) -> Option<&AcceptFilter> {
        self.category(id).map(|category| &category.accept)
    }

    pub fn target_operations(&self, id: &str) -> Vec<TargetOperation> {
        self.category(id)
            .map(Category::target_operations)
            .unwrap_or_default()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn formats(entries: &[(&str, &str)]) -> Vec<FormatOption> {
    entries
        .iter()
        .map(|(value, label)| FormatOption {
            value: (*value).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptRule {
    /// `image/*`, stored as `image/`.
    MimePrefix(String),
    MimeExact(String),
    /// `.pdf`, stored lowercase without the dot.
    Extension(String),
}

/// Browser-style accept descriptor such as `image/*,.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    descriptor: String,
    rules: Vec<AcceptRule>,
}

impl AcceptFilter {
    pub fn parse(descriptor: &str) -> Self {
        let rules = descriptor
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                if let Some(ext) = entry.strip_prefix('.') {
                    Some(AcceptRule::Extension(ext.to_ascii_lowercase()))
                } else if let Some(kind) = entry.strip_suffix("/*") {
                    Some(AcceptRule::MimePrefix(format!(
                        "{}/",
                        kind.to_ascii_lowercase()
                    )))
                } else if entry.contains('/') {
                    Some(AcceptRule::MimeExact(entry.to_ascii_lowercase()))
                } else {
                    None
                }
            })
            .collect();
        Self {
            descriptor: descriptor.to_string(),
            rules,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// True when the file name or content kind matches any rule.
    /// An empty filter accepts everything, like `*/*`.
    pub fn accepts(&self, name: &str, content_kind: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let kind = content_kind
            .split(';')
            .next()
            .unwrap_or(content_kind)
            .trim()
            .to_ascii_lowercase();
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        self.rules.iter().any(|rule| match rule {
            AcceptRule::MimePrefix(prefix) => kind.starts_with(prefix.as_str()),
            AcceptRule::MimeExact(exact) => kind == *exact,
            AcceptRule::Extension(ext) => extension.as_deref() == Some(ext.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_keeps_category_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<_> = catalog.categories().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["image", "video", "ocr", "pdf"]);
        assert_eq!(catalog.first().map(|c| c.id.as_str()), Some("image"));
    }

    #[test]
    fn fixed_list_resolves_literal_format() {
        let catalog = Catalog::builtin();
        let image = catalog.category("image").unwrap();
        let op = image.resolve("webp").unwrap();
        assert_eq!(op.output_format, "webp");
        assert_eq!(op.label, "WebP");
        assert!(image.resolve("docx").is_none());
        assert!(image.resolve("").is_none());
    }

    #[test]
    fn sub_operations_resolve_by_id_or_bound_format() {
        let catalog = Catalog::builtin();
        let pdf = catalog.category("pdf").unwrap();
        let by_id = pdf.resolve("pdf-to-docx").unwrap();
        assert_eq!(by_id.output_format, "docx");
        assert_eq!(by_id.label, "Convert PDF to Word (DOCX)");
        assert_eq!(pdf.resolve("docx"), Some(by_id));
        assert!(pdf.resolve("pdf-merge").is_none());
    }

    #[test]
    fn ocr_target_is_text_extraction() {
        let catalog = Catalog::builtin();
        let ops = catalog.target_operations("ocr");
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_text_extraction());
        assert!(catalog.target_operations("unknown").is_empty());
    }

    #[test]
    fn accept_filter_matches_mime_wildcards_and_extensions() {
        let filter = AcceptFilter::parse("image/*,.pdf");
        assert!(filter.accepts("scan.png", "image/png"));
        assert!(filter.accepts("doc.PDF", "application/octet-stream"));
        assert!(!filter.accepts("song.mp3", "audio/mpeg"));
        assert_eq!(filter.descriptor(), "image/*,.pdf");

        let av = Catalog::builtin();
        let av = av.accepted_input_kind("video").unwrap();
        assert!(av.accepts("clip.mov", "video/quicktime"));
        assert!(av.accepts("voice.wav", "audio/wav; codecs=1"));
        assert!(!av.accepts("photo.jpg", "image/jpeg"));
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = AcceptFilter::parse("");
        assert!(filter.accepts("anything.bin", ""));
    }
}
