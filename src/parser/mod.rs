use crate::config::extension;
use crate::core::SourceKind;
use crate::error::{BridgeError, BridgeResult};
use crate::types::{SheetDocument, TokenDocument, TreeDocument};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Serialization of an input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension (`.yaml`, `.yml`, `.json`)
    pub fn from_path(path: &Path) -> BridgeResult<Self> {
        match extension(path).as_deref() {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => Err(BridgeError::UnsupportedFormat(format!(
                "'{}': expected a .yaml, .yml or .json file",
                path.display()
            ))),
        }
    }
}

/// A parsed input document of any supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDocument {
    Tokens(TokenDocument),
    Tree(TreeDocument),
    Sheet(SheetDocument),
}

impl SourceDocument {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDocument::Tokens(_) => SourceKind::Tokens,
            SourceDocument::Tree(_) => SourceKind::Tree,
            SourceDocument::Sheet(_) => SourceKind::Sheet,
        }
    }
}

/// Read and deserialize the document at `path` as `kind`.
///
/// # Example
/// ```no_run
/// use calcbridge::core::SourceKind;
/// use calcbridge::parser::parse_document;
/// use std::path::Path;
///
/// let document = parse_document(Path::new("regions.yaml"), SourceKind::Tokens)?;
/// assert_eq!(document.kind(), SourceKind::Tokens);
/// # Ok::<(), calcbridge::error::BridgeError>(())
/// ```
pub fn parse_document(path: &Path, kind: SourceKind) -> BridgeResult<SourceDocument> {
    let format = DocumentFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, format, kind)
        .map_err(|e| BridgeError::Parse(format!("{}: {}", path.display(), e)))
}

/// Deserialize `content` as a document of `kind`
pub fn parse_str(content: &str, format: DocumentFormat, kind: SourceKind) -> BridgeResult<SourceDocument> {
    if content.trim().is_empty() {
        return Err(BridgeError::Parse("document is empty".to_string()));
    }
    let document = match kind {
        SourceKind::Tokens => SourceDocument::Tokens(deserialize(content, format)?),
        SourceKind::Tree => SourceDocument::Tree(deserialize(content, format)?),
        SourceKind::Sheet => SourceDocument::Sheet(deserialize(content, format)?),
    };
    Ok(document)
}

fn deserialize<T: DeserializeOwned>(content: &str, format: DocumentFormat) -> BridgeResult<T> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        DocumentFormat::Json => serde_json::from_str(content)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenKind;
    use std::io::Write;

    #[test]
    fn test_parse_token_yaml() {
        let yaml = r#"
regions:
  - tokens:
      - { kind: operand, text: a }
      - { kind: operand, text: b }
      - { kind: operator, text: "+", arity: 2 }
"#;
        let doc = parse_str(yaml, DocumentFormat::Yaml, SourceKind::Tokens).unwrap();
        let SourceDocument::Tokens(tokens) = doc else {
            panic!("expected a token document");
        };
        assert_eq!(tokens.regions.len(), 1);
        assert_eq!(tokens.regions[0].tokens[2].kind, TokenKind::Operator);
        assert_eq!(tokens.regions[0].tokens[0].arity, 0);
    }

    #[test]
    fn test_parse_tree_json() {
        let json = r#"{"regions": [{"kind": "define", "children": [
            {"kind": "id", "text": "x"}, {"kind": "real", "text": "2"}]}]}"#;
        let doc = parse_str(json, DocumentFormat::Json, SourceKind::Tree).unwrap();
        let SourceDocument::Tree(tree) = doc else {
            panic!("expected a tree document");
        };
        assert_eq!(tree.regions[0].children.len(), 2);
        assert!(tree.regions[0].attributes.is_empty());
    }

    #[test]
    fn test_parse_sheet_yaml() {
        let yaml = r#"
sheets:
  - name: Beam
    cells:
      - { address: A1, value: Span }
      - { address: B1, value: "6" }
      - { address: B2, formula: "B1*2" }
"#;
        let doc = parse_str(yaml, DocumentFormat::Yaml, SourceKind::Sheet).unwrap();
        assert_eq!(doc.kind(), SourceKind::Sheet);
    }

    #[test]
    fn test_unknown_token_kind_rejected() {
        let yaml = "regions:\n  - tokens:\n      - { kind: widget, text: a }\n";
        let err = parse_str(yaml, DocumentFormat::Yaml, SourceKind::Tokens).unwrap_err();
        assert!(matches!(err, BridgeError::Yaml(_)));
    }

    #[test]
    fn test_empty_document() {
        let err = parse_str("  \n", DocumentFormat::Json, SourceKind::Tree).unwrap_err();
        assert!(matches!(err, BridgeError::Parse(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert!(matches!(
            DocumentFormat::from_path(Path::new("a.xlsx")),
            Err(BridgeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_document_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"regions": []}}"#).unwrap();
        let doc = parse_document(file.path(), SourceKind::Tokens).unwrap();
        assert_eq!(doc, SourceDocument::Tokens(TokenDocument::default()));
    }

    #[test]
    fn test_parse_document_reports_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "regions: 12").unwrap();
        let err = parse_document(file.path(), SourceKind::Tree).unwrap_err();
        assert!(matches!(err, BridgeError::Parse(ref msg) if msg.contains(".yaml")));
    }
}
