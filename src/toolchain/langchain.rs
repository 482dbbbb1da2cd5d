use super::{CommitDocument, ToolChain, ToolChainKind, truncate_chars};
use crate::git::CommitRecord;
use serde_json::json;

/// Flat "author date hash subject body" documents.
///
/// The text is embedded as stored. A failed embedding is retried once with
/// the text cut to `max_text_length` characters.
pub struct LangChain {
    table_name: String,
    max_text_length: usize,
}

impl LangChain {
    pub fn new(table_name: impl Into<String>, max_text_length: usize) -> Self {
        Self {
            table_name: table_name.into(),
            max_text_length,
        }
    }
}

impl ToolChain for LangChain {
    fn kind(&self) -> ToolChainKind {
        ToolChainKind::LangChain
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn compose(&self, commit: &CommitRecord) -> CommitDocument {
        let text = format!(
            "{} {} {} {} {}",
            commit.author, commit.date, commit.hash, commit.subject, commit.body
        );

        CommitDocument {
            embedding_input: text.clone(),
            text,
            metadata: json!({
                "author": commit.author,
                "date": commit.date,
                "commit": commit.hash,
            }),
        }
    }

    fn max_attempts(&self) -> usize {
        2
    }

    fn shrink_after_failure(&self, doc: &mut CommitDocument) {
        if doc.text.chars().count() > self.max_text_length {
            truncate_chars(&mut doc.text, self.max_text_length);
            doc.embedding_input = doc.text.clone();
        }
    }
}
